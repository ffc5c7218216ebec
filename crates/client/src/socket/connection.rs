//! WebSocket connection task using tokio-tungstenite.

use futures_util::StreamExt;
use gestio_shared::ServerFrame;
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

use super::{ConnectionState, ReconnectConfig, SocketEvent, SocketHandle};

/// A managed connection to the notification push channel.
///
/// Owns the background task that connects, reads, and reconnects with
/// bounded backoff. Dropping the connection (or calling [`shutdown`])
/// stops the task.
///
/// [`shutdown`]: SocketConnection::shutdown
pub struct SocketConnection {
    id: Uuid,
    events: broadcast::Sender<SocketEvent>,
    state: watch::Receiver<ConnectionState>,
    shutdown: watch::Sender<bool>,
}

impl SocketConnection {
    /// Open a new connection to `url` and start its management loop.
    pub fn new(url: String, reconnect_config: ReconnectConfig) -> Self {
        let (events, _) = broadcast::channel(100);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        start_connection_loop(url, state_tx, events.clone(), shutdown_rx, reconnect_config);

        Self {
            id: Uuid::new_v4(),
            events,
            state: state_rx,
            shutdown: shutdown_tx,
        }
    }

    /// Get a shareable handle to this connection.
    pub fn handle(&self) -> SocketHandle {
        SocketHandle::new(self.id, self.events.clone(), self.state.clone())
    }

    /// Whether the connection task is still worth reusing: it has neither
    /// given up (`Failed`) nor exited.
    pub fn is_live(&self) -> bool {
        self.state.has_changed().is_ok()
            && !matches!(*self.state.borrow(), ConnectionState::Failed { .. })
    }

    /// Ask the connection task to close the socket and stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// Start the connection management loop in a background tokio task.
fn start_connection_loop(
    url: String,
    state: watch::Sender<ConnectionState>,
    events: broadcast::Sender<SocketEvent>,
    mut shutdown: watch::Receiver<bool>,
    reconnect_config: ReconnectConfig,
) {
    tokio::spawn(async move {
        let mut attempt = 0u32;

        loop {
            // Stop when asked to, or when the owning connection is gone.
            if *shutdown.borrow() || shutdown.has_changed().is_err() {
                let _ = state.send(ConnectionState::Disconnected);
                break;
            }

            if attempt == 0 {
                let _ = state.send(ConnectionState::Connecting);
            } else {
                let _ = state.send(ConnectionState::Reconnecting { attempt });
            }

            match connect_async(&url).await {
                Ok((mut stream, _response)) => {
                    let _ = state.send(ConnectionState::Connected);
                    attempt = 0;
                    tracing::info!("notification socket connected");
                    let _ = events.send(SocketEvent::Connected);

                    loop {
                        tokio::select! {
                            msg = stream.next() => match msg {
                                Some(Ok(Message::Text(text))) => {
                                    tracing::debug!("socket received: {text}");
                                    match serde_json::from_str::<ServerFrame>(&text) {
                                        Ok(ServerFrame::Notification(event)) => {
                                            let _ = events.send(SocketEvent::Notification(event));
                                        }
                                        Err(e) => {
                                            tracing::error!("failed to parse push frame: {e}");
                                        }
                                    }
                                }
                                Some(Ok(Message::Close(_))) => {
                                    tracing::info!("notification socket received close frame");
                                    break;
                                }
                                Some(Ok(Message::Ping(data))) => {
                                    // Pong is handled automatically by tungstenite
                                    tracing::debug!("received ping: {data:?}");
                                }
                                Some(Ok(_)) => {
                                    // Ignore binary, pong, etc.
                                }
                                Some(Err(e)) => {
                                    tracing::error!("socket read error: {e}");
                                    break;
                                }
                                None => break,
                            },
                            changed = shutdown.changed() => {
                                if changed.is_err() || *shutdown.borrow() {
                                    let _ = stream.close(None).await;
                                    break;
                                }
                            }
                        }
                    }

                    let _ = state.send(ConnectionState::Disconnected);
                    let _ = events.send(SocketEvent::Disconnected);
                    tracing::info!("notification socket closed");
                }
                Err(e) => {
                    tracing::error!("notification socket error: {e}");

                    if reconnect_config.max_attempts > 0 && attempt >= reconnect_config.max_attempts
                    {
                        let _ = state.send(ConnectionState::Failed {
                            reason: format!(
                                "Max reconnect attempts ({}) exceeded",
                                reconnect_config.max_attempts
                            ),
                        });
                        break;
                    }

                    let delay = reconnect_config.delay_for_attempt(attempt);
                    tracing::info!("reconnecting in {delay}ms (attempt {})", attempt + 1);
                    tokio::select! {
                        _ = tokio::time::sleep(std::time::Duration::from_millis(delay as u64)) => {}
                        _ = shutdown.changed() => {}
                    }
                    attempt += 1;
                }
            }
        }
    });
}
