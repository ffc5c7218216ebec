//! Realtime connection to the notification push channel.
//!
//! One shared WebSocket per authenticated session, owned by
//! [`SocketManager`]. Consumers register [`EventSubscription`]s for
//! [`SocketEvent`]s and observe the [`ConnectionState`]; dropping a
//! subscription detaches it, so a consumer's listeners are released
//! together when it goes away.

mod connection;
mod manager;

pub use manager::SocketManager;

use gestio_shared::NotificationEvent;
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

/// Connection state for the realtime channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Failed { reason: String },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Reconnecting { .. }
        )
    }
}

/// Configuration for auto-reconnect behavior.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of reconnect attempts (0 = infinite).
    pub max_attempts: u32,
    /// Initial delay in milliseconds.
    pub initial_delay_ms: u32,
    /// Maximum delay in milliseconds.
    pub max_delay_ms: u32,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 1.5,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> u32 {
        let delay = self.initial_delay_ms as f32 * self.backoff_multiplier.powi(attempt as i32);
        (delay as u32).min(self.max_delay_ms)
    }
}

/// Events delivered to subscribers of the shared connection.
#[derive(Debug, Clone)]
pub enum SocketEvent {
    /// The transport came up, initially or after a reconnect.
    Connected,
    /// The transport dropped; the connection task may still be retrying.
    Disconnected,
    /// A server push on the notification channel.
    Notification(NotificationEvent),
}

/// A live registration for [`SocketEvent`]s. Dropping it unsubscribes.
pub struct EventSubscription {
    events: broadcast::Receiver<SocketEvent>,
}

impl EventSubscription {
    fn new(events: broadcast::Receiver<SocketEvent>) -> Self {
        Self { events }
    }

    /// Receive the next event; `None` once the connection task is gone.
    pub async fn next_event(&mut self) -> Option<SocketEvent> {
        loop {
            match self.events.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("socket subscriber lagged, skipped {skipped} events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Handle to the shared realtime connection.
#[derive(Clone)]
pub struct SocketHandle {
    id: Uuid,
    events: broadcast::Sender<SocketEvent>,
    state: watch::Receiver<ConnectionState>,
}

impl SocketHandle {
    pub(crate) fn new(
        id: Uuid,
        events: broadcast::Sender<SocketEvent>,
        state: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self { id, events, state }
    }

    /// Identity of the underlying connection; stable across `initialize`
    /// calls that reuse it.
    pub fn connection_id(&self) -> Uuid {
        self.id
    }

    /// Register for events from this connection.
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription::new(self.events.subscribe())
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Observe state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let config = ReconnectConfig::default();
        assert_eq!(config.delay_for_attempt(0), 1000);
        assert_eq!(config.delay_for_attempt(1), 1500);
        assert_eq!(config.delay_for_attempt(2), 2250);
        assert_eq!(config.delay_for_attempt(20), 30000);
    }

    #[test]
    fn state_predicates() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Disconnected.is_connected());
        assert!(ConnectionState::Connecting.is_connecting());
        assert!(ConnectionState::Reconnecting { attempt: 3 }.is_connecting());
        assert!(!ConnectionState::Failed { reason: "x".to_string() }.is_connecting());
    }
}
