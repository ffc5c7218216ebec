//! Orchestration of the notification lifecycle.
//!
//! One background task binds the pieces together: it waits for a signed-in
//! user, loads the notification list, opens the shared socket, and feeds
//! push events into the store. On logout the socket is closed and the store
//! cleared; the task then waits for the next session.

use std::sync::Arc;

use futures_channel::mpsc;
use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use gestio_shared::{strip_message_tag, CurrentUser, Notification, NotificationEvent, NotificationType};

use crate::api_client::ApiClient;
use crate::config::ClientConfig;
use crate::session::{AuthContext, TokenProvider};
use crate::socket::{EventSubscription, SocketEvent, SocketManager};
use crate::store::NotificationStore;

/// Transient user-facing message for a freshly pushed notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub kind: NotificationType,
    /// Display text, already tag-stripped.
    pub message: String,
}

/// Why the per-session work stopped.
enum SessionEnd {
    LoggedOut,
    Shutdown,
}

/// Control handle for the spawned sync task.
///
/// Dropping the handle signals the task to stop without waiting for it.
/// Stopping detaches from the socket but does not close it; only logout
/// does that, since other parts of the app may share the connection.
pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Stop the sync task and wait for it to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("notification sync task failed: {}", e);
            }
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

/// The sync engine. Construct once, then [`spawn`](Self::spawn) it.
#[derive(Clone)]
pub struct NotificationSync {
    config: ClientConfig,
    api: ApiClient,
    auth: AuthContext,
    tokens: TokenProvider,
    manager: Arc<SocketManager>,
    store: NotificationStore,
}

impl NotificationSync {
    pub fn new(
        config: ClientConfig,
        api: ApiClient,
        auth: AuthContext,
        manager: Arc<SocketManager>,
        store: NotificationStore,
    ) -> Self {
        let tokens = TokenProvider::new(api.clone());
        Self {
            config,
            api,
            auth,
            tokens,
            manager,
            store,
        }
    }

    /// Start the background task. Returns its control handle and the stream
    /// of toasts for pushed notifications.
    pub fn spawn(self) -> (SyncHandle, mpsc::UnboundedReceiver<Toast>) {
        let (toast_tx, toast_rx) = mpsc::unbounded();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            self.run(toast_tx, shutdown_rx).await;
        });
        let handle = SyncHandle {
            shutdown: shutdown_tx,
            task: Some(task),
        };
        (handle, toast_rx)
    }

    async fn run(self, toasts: mpsc::UnboundedSender<Toast>, mut shutdown: watch::Receiver<bool>) {
        let mut sessions = self.auth.subscribe();
        loop {
            let user = tokio::select! {
                user = wait_for_session(&mut sessions) => match user {
                    Some(user) => user,
                    None => return,
                },
                _ = shutdown_signal(&mut shutdown) => return,
            };
            tracing::info!(user = %user.name, "starting notification sync");

            // The guard is never written to; dropping it at the end of the
            // session tells refetch tasks still sleeping that there is no
            // session left to fetch for.
            let (guard_tx, guard_rx) = watch::channel(false);

            let end = tokio::select! {
                end = self.session_loop(&mut sessions, &toasts, &guard_rx) => end,
                _ = shutdown_signal(&mut shutdown) => SessionEnd::Shutdown,
            };
            drop(guard_tx);

            match end {
                SessionEnd::LoggedOut => {
                    tracing::info!("session ended, tearing down notifications");
                    self.manager.disconnect();
                    self.store.clear();
                }
                SessionEnd::Shutdown => return,
            }
        }
    }

    /// Serve one authenticated session until logout.
    async fn session_loop(
        &self,
        sessions: &mut watch::Receiver<Option<CurrentUser>>,
        toasts: &mpsc::UnboundedSender<Toast>,
        guard: &watch::Receiver<bool>,
    ) -> SessionEnd {
        tokio::select! {
            _ = wait_for_logout(sessions) => SessionEnd::LoggedOut,
            _ = self.serve_session(toasts, guard) => SessionEnd::LoggedOut,
        }
    }

    /// Initial fetch, then live events over the socket. Never returns on
    /// its own; the caller cancels it on logout or shutdown.
    async fn serve_session(
        &self,
        toasts: &mpsc::UnboundedSender<Toast>,
        guard: &watch::Receiver<bool>,
    ) {
        let notifications = self.fetch_notifications().await;
        self.store.set_notifications(notifications);

        let Some(token) = self.tokens.current_token().await else {
            tracing::warn!("no socket token available, falling back to periodic refresh");
            self.polling_loop().await;
            return;
        };

        let handle = self.manager.initialize(&token);
        let mut events = handle.subscribe();
        self.store.set_connected(handle.state().is_connected());

        self.event_loop(&mut events, toasts, guard).await;

        // Reconnect attempts exhausted. The connected indicator goes dark
        // and the session stays open without a socket.
        self.store.set_connected(false);
        std::future::pending::<()>().await;
    }

    /// Applies live socket events and the results of scheduled re-fetches.
    /// All store writes for the session happen here; a list fetched for a
    /// session that already ended dies with the channel instead of landing.
    async fn event_loop(
        &self,
        events: &mut EventSubscription,
        toasts: &mpsc::UnboundedSender<Toast>,
        guard: &watch::Receiver<bool>,
    ) {
        let (refetch_tx, mut refetch_rx) = mpsc::unbounded();
        loop {
            tokio::select! {
                event = events.next_event() => match event {
                    Some(SocketEvent::Connected) => self.store.set_connected(true),
                    Some(SocketEvent::Disconnected) => self.store.set_connected(false),
                    Some(SocketEvent::Notification(event)) => {
                        self.handle_push(event, toasts, guard, &refetch_tx)
                    }
                    None => break,
                },
                Some(notifications) = refetch_rx.next() => {
                    self.store.set_notifications(notifications);
                }
            }
        }
    }

    /// Optimistic insert, toast, then a delayed authoritative re-fetch.
    fn handle_push(
        &self,
        event: NotificationEvent,
        toasts: &mpsc::UnboundedSender<Toast>,
        guard: &watch::Receiver<bool>,
        results: &mpsc::UnboundedSender<Vec<Notification>>,
    ) {
        tracing::debug!(kind = ?event.r#type, "notification push received");
        let toast = Toast {
            kind: event.r#type.clone(),
            message: strip_message_tag(&event.message),
        };
        self.store.add_event(event);
        if toasts.unbounded_send(toast).is_err() {
            tracing::debug!("toast receiver dropped");
        }
        self.schedule_refetch(guard.clone(), results.clone());
    }

    /// One re-fetch task per event. The task only talks to the network; the
    /// fetched list is handed back to the session to apply. Overlapping
    /// fetches are harmless since the last full list wins in the store.
    fn schedule_refetch(
        &self,
        guard: watch::Receiver<bool>,
        results: mpsc::UnboundedSender<Vec<Notification>>,
    ) {
        let sync = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(sync.config.refetch_delay).await;
            // Skip the fetch once the session it was scheduled for is gone.
            if guard.has_changed().is_err() {
                return;
            }
            let notifications = sync.fetch_notifications().await;
            if results.unbounded_send(notifications).is_err() {
                tracing::debug!("session ended before the refetched list arrived");
            }
        });
    }

    /// No-socket fallback: re-fetch the list on a fixed interval.
    async fn polling_loop(&self) {
        let mut ticks = tokio::time::interval_at(
            tokio::time::Instant::now() + self.config.poll_interval,
            self.config.poll_interval,
        );
        loop {
            ticks.tick().await;
            let notifications = self.fetch_notifications().await;
            self.store.set_notifications(notifications);
        }
    }

    /// Authoritative list fetch; failures degrade to an empty list.
    async fn fetch_notifications(&self) -> Vec<Notification> {
        match self.api.user_notifications(self.config.fetch_limit).await {
            Ok(notifications) => notifications,
            Err(e) => {
                tracing::warn!("failed to fetch notifications: {}", e);
                Vec::new()
            }
        }
    }
}

/// Resolve once a user is signed in; `None` when the auth context is gone.
async fn wait_for_session(
    sessions: &mut watch::Receiver<Option<CurrentUser>>,
) -> Option<CurrentUser> {
    match sessions.wait_for(|user| user.is_some()).await {
        Ok(user) => (*user).clone(),
        Err(_) => None,
    }
}

/// Resolve on logout. A dropped auth context counts as logged out.
async fn wait_for_logout(sessions: &mut watch::Receiver<Option<CurrentUser>>) {
    let _ = sessions.wait_for(|user| user.is_none()).await;
}

/// Resolve on shutdown. A dropped handle counts as shutdown.
async fn shutdown_signal(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
