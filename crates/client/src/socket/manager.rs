//! Ownership of the process-wide realtime connection.

use std::sync::{Mutex, MutexGuard};

use super::connection::SocketConnection;
use super::{ReconnectConfig, SocketHandle};
use crate::config::ClientConfig;

/// Owns the single shared connection for an authenticated session.
///
/// `initialize` is idempotent: repeated calls while a connection is live
/// hand back handles to the same one instead of opening duplicates.
/// Constructed once at application scope and shared by `Arc`.
pub struct SocketManager {
    config: ClientConfig,
    reconnect: ReconnectConfig,
    current: Mutex<Option<SocketConnection>>,
}

impl SocketManager {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            reconnect: ReconnectConfig::default(),
            current: Mutex::new(None),
        }
    }

    /// Override the reconnect behavior.
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Connect with `token`, or reuse the live connection.
    pub fn initialize(&self, token: &str) -> SocketHandle {
        let mut current = self.lock();

        if let Some(conn) = current.as_ref() {
            if conn.is_live() {
                tracing::debug!("notification socket already connected, reusing");
                return conn.handle();
            }
        }

        tracing::info!("opening notification socket");
        let conn = SocketConnection::new(self.config.socket_url(token), self.reconnect.clone());
        let handle = conn.handle();
        *current = Some(conn);
        handle
    }

    /// Handle to the live connection, if any.
    pub fn get(&self) -> Option<SocketHandle> {
        let current = self.lock();
        current
            .as_ref()
            .filter(|conn| conn.is_live())
            .map(|conn| conn.handle())
    }

    /// Tear down and clear the shared connection; a no-op when none exists.
    pub fn disconnect(&self) {
        let conn = self.lock().take();
        if let Some(conn) = conn {
            tracing::info!("closing notification socket");
            conn.shutdown();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<SocketConnection>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}
