//! Gestio Client - realtime notification core
//!
//! This crate contains the client-side notification engine for gestio,
//! a business administration backend: a persistent socket for push
//! events, an in-memory store with dedup and unread bookkeeping, and a
//! sync task reconciling both against the REST API.

pub mod api_client;
pub mod config;
pub mod session;
pub mod socket;

pub mod dispatch;
pub mod store;
pub mod sync;

pub use gestio_shared as shared;

pub use api_client::ApiClient;
pub use config::ClientConfig;
pub use dispatch::{resolve_destination, NotificationActions};
pub use session::{AuthContext, TokenProvider};
pub use socket::{ConnectionState, ReconnectConfig, SocketEvent, SocketManager};
pub use store::{NotificationState, NotificationStore};
pub use sync::{NotificationSync, SyncHandle, Toast};
