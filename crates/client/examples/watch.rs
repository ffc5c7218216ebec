//! Watch live notifications from a running gestio backend.
//!
//! ```sh
//! GESTIO_API_BASE=http://localhost:3001 cargo run -p gestio-client --example watch
//! ```

use std::sync::Arc;

use anyhow::Result;
use futures_util::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gestio_client::shared::{CurrentUser, UserRole};
use gestio_client::{
    ApiClient, AuthContext, ClientConfig, NotificationStore, NotificationSync, SocketManager,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gestio_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env();
    let api = ApiClient::new(config.api_base.clone());

    let count = api.unread_count().await?;
    println!("server reports {} unread notifications", count.count);

    let auth = AuthContext::new();
    let store = NotificationStore::new();
    let manager = Arc::new(SocketManager::new(config.clone()));
    let sync = NotificationSync::new(config, api, auth.clone(), manager, store.clone());
    let (handle, mut toasts) = sync.spawn();

    auth.login(CurrentUser {
        id: "demo".to_string(),
        name: "demo".to_string(),
        role: UserRole::Admin,
    });

    let mut states = store.subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update();
                println!(
                    "{} notifications, {} unread, connected: {}",
                    state.notifications.len(),
                    state.unread_count,
                    state.is_connected
                );
            }
            toast = toasts.next() => {
                match toast {
                    Some(toast) => println!("toast [{:?}]: {}", toast.kind, toast.message),
                    None => break,
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    println!("shutting down");
    handle.shutdown().await;
    Ok(())
}
