//! Client configuration from environment variables.

use std::time::Duration;

use gestio_shared::NOTIFICATIONS_PATH;

const DEFAULT_API_BASE: &str = "http://localhost:3001";
const DEFAULT_FETCH_LIMIT: u32 = 50;
const DEFAULT_REFETCH_DELAY_MS: u64 = 2000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 60_000;

/// Runtime configuration for the notification client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend.
    pub api_base: String,
    /// Maximum number of notifications per authoritative fetch.
    pub fetch_limit: u32,
    /// Delay between a push event and its authoritative re-fetch.
    pub refetch_delay: Duration,
    /// Re-fetch cadence when no socket could be established.
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            fetch_limit: DEFAULT_FETCH_LIMIT,
            refetch_delay: Duration::from_millis(DEFAULT_REFETCH_DELAY_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl ClientConfig {
    /// Parse configuration from environment variables.
    ///
    /// Environment variables:
    /// - `GESTIO_API_BASE`: backend base URL (default "http://localhost:3001")
    /// - `GESTIO_FETCH_LIMIT`: notifications per fetch (default 50)
    /// - `GESTIO_REFETCH_DELAY_MS`: post-event re-fetch delay (default 2000)
    /// - `GESTIO_POLL_INTERVAL_MS`: socketless refresh cadence (default 60000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: std::env::var("GESTIO_API_BASE").unwrap_or(defaults.api_base),
            fetch_limit: env_number("GESTIO_FETCH_LIMIT").unwrap_or(defaults.fetch_limit),
            refetch_delay: env_number("GESTIO_REFETCH_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.refetch_delay),
            poll_interval: env_number("GESTIO_POLL_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
        }
    }

    /// Realtime endpoint URL with the token carried as a handshake query
    /// parameter.
    pub fn socket_url(&self, token: &str) -> String {
        let base = http_to_ws(self.api_base.trim_end_matches('/'));
        format!(
            "{}{}?token={}",
            base,
            NOTIFICATIONS_PATH,
            urlencoding::encode(token)
        )
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Convert an HTTP/HTTPS base URL to WS/WSS.
fn http_to_ws(url: &str) -> String {
    if url.starts_with("https://") {
        url.replacen("https://", "wss://", 1)
    } else if url.starts_with("http://") {
        url.replacen("http://", "ws://", 1)
    } else {
        format!("ws://{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ClientConfig::default();
        assert_eq!(config.fetch_limit, 50);
        assert_eq!(config.refetch_delay, Duration::from_secs(2));
    }

    #[test]
    fn socket_url_switches_scheme() {
        let mut config = ClientConfig::default();
        config.api_base = "http://localhost:3001/".to_string();
        assert_eq!(
            config.socket_url("tok"),
            "ws://localhost:3001/notifications?token=tok"
        );

        config.api_base = "https://api.gestio.example".to_string();
        assert_eq!(
            config.socket_url("tok"),
            "wss://api.gestio.example/notifications?token=tok"
        );
    }

    #[test]
    fn socket_url_encodes_the_token() {
        let config = ClientConfig::default();
        let url = config.socket_url("a b+c");
        assert!(url.ends_with("?token=a%20b%2Bc"));
    }
}
