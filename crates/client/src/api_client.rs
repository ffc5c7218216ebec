//! HTTP API client for the gestio REST backend.

use gestio_shared::{ApiError, Notification, TokenResponse, UnreadCount};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// HTTP client for credentialed requests against the backend.
///
/// Requests ride the backend session cookie, so the client keeps a cookie
/// store and should be cloned rather than rebuilt per call.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client rooted at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = match Client::builder().cookie_store(true).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("falling back to default HTTP client: {e}");
                Client::new()
            }
        };
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Make a GET request and decode the JSON response.
    pub async fn get_json<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::read_json(resp).await
    }

    /// Make a POST request with a JSON body.
    pub async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::read_json(resp).await
    }

    /// Make a PATCH request with a JSON body.
    pub async fn patch_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let resp = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::read_json(resp).await
    }

    async fn read_json<TRes: DeserializeOwned>(resp: reqwest::Response) -> Result<TRes, ApiError> {
        let status = resp.status().as_u16();
        let is_success = resp.status().is_success();

        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

        if !is_success {
            return Err(ApiError::Http { status, body: text });
        }

        // Endpoints without a response body decode as JSON null.
        if text.is_empty() {
            serde_json::from_str("null").map_err(|e| ApiError::Decode(e.to_string()))
        } else {
            serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
        }
    }

    // --- Notification API methods ---

    /// Fetch the session token relayed from the HTTP-only cookie.
    pub async fn auth_token(&self) -> Result<TokenResponse, ApiError> {
        self.get_json("/auth/token").await
    }

    /// Fetch the authoritative notification list, newest first.
    pub async fn user_notifications(&self, limit: u32) -> Result<Vec<Notification>, ApiError> {
        self.get_json(&format!("/notifications/user?limit={limit}"))
            .await
    }

    /// Persist read state for a single notification.
    pub async fn mark_notification_read(&self, id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .patch_json(&format!("/notifications/{id}/read"), &serde_json::json!({}))
            .await?;
        Ok(())
    }

    /// Persist read state for every notification of the current user.
    pub async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .post_json("/notifications/read-all", &serde_json::json!({}))
            .await?;
        Ok(())
    }

    /// Server-side unread tally; the client normally derives this locally.
    pub async fn unread_count(&self) -> Result<UnreadCount, ApiError> {
        self.get_json("/notifications/unread-count").await
    }
}
