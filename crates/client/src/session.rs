//! Authenticated-session state and the token relay.

use gestio_shared::CurrentUser;
use tokio::sync::watch;

use crate::api_client::ApiClient;

/// Who, if anyone, is signed in.
///
/// Session management itself (cookies, login flows) is the backend's and
/// the embedding shell's business; the sync layer only needs to observe
/// the authenticated user appearing and disappearing.
#[derive(Clone)]
pub struct AuthContext {
    sessions: watch::Sender<Option<CurrentUser>>,
}

impl AuthContext {
    pub fn new() -> Self {
        let (sessions, _) = watch::channel(None);
        Self { sessions }
    }

    /// Mark the session authenticated as `user`.
    pub fn login(&self, user: CurrentUser) {
        self.sessions.send_replace(Some(user));
    }

    /// Clear the session.
    pub fn logout(&self) {
        self.sessions.send_replace(None);
    }

    pub fn current(&self) -> Option<CurrentUser> {
        self.sessions.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.sessions.borrow().is_some()
    }

    /// Observe session changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<CurrentUser>> {
        self.sessions.subscribe()
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Relays the session's bearer token to the socket layer.
///
/// The token lives in an HTTP-only cookie; the backend exposes it through
/// the same-origin `/auth/token` endpoint so the client never reads the
/// cookie itself.
#[derive(Clone)]
pub struct TokenProvider {
    api: ApiClient,
}

impl TokenProvider {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch the current access token, or `None` when the session has none.
    ///
    /// Never fails outward: a 401 means "not signed in", anything else is
    /// logged and degrades the caller to its socketless path.
    pub async fn current_token(&self) -> Option<String> {
        match self.api.auth_token().await {
            Ok(body) if !body.token.is_empty() => Some(body.token),
            Ok(_) => None,
            Err(e) if e.is_unauthorized() => {
                tracing::debug!("no session token available");
                None
            }
            Err(e) => {
                tracing::warn!("failed to fetch session token: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gestio_shared::UserRole;

    fn user(id: &str) -> CurrentUser {
        CurrentUser {
            id: id.to_string(),
            name: "Test".to_string(),
            role: UserRole::Admin,
        }
    }

    #[test]
    fn login_and_logout_flip_the_session() {
        let auth = AuthContext::new();
        assert!(!auth.is_authenticated());

        auth.login(user("u-1"));
        assert!(auth.is_authenticated());
        assert_eq!(auth.current().map(|u| u.id), Some("u-1".to_string()));

        auth.logout();
        assert!(auth.current().is_none());
    }

    #[test]
    fn login_is_stored_even_without_subscribers() {
        let auth = AuthContext::new();
        auth.login(user("u-2"));

        let mut rx = auth.subscribe();
        assert_eq!(rx.borrow_and_update().as_ref().map(|u| u.id.clone()), Some("u-2".to_string()));
    }
}
