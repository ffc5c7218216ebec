//! Client-side notification state.
//!
//! The store is the single source of truth for what the UI shows: the
//! notification list, the derived unread count, and the connection flag.
//! State travels through a [`watch`] channel, so consumers subscribe and
//! observe whole snapshots rather than individual mutations.

use chrono::Utc;
use tokio::sync::watch;
use uuid::Uuid;

use gestio_shared::{
    Notification, NotificationChannel, NotificationEvent, NotificationPayload,
    NotificationStatus, LOCAL_ID_PREFIX,
};

/// Snapshot of everything notification-related the client holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationState {
    /// Newest first. Locally synthesized entries sit at the head until an
    /// authoritative fetch replaces the whole list.
    pub notifications: Vec<Notification>,
    /// Always equals the number of entries whose status is not READ.
    pub unread_count: usize,
    pub is_connected: bool,
}

/// Shared handle over the notification state.
///
/// Mutations are synchronous and infallible; anything that can fail
/// (network calls) lives in the calling layer. Clones share the same
/// underlying state.
#[derive(Clone)]
pub struct NotificationStore {
    state: watch::Sender<NotificationState>,
}

impl NotificationStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(NotificationState::default());
        Self { state }
    }

    /// Watch the state; the receiver sees every effective mutation.
    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.state.subscribe()
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> NotificationState {
        self.state.borrow().clone()
    }

    /// Replace the full list with the result of an authoritative fetch and
    /// recompute the unread count from it.
    pub fn set_notifications(&self, notifications: Vec<Notification>) {
        self.state.send_modify(|state| {
            state.unread_count = notifications.iter().filter(|n| !n.is_read()).count();
            state.notifications = notifications;
        });
    }

    /// Insert a live push event at the head of the list. Returns whether
    /// the event landed.
    ///
    /// Events are deduplicated by exact (title, message) match against the
    /// held list; a duplicate is dropped without waking subscribers. The
    /// entry gets a `local-` id until the next authoritative fetch brings
    /// the server record.
    pub fn add_event(&self, event: NotificationEvent) -> bool {
        self.state.send_if_modified(|state| {
            let duplicate = state
                .notifications
                .iter()
                .any(|held| held.title == event.title && held.message == event.message);
            if duplicate {
                tracing::debug!(title = %event.title, "dropping duplicate notification event");
                return false;
            }

            let now = Utc::now();
            state.notifications.insert(
                0,
                Notification {
                    id: format!("{}{}", LOCAL_ID_PREFIX, Uuid::new_v4()),
                    payload: NotificationPayload::parse(&event.payload),
                    r#type: event.r#type,
                    title: event.title,
                    message: event.message,
                    channels: vec![NotificationChannel::System],
                    status: NotificationStatus::Sent,
                    created_at: now,
                    sent_at: Some(now),
                },
            );
            state.unread_count += 1;
            true
        })
    }

    /// Mark one notification read. Unknown ids and already-read entries are
    /// no-ops; the count never goes negative.
    pub fn mark_read(&self, id: &str) {
        self.state.send_if_modified(|state| {
            let Some(found) = state.notifications.iter_mut().find(|n| n.id == id) else {
                return false;
            };
            if found.is_read() {
                return false;
            }
            found.status = NotificationStatus::Read;
            state.unread_count = state.unread_count.saturating_sub(1);
            true
        });
    }

    /// Mark every notification read and zero the count.
    pub fn mark_all_read(&self) {
        self.state.send_if_modified(|state| {
            let mut changed = state.unread_count != 0;
            for n in &mut state.notifications {
                if !n.is_read() {
                    n.status = NotificationStatus::Read;
                    changed = true;
                }
            }
            state.unread_count = 0;
            changed
        });
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.send_if_modified(|state| {
            if state.is_connected == connected {
                return false;
            }
            state.is_connected = connected;
            true
        });
    }

    /// Drop everything, including the connection flag. Used on logout.
    pub fn clear(&self) {
        self.state.send_if_modified(|state| {
            let changed = !state.notifications.is_empty()
                || state.unread_count != 0
                || state.is_connected;
            *state = NotificationState::default();
            changed
        });
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gestio_shared::NotificationType;

    fn sample(id: &str, title: &str, message: &str, status: NotificationStatus) -> Notification {
        Notification {
            id: id.to_string(),
            r#type: NotificationType::PaymentPending,
            title: title.to_string(),
            message: message.to_string(),
            channels: vec![NotificationChannel::System],
            status,
            payload: NotificationPayload::default(),
            created_at: Utc::now(),
            sent_at: None,
        }
    }

    fn event(title: &str, message: &str) -> NotificationEvent {
        NotificationEvent {
            r#type: NotificationType::PaymentPending,
            title: title.to_string(),
            message: message.to_string(),
            payload: serde_json::Value::Null,
            timestamp: None,
        }
    }

    #[test]
    fn set_notifications_recomputes_unread_count() {
        let store = NotificationStore::new();
        store.set_notifications(vec![
            sample("a", "A", "first", NotificationStatus::Sent),
            sample("b", "B", "second", NotificationStatus::Read),
            sample("c", "C", "third", NotificationStatus::Pending),
        ]);

        let state = store.snapshot();
        assert_eq!(state.notifications.len(), 3);
        assert_eq!(state.unread_count, 2);
    }

    #[test]
    fn push_event_prepends_and_duplicate_is_dropped() {
        let store = NotificationStore::new();
        store.set_notifications(vec![
            sample("a", "A", "first", NotificationStatus::Sent),
            sample("b", "B", "second", NotificationStatus::Read),
            sample("c", "C", "third", NotificationStatus::Pending),
        ]);
        assert_eq!(store.snapshot().unread_count, 2);

        assert!(store.add_event(event("Payment", "New payment arrived")));
        let state = store.snapshot();
        assert_eq!(state.notifications.len(), 4);
        assert_eq!(state.unread_count, 3);
        let head = &state.notifications[0];
        assert!(head.has_local_id());
        assert_eq!(head.status, NotificationStatus::Sent);
        assert_eq!(head.channels, vec![NotificationChannel::System]);

        assert!(!store.add_event(event("Payment", "New payment arrived")));
        let state = store.snapshot();
        assert_eq!(state.notifications.len(), 4);
        assert_eq!(state.unread_count, 3);
    }

    #[test]
    fn duplicate_event_does_not_wake_subscribers() {
        let store = NotificationStore::new();
        store.add_event(event("Payment", "New payment arrived"));

        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.add_event(event("Payment", "New payment arrived"));
        assert!(!rx.has_changed().unwrap());

        store.add_event(event("Payment", "A different payment"));
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn dedup_matches_on_title_and_message_together() {
        let store = NotificationStore::new();
        store.add_event(event("Payment", "New payment arrived"));
        store.add_event(event("Payment", "Another message"));
        store.add_event(event("Deliverable", "New payment arrived"));

        assert_eq!(store.snapshot().notifications.len(), 3);
    }

    #[test]
    fn mark_read_is_a_no_op_on_read_and_unknown_ids() {
        let store = NotificationStore::new();
        store.set_notifications(vec![
            sample("a", "A", "first", NotificationStatus::Sent),
            sample("b", "B", "second", NotificationStatus::Read),
        ]);

        store.mark_read("a");
        assert_eq!(store.snapshot().unread_count, 0);

        store.mark_read("a");
        store.mark_read("b");
        store.mark_read("nope");
        let state = store.snapshot();
        assert_eq!(state.unread_count, 0);
        assert!(state.notifications.iter().all(|n| n.is_read()));
    }

    #[test]
    fn mark_all_read_zeroes_the_count() {
        let store = NotificationStore::new();
        store.set_notifications(vec![
            sample("a", "A", "first", NotificationStatus::Sent),
            sample("b", "B", "second", NotificationStatus::Pending),
            sample("c", "C", "third", NotificationStatus::Failed),
        ]);

        store.mark_all_read();
        let state = store.snapshot();
        assert_eq!(state.unread_count, 0);
        assert!(state.notifications.iter().all(|n| n.is_read()));

        store.mark_all_read();
        assert_eq!(store.snapshot().unread_count, 0);
    }

    #[test]
    fn event_with_string_payload_is_parsed_defensively() {
        let store = NotificationStore::new();
        let mut ev = event("Contract", "Contract signed");
        ev.payload = serde_json::Value::String("{\"contractId\":\"abc\"}".to_string());

        store.add_event(ev);
        let state = store.snapshot();
        assert_eq!(
            state.notifications[0].payload.contract_id().as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn clear_resets_list_count_and_connection_flag() {
        let store = NotificationStore::new();
        store.set_notifications(vec![sample("a", "A", "first", NotificationStatus::Sent)]);
        store.set_connected(true);

        store.clear();
        assert_eq!(store.snapshot(), NotificationState::default());
    }

    #[test]
    fn set_connected_only_touches_the_flag() {
        let store = NotificationStore::new();
        store.set_notifications(vec![sample("a", "A", "first", NotificationStatus::Sent)]);

        store.set_connected(true);
        let state = store.snapshot();
        assert!(state.is_connected);
        assert_eq!(state.notifications.len(), 1);
        assert_eq!(state.unread_count, 1);
    }
}
