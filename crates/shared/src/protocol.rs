//! Wire frames for the realtime notification channel.

use serde::{Deserialize, Serialize};

use crate::models::NotificationEvent;

/// Path of the namespaced realtime endpoint, relative to the socket base.
pub const NOTIFICATIONS_PATH: &str = "/notifications";

/// Server-to-client frames pushed over the notification socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerFrame {
    Notification(NotificationEvent),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationType;

    #[test]
    fn notification_frame_deserializes() {
        let raw = r#"{
            "event": "notification",
            "data": {
                "type": "PAYMENT_PENDING",
                "title": "Payment due",
                "message": "Installment 3 is due [PAY-3]",
                "payload": { "contractId": "ct-1" }
            }
        }"#;
        let frame: ServerFrame = serde_json::from_str(raw).unwrap();
        let ServerFrame::Notification(event) = frame;
        assert_eq!(event.r#type, NotificationType::PaymentPending);
        assert_eq!(event.title, "Payment due");
    }
}
