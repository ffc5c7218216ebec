//! Shared data models for the gestio notification contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::payload::NotificationPayload;

/// Prefix of client-synthesized notification ids.
///
/// A push event arrives before its server-side id is known; the client
/// assigns it a `local-{uuid}` id until the next authoritative fetch
/// replaces it with the server record.
pub const LOCAL_ID_PREFIX: &str = "local-";

// --- Notifications ---

/// Category of a notification, as sent by the backend.
///
/// Unknown wire values are preserved in `Other` so a newer backend never
/// breaks deserialization of the whole list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum NotificationType {
    PaymentPending,
    PaymentCompleted,
    PaymentRejected,
    DeliverableCompleted,
    DeliverableApproved,
    DeliverableRejected,
    ContractCreated,
    ContractExpired,
    TransactionCreated,
    UserCreated,
    InstallmentPending,
    InstallmentCompleted,
    InstallmentOverdue,
    Other(String),
}

impl NotificationType {
    pub fn is_payment(&self) -> bool {
        matches!(
            self,
            NotificationType::PaymentPending
                | NotificationType::PaymentCompleted
                | NotificationType::PaymentRejected
        )
    }

    pub fn is_deliverable(&self) -> bool {
        matches!(
            self,
            NotificationType::DeliverableCompleted
                | NotificationType::DeliverableApproved
                | NotificationType::DeliverableRejected
        )
    }

    pub fn is_installment(&self) -> bool {
        matches!(
            self,
            NotificationType::InstallmentPending
                | NotificationType::InstallmentCompleted
                | NotificationType::InstallmentOverdue
        )
    }
}

impl From<String> for NotificationType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PAYMENT_PENDING" => NotificationType::PaymentPending,
            "PAYMENT_COMPLETED" => NotificationType::PaymentCompleted,
            "PAYMENT_REJECTED" => NotificationType::PaymentRejected,
            "DELIVERABLE_COMPLETED" => NotificationType::DeliverableCompleted,
            "DELIVERABLE_APPROVED" => NotificationType::DeliverableApproved,
            "DELIVERABLE_REJECTED" => NotificationType::DeliverableRejected,
            "CONTRACT_CREATED" => NotificationType::ContractCreated,
            "CONTRACT_EXPIRED" => NotificationType::ContractExpired,
            "TRANSACTION_CREATED" => NotificationType::TransactionCreated,
            "USER_CREATED" => NotificationType::UserCreated,
            "INSTALLMENT_PENDING" => NotificationType::InstallmentPending,
            "INSTALLMENT_COMPLETED" => NotificationType::InstallmentCompleted,
            "INSTALLMENT_OVERDUE" => NotificationType::InstallmentOverdue,
            _ => NotificationType::Other(value),
        }
    }
}

impl From<NotificationType> for String {
    fn from(value: NotificationType) -> Self {
        match value {
            NotificationType::PaymentPending => "PAYMENT_PENDING".to_string(),
            NotificationType::PaymentCompleted => "PAYMENT_COMPLETED".to_string(),
            NotificationType::PaymentRejected => "PAYMENT_REJECTED".to_string(),
            NotificationType::DeliverableCompleted => "DELIVERABLE_COMPLETED".to_string(),
            NotificationType::DeliverableApproved => "DELIVERABLE_APPROVED".to_string(),
            NotificationType::DeliverableRejected => "DELIVERABLE_REJECTED".to_string(),
            NotificationType::ContractCreated => "CONTRACT_CREATED".to_string(),
            NotificationType::ContractExpired => "CONTRACT_EXPIRED".to_string(),
            NotificationType::TransactionCreated => "TRANSACTION_CREATED".to_string(),
            NotificationType::UserCreated => "USER_CREATED".to_string(),
            NotificationType::InstallmentPending => "INSTALLMENT_PENDING".to_string(),
            NotificationType::InstallmentCompleted => "INSTALLMENT_COMPLETED".to_string(),
            NotificationType::InstallmentOverdue => "INSTALLMENT_OVERDUE".to_string(),
            NotificationType::Other(value) => value,
        }
    }
}

/// Delivery state of a notification; READ vs the rest drives unread
/// accounting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
    Read,
}

/// Channel a notification was delivered through. Display-only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationChannel {
    System,
    Email,
    Whatsapp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub r#type: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub channels: Vec<NotificationChannel>,
    pub status: NotificationStatus,
    #[serde(default)]
    pub payload: NotificationPayload,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.status == NotificationStatus::Read
    }

    /// Whether this notification still carries a client-synthesized id.
    pub fn has_local_id(&self) -> bool {
        self.id.starts_with(LOCAL_ID_PREFIX)
    }

    /// Message with its trailing bracketed tag stripped.
    pub fn display_message(&self) -> String {
        strip_message_tag(&self.message)
    }
}

/// Body of a `notification` push frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub r#type: NotificationType,
    pub title: String,
    pub message: String,
    /// Raw payload value; parsed defensively at the point of use.
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Strip a trailing bracketed tag from a message, e.g.
/// `"Payment received [PAY-123]"` becomes `"Payment received"`.
///
/// The tag is display noise; dedup and matching always use the raw message.
pub fn strip_message_tag(message: &str) -> String {
    let trimmed = message.trim_end();
    if let Some(rest) = trimmed.strip_suffix(']') {
        if let Some(open) = rest.rfind('[') {
            return rest[..open].trim_end().to_string();
        }
    }
    trimmed.to_string()
}

// --- Identity ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Manager,
    Finance,
    Collaborator,
}

/// Route-family grouping of roles: collaborators get their own section of
/// the app, everyone else lands on the admin side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleClass {
    Collaborator,
    Staff,
}

impl UserRole {
    pub fn role_class(&self) -> RoleClass {
        match self {
            UserRole::Collaborator => RoleClass::Collaborator,
            _ => RoleClass::Staff,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub role: UserRole,
}

// --- REST bodies ---

/// Body of `GET /auth/token`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
}

/// Body of `GET /notifications/unread-count`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_notification_type_is_preserved() {
        let parsed: NotificationType = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(parsed, NotificationType::Other("SOMETHING_NEW".to_string()));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"SOMETHING_NEW\"");
    }

    #[test]
    fn known_notification_type_round_trips() {
        let parsed: NotificationType = serde_json::from_str("\"PAYMENT_PENDING\"").unwrap();
        assert_eq!(parsed, NotificationType::PaymentPending);
        assert!(parsed.is_payment());
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"PAYMENT_PENDING\"");
    }

    #[test]
    fn strip_message_tag_removes_trailing_tag() {
        assert_eq!(strip_message_tag("Payment received [PAY-123]"), "Payment received");
        assert_eq!(strip_message_tag("No tag here"), "No tag here");
        assert_eq!(strip_message_tag("Trailing spaces [X]  "), "Trailing spaces");
    }

    #[test]
    fn strip_message_tag_only_touches_the_tail() {
        assert_eq!(strip_message_tag("[lead] then text"), "[lead] then text");
    }

    #[test]
    fn role_class_groups_collaborators_apart() {
        assert_eq!(UserRole::Collaborator.role_class(), RoleClass::Collaborator);
        assert_eq!(UserRole::Admin.role_class(), RoleClass::Staff);
        assert_eq!(UserRole::Finance.role_class(), RoleClass::Staff);
    }

    #[test]
    fn notification_deserializes_from_wire_shape() {
        let raw = serde_json::json!({
            "id": "n-1",
            "type": "CONTRACT_CREATED",
            "title": "New contract",
            "message": "Contract signed [CT-9]",
            "channels": ["SYSTEM", "EMAIL"],
            "status": "SENT",
            "payload": { "contractId": "ct-9" },
            "createdAt": "2024-05-01T10:00:00Z",
            "sentAt": "2024-05-01T10:00:01Z"
        });
        let n: Notification = serde_json::from_value(raw).unwrap();
        assert_eq!(n.r#type, NotificationType::ContractCreated);
        assert!(!n.is_read());
        assert!(!n.has_local_id());
        assert_eq!(n.display_message(), "Contract signed");
        assert_eq!(n.payload.contract_id().as_deref(), Some("ct-9"));
    }
}
