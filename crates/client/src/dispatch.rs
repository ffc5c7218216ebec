//! Read persistence and click routing for notifications.

use gestio_shared::{CurrentUser, Notification, NotificationType, RoleClass};

use crate::api_client::ApiClient;
use crate::store::NotificationStore;

/// User-triggered notification actions: persisting read state and resolving
/// where a clicked notification should take the user.
#[derive(Clone)]
pub struct NotificationActions {
    api: ApiClient,
    store: NotificationStore,
}

impl NotificationActions {
    pub fn new(api: ApiClient, store: NotificationStore) -> Self {
        Self { api, store }
    }

    /// Mark one notification read, persisting to the server when it has a
    /// real id. Entries still carrying a local id have no server record, so
    /// only local state changes.
    ///
    /// A failed server call is logged and not retried; the store is updated
    /// either way and the next authoritative fetch reconciles.
    pub async fn mark_as_read(&self, notification: &Notification) {
        if !notification.has_local_id() {
            if let Err(e) = self.api.mark_notification_read(&notification.id).await {
                tracing::warn!("failed to persist read state for {}: {}", notification.id, e);
            }
        }
        self.store.mark_read(&notification.id);
    }

    /// Mark everything read on the server, then locally regardless of the
    /// call's outcome.
    pub async fn mark_all_as_read(&self) {
        if let Err(e) = self.api.mark_all_notifications_read().await {
            tracing::warn!("failed to persist mark-all-read: {}", e);
        }
        self.store.mark_all_read();
    }

    /// Handle a click on a notification: mark it read and resolve the
    /// destination path the app should navigate to, if any.
    pub async fn open_notification(
        &self,
        notification: &Notification,
        user: &CurrentUser,
    ) -> Option<String> {
        self.mark_as_read(notification).await;
        resolve_destination(notification, user.role.role_class())
    }
}

/// Destination path for a clicked notification, or `None` when its payload
/// carries nothing to route to.
pub fn resolve_destination(notification: &Notification, role_class: RoleClass) -> Option<String> {
    if notification.r#type == NotificationType::TransactionCreated {
        return Some("/admin/accounting".to_string());
    }

    let base = role_base(role_class);

    if notification.r#type.is_payment() {
        if let Some(company_id) = notification.payload.company_id() {
            let company_id = urlencoding::encode(&company_id);
            return Some(match role_class {
                RoleClass::Collaborator => format!("{}/company?companyId={}", base, company_id),
                RoleClass::Staff => {
                    format!("{}/company?companyId={}&tab=payments", base, company_id)
                }
            });
        }
    }

    if let Some(contract_id) = notification.payload.contract_id() {
        let tab = contract_tab(&notification.r#type);
        return Some(format!(
            "{}/contract?contractId={}&tab={}",
            base,
            urlencoding::encode(&contract_id),
            tab
        ));
    }

    None
}

fn role_base(role_class: RoleClass) -> &'static str {
    match role_class {
        RoleClass::Collaborator => "/collaborator",
        RoleClass::Staff => "/admin",
    }
}

fn contract_tab(kind: &NotificationType) -> &'static str {
    if kind.is_payment() || kind.is_installment() {
        "payments"
    } else if kind.is_deliverable() {
        "deliverables"
    } else {
        "general"
    }
}
