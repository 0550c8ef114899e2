//! Best-effort notification fanout.
//!
//! # Purpose
//! After a state-changing operation on a listing or request, the handler
//! issues one additional store write creating a notification document for the
//! affected user. The write is unguarded: failure is logged and counted but
//! never propagates to the caller and never rolls back the primary operation.
//! A user can therefore miss a notification for an operation that otherwise
//! fully succeeded; the route's answer reflects the primary operation only.
use crate::model::{Notification, NotificationKind};
use crate::store::{EntityStore, keys};
use chrono::Utc;
use uuid::Uuid;

pub async fn notify(
    store: &dyn EntityStore,
    recipient_id: &str,
    kind: NotificationKind,
    title: &str,
    message: &str,
    related_id: Option<&str>,
) {
    let notification = Notification {
        id: Uuid::new_v4().to_string(),
        recipient_id: recipient_id.to_string(),
        kind,
        title: title.to_string(),
        message: message.to_string(),
        related_id: related_id.map(str::to_string),
        is_read: false,
        created_at: Utc::now(),
    };
    let key = keys::notification(recipient_id, &notification.id);
    let value = match serde_json::to_value(&notification) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, kind = kind.as_str(), "notification encode failed");
            return;
        }
    };
    match store.set(&key, value).await {
        Ok(()) => {
            metrics::counter!("exchange_notifications_total", "kind" => kind.as_str()).increment(1);
        }
        Err(err) => {
            metrics::counter!("exchange_side_effect_failures_total", "op" => "notification")
                .increment(1);
            tracing::warn!(
                recipient = recipient_id,
                kind = kind.as_str(),
                error = %err,
                "notification write failed"
            );
        }
    }
}
