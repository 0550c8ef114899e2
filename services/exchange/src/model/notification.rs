//! Notification document, owned by its recipient.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// ID of the listing or request this notification refers to.
    pub related_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ListingCreated,
    ListingAcquired,
    ListingDeleted,
    RequestCreated,
    RequestFulfilled,
    RequestDeleted,
    ResponseReceived,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListingCreated => "listing_created",
            Self::ListingAcquired => "listing_acquired",
            Self::ListingDeleted => "listing_deleted",
            Self::RequestCreated => "request_created",
            Self::RequestFulfilled => "request_fulfilled",
            Self::RequestDeleted => "request_deleted",
            Self::ResponseReceived => "response_received",
        }
    }
}
