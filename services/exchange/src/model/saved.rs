//! Saved-item bookmark: a (user, listing) pair, unique by key construction.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SavedItem {
    pub user_id: String,
    pub listing_id: String,
    pub saved_at: DateTime<Utc>,
}
