//! Listing document: a material offered by its owner.
use super::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Listing {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub location: String,
    pub price: Option<f64>,
    /// Ordered image URLs; 1 to 5 entries, validated before any write.
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// `None` means the listing never expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub status: ListingStatus,
    /// Mirrors `status == acquired`; the two are written together in a single
    /// document update so the pair can never diverge.
    pub is_acquired: bool,
    pub view_count: u64,
    /// Carried for document compatibility with other clients of the store;
    /// this service reads and round-trips it but exposes no inquiry route.
    pub inquiry_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Acquired,
}
