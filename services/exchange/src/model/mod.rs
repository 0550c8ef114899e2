//! Entity documents stored in the marketplace's key-value store.
//!
//! # Purpose
//! Defines the JSON document shapes for listings, requests, responses,
//! notifications, and saved-item bookmarks, plus the pure lifecycle
//! derivations applied at read time.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod lifecycle;
mod listing;
mod notification;
mod request;
mod saved;

pub use listing::{Listing, ListingStatus};
pub use notification::{Notification, NotificationKind};
pub use request::{BudgetRange, Request, RequestResponse, RequestStatus, Urgency};
pub use saved::SavedItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Wood,
    Metal,
    Masonry,
    Fixtures,
    Tools,
    Other,
}

impl Category {
    /// Parse the wire name (`snake_case`) used in query filters.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "wood" => Some(Self::Wood),
            "metal" => Some(Self::Metal),
            "masonry" => Some(Self::Masonry),
            "fixtures" => Some(Self::Fixtures),
            "tools" => Some(Self::Tools),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse_matches_serde_names() {
        for category in [
            Category::Wood,
            Category::Metal,
            Category::Masonry,
            Category::Fixtures,
            Category::Tools,
            Category::Other,
        ] {
            let wire = serde_json::to_value(category).unwrap();
            let name = wire.as_str().unwrap();
            assert_eq!(Category::parse(name), Some(category));
        }
        assert_eq!(Category::parse("granite"), None);
    }
}
