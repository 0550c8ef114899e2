//! Read-time status derivation.
//!
//! # Purpose
//! Expiry is never written back to the store: no job flips a stored status to
//! "expired". Every list endpoint applies these pure functions instead, so an
//! entity can be `active` in storage yet invisible in every feed, while a
//! direct ID lookup still returns it unchanged. Keeping this computed rather
//! than stored is what makes the behavior reproducible against data written
//! by other clients of the same store.
use super::{Listing, ListingStatus, Request, RequestStatus};
use chrono::{DateTime, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

/// An entity with no `expires_at` never expires.
pub fn is_expired(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expires_at {
        Some(expires_at) => now > expires_at,
        None => false,
    }
}

/// Whole days until expiry, rounded up, floored at zero. `None` for
/// non-expiring entities.
pub fn days_remaining(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    let expires_at = expires_at?;
    let seconds = (expires_at - now).num_seconds();
    if seconds <= 0 {
        return Some(0);
    }
    Some((seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY)
}

/// Feed membership for listings: stored-active, not expired, not acquired.
pub fn listing_in_feed(listing: &Listing, now: DateTime<Utc>) -> bool {
    listing.status == ListingStatus::Active
        && !listing.is_acquired
        && !is_expired(listing.expires_at, now)
}

/// Feed membership for requests: stored-active and not expired.
pub fn request_in_feed(request: &Request, now: DateTime<Utc>) -> bool {
    request.status == RequestStatus::Active && !is_expired(Some(request.expires_at), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Urgency};
    use chrono::Duration;

    fn listing(status: ListingStatus, is_acquired: bool, expires_at: Option<DateTime<Utc>>) -> Listing {
        Listing {
            id: "l1".to_string(),
            owner_id: "u1".to_string(),
            title: "Oak boards".to_string(),
            description: String::new(),
            category: Category::Wood,
            location: "Depot 4".to_string(),
            price: None,
            images: vec!["https://img/1".to_string()],
            created_at: Utc::now(),
            expires_at,
            status,
            is_acquired,
            view_count: 0,
            inquiry_count: 0,
        }
    }

    fn request(status: RequestStatus, expires_at: DateTime<Utc>) -> Request {
        Request {
            id: "r1".to_string(),
            owner_id: "u1".to_string(),
            title: "Need bricks".to_string(),
            description: String::new(),
            category: Category::Masonry,
            location: "Depot 4".to_string(),
            expires_at,
            status,
            urgency: Urgency::Normal,
            budget: None,
            response_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn expiry_requires_a_timestamp_in_the_past() {
        let now = Utc::now();
        assert!(!is_expired(None, now));
        assert!(!is_expired(Some(now + Duration::hours(1)), now));
        assert!(is_expired(Some(now - Duration::seconds(1)), now));
        // Exactly at the boundary the entity is still live.
        assert!(!is_expired(Some(now), now));
    }

    #[test]
    fn days_remaining_rounds_up_and_floors_at_zero() {
        let now = Utc::now();
        assert_eq!(days_remaining(None, now), None);
        assert_eq!(days_remaining(Some(now + Duration::seconds(1)), now), Some(1));
        assert_eq!(days_remaining(Some(now + Duration::days(7)), now), Some(7));
        assert_eq!(
            days_remaining(Some(now + Duration::days(3) + Duration::seconds(1)), now),
            Some(4)
        );
        assert_eq!(days_remaining(Some(now - Duration::days(2)), now), Some(0));
    }

    #[test]
    fn listing_feed_excludes_expired_and_acquired() {
        let now = Utc::now();
        let future = Some(now + Duration::days(1));
        let past = Some(now - Duration::days(1));

        assert!(listing_in_feed(&listing(ListingStatus::Active, false, None), now));
        assert!(listing_in_feed(&listing(ListingStatus::Active, false, future), now));
        assert!(!listing_in_feed(&listing(ListingStatus::Active, false, past), now));
        assert!(!listing_in_feed(&listing(ListingStatus::Acquired, true, future), now));
    }

    #[test]
    fn request_feed_excludes_everything_but_live_active() {
        let now = Utc::now();
        let future = now + Duration::days(1);
        let past = now - Duration::days(1);

        assert!(request_in_feed(&request(RequestStatus::Active, future), now));
        assert!(!request_in_feed(&request(RequestStatus::Active, past), now));
        assert!(!request_in_feed(&request(RequestStatus::Fulfilled, future), now));
        assert!(!request_in_feed(&request(RequestStatus::Deleted, future), now));
    }
}
