//! Composite-key construction for the entity store.
//!
//! # Purpose
//! Centralizes the key naming convention so every handler and index writer
//! produces bit-compatible keys. The convention must interoperate with data
//! written by other marketplace clients sharing the same hosted store:
//! `entity-type:id` for primary records, `user_entity-type:owner-id` for
//! per-owner indexes, and parent-scoped prefixes for children so a single
//! prefix scan retrieves one user's notifications or one request's responses.

pub const LISTING_PREFIX: &str = "upload:";
pub const REQUEST_PREFIX: &str = "request:";

pub fn listing(id: &str) -> String {
    format!("upload:{id}")
}

pub fn user_listing_index(owner_id: &str) -> String {
    format!("user_upload:{owner_id}")
}

pub fn request(id: &str) -> String {
    format!("request:{id}")
}

pub fn user_request_index(owner_id: &str) -> String {
    format!("user_request:{owner_id}")
}

pub fn response(request_id: &str, response_id: &str) -> String {
    format!("request_response:{request_id}:{response_id}")
}

pub fn response_prefix(request_id: &str) -> String {
    format!("request_response:{request_id}:")
}

pub fn notification(recipient_id: &str, notification_id: &str) -> String {
    format!("notification:{recipient_id}:{notification_id}")
}

pub fn notification_prefix(recipient_id: &str) -> String {
    format!("notification:{recipient_id}:")
}

pub fn saved_item(user_id: &str, listing_id: &str) -> String {
    format!("saved_item:{user_id}:{listing_id}")
}

pub fn saved_item_prefix(user_id: &str) -> String {
    format!("saved_item:{user_id}:")
}
