//! Marketplace HTTP API module.
//!
//! # Purpose
//! Exposes the route handler modules and the shared helpers for loading
//! primary entities and enforcing ownership before mutation.
pub mod error;
pub mod listings;
pub mod notifications;
pub mod openapi;
pub mod requests;
pub mod saved;
pub mod system;
pub mod types;

use crate::api::error::{
    ApiError, api_forbidden, api_internal, api_internal_message, api_not_found,
};
use crate::app::AppState;
use crate::auth::Identity;
use crate::model::{Listing, Request};
use crate::store::keys;
use serde::de::DeserializeOwned;

/// Encode an entity for storage. Serialization of our own types failing is a
/// bug, but it still must not panic a handler.
pub(crate) fn encode_doc<T: serde::Serialize>(entity: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(entity).map_err(|err| {
        tracing::error!(error = %err, "document encode failed");
        api_internal_message("failed to encode document")
    })
}

/// Decode a scanned document, skipping it with a warning when malformed.
/// The store enforces no schema, so list paths must tolerate foreign shapes.
pub(crate) fn decode_doc<T: DeserializeOwned>(doc: serde_json::Value) -> Option<T> {
    match serde_json::from_value(doc) {
        Ok(entity) => Some(entity),
        Err(err) => {
            tracing::warn!(error = %err, "skipping malformed document in scan");
            None
        }
    }
}

pub(crate) async fn load_listing(state: &AppState, id: &str) -> Result<Listing, ApiError> {
    let doc = state
        .store
        .get(&keys::listing(id))
        .await
        .map_err(|err| api_internal("failed to load listing", &err))?
        .ok_or_else(|| api_not_found("listing not found"))?;
    serde_json::from_value(doc).map_err(|_| api_internal_message("malformed listing document"))
}

pub(crate) async fn load_request(state: &AppState, id: &str) -> Result<Request, ApiError> {
    let doc = state
        .store
        .get(&keys::request(id))
        .await
        .map_err(|err| api_internal("failed to load request", &err))?
        .ok_or_else(|| api_not_found("request not found"))?;
    serde_json::from_value(doc).map_err(|_| api_internal_message("malformed request document"))
}

/// Mutating routes reject before any write when the caller is not the owner.
pub(crate) fn ensure_owner(owner_id: &str, identity: &Identity) -> Result<(), ApiError> {
    if owner_id != identity.as_str() {
        return Err(api_forbidden("caller does not own this entity"));
    }
    Ok(())
}
