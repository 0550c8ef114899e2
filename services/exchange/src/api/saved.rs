//! Saved-item API handlers.
//!
//! # Purpose
//! Bookmarks are (user, listing) pairs stored under
//! `saved_item:<user>:<listing>`, so uniqueness per pair falls out of the key
//! and both save and unsave are idempotent.
use crate::api::error::{ApiError, api_internal};
use crate::api::types::SavedListResponse;
use crate::api::{decode_doc, encode_doc, load_listing};
use crate::app::AppState;
use crate::auth::Identity;
use crate::model::{Listing, SavedItem};
use crate::store::keys;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;

#[utoipa::path(
    put,
    path = "/v1/listings/{id}/save",
    tag = "saved",
    params(("id" = String, Path, description = "Listing identifier")),
    responses(
        (status = 204, description = "Listing bookmarked"),
        (status = 404, description = "Listing not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn save_listing(
    Path(id): Path<String>,
    State(state): State<AppState>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    // Bookmarking requires the listing to exist right now; the pair may still
    // dangle later if the listing is deleted, and the list path skips it.
    load_listing(&state, &id).await?;

    let item = SavedItem {
        user_id: identity.as_str().to_string(),
        listing_id: id.clone(),
        saved_at: Utc::now(),
    };
    let doc = encode_doc(&item)?;
    state
        .store
        .set(&keys::saved_item(identity.as_str(), &id), doc)
        .await
        .map_err(|err| api_internal("failed to save listing", &err))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/v1/listings/{id}/save",
    tag = "saved",
    params(("id" = String, Path, description = "Listing identifier")),
    responses(
        (status = 204, description = "Bookmark removed")
    )
)]
pub(crate) async fn unsave_listing(
    Path(id): Path<String>,
    State(state): State<AppState>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete(&keys::saved_item(identity.as_str(), &id))
        .await
        .map_err(|err| api_internal("failed to remove bookmark", &err))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/saved",
    tag = "saved",
    responses(
        (status = 200, description = "Caller's bookmarked listings", body = SavedListResponse),
        (status = 401, description = "Caller identity missing", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_saved(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<SavedListResponse>, ApiError> {
    let docs = state
        .store
        .scan_by_prefix(&keys::saved_item_prefix(identity.as_str()))
        .await
        .map_err(|err| api_internal("failed to list bookmarks", &err))?;

    let mut bookmarks: Vec<SavedItem> =
        docs.into_iter().filter_map(decode_doc::<SavedItem>).collect();
    bookmarks.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));

    let mut items = Vec::with_capacity(bookmarks.len());
    for bookmark in bookmarks {
        let doc = state
            .store
            .get(&keys::listing(&bookmark.listing_id))
            .await
            .map_err(|err| api_internal("failed to load listing", &err))?;
        if let Some(listing) = doc.and_then(decode_doc::<Listing>) {
            items.push(listing);
        }
    }
    Ok(Json(SavedListResponse { items }))
}
