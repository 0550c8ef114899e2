//! Listing API handlers.
//!
//! # Purpose
//! Implements listing CRUD, the acquire transition, the lifecycle-filtered
//! feed, and the per-owner index view. Multi-step writes are ordered
//! primary-then-index-then-notification; everything after the primary write
//! is best-effort.
use crate::api::error::{ApiError, api_conflict, api_internal, api_validation_error};
use crate::api::types::{
    ListingCreateRequest, ListingDetailResponse, ListingListResponse, ListingUpdateRequest,
};
use crate::api::{decode_doc, encode_doc, ensure_owner, load_listing};
use crate::app::AppState;
use crate::auth::Identity;
use crate::index;
use crate::model::lifecycle;
use crate::model::{Listing, ListingStatus, NotificationKind};
use crate::notify::notify;
use crate::store::keys;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

const MAX_IMAGES: usize = 5;

fn validate_images(images: &[String]) -> Result<(), ApiError> {
    if images.is_empty() || images.len() > MAX_IMAGES {
        return Err(api_validation_error("listing requires 1 to 5 images"));
    }
    if images.iter().any(|url| url.trim().is_empty()) {
        return Err(api_validation_error("image url must not be empty"));
    }
    Ok(())
}

fn validate_price(price: Option<f64>) -> Result<(), ApiError> {
    if let Some(price) = price {
        if !price.is_finite() || price < 0.0 {
            return Err(api_validation_error("price must be a non-negative number"));
        }
    }
    Ok(())
}

fn validate_expiry(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<(), ApiError> {
    if let Some(expires_at) = expires_at {
        if expires_at <= now {
            return Err(api_validation_error("expiry must be in the future"));
        }
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/listings",
    tag = "listings",
    request_body = ListingCreateRequest,
    responses(
        (status = 201, description = "Listing created", body = Listing),
        (status = 400, description = "Validation failed", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Caller identity missing", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_listing(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<ListingCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    if body.title.trim().is_empty() {
        return Err(api_validation_error("title must not be empty"));
    }
    validate_images(&body.images)?;
    validate_price(body.price)?;
    validate_expiry(body.expires_at, now)?;

    let listing = Listing {
        id: Uuid::new_v4().to_string(),
        owner_id: identity.as_str().to_string(),
        title: body.title,
        description: body.description,
        category: body.category,
        location: body.location,
        price: body.price,
        images: body.images,
        created_at: now,
        expires_at: body.expires_at,
        status: ListingStatus::Active,
        is_acquired: false,
        view_count: 0,
        inquiry_count: 0,
    };
    let doc = encode_doc(&listing)?;
    state
        .store
        .set(&keys::listing(&listing.id), doc)
        .await
        .map_err(|err| api_internal("failed to create listing", &err))?;

    // Primary is durable; index and notification must not fail the create.
    index::best_effort(
        "listing_index",
        index::push(
            state.store.as_ref(),
            &keys::user_listing_index(identity.as_str()),
            &listing.id,
            state.index_cap,
        )
        .await,
    );
    notify(
        state.store.as_ref(),
        identity.as_str(),
        NotificationKind::ListingCreated,
        "Listing published",
        &format!("\"{}\" is now visible to other members", listing.title),
        Some(&listing.id),
    )
    .await;
    metrics::counter!("exchange_listing_ops_total", "op" => "created").increment(1);
    Ok((StatusCode::CREATED, Json(listing)))
}

#[utoipa::path(
    get,
    path = "/v1/listings",
    tag = "listings",
    params(
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("location" = Option<String>, Query, description = "Filter by location substring"),
        ("limit" = Option<usize>, Query, description = "Maximum items returned")
    ),
    responses(
        (status = 200, description = "Active listing feed", body = ListingListResponse)
    )
)]
pub(crate) async fn list_listings(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<ListingListResponse>, ApiError> {
    let now = Utc::now();
    let docs = state
        .store
        .scan_by_prefix(keys::LISTING_PREFIX)
        .await
        .map_err(|err| api_internal("failed to list listings", &err))?;

    let category = params
        .get("category")
        .and_then(|value| crate::model::Category::parse(value));
    let location = params.get("location").map(|value| value.to_lowercase());
    let limit = params
        .get("limit")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(state.feed_limit)
        .min(state.feed_limit);

    // The scan has no ordering guarantee; sort after the fact.
    let mut items: Vec<Listing> = docs
        .into_iter()
        .filter_map(decode_doc::<Listing>)
        .filter(|listing| lifecycle::listing_in_feed(listing, now))
        .filter(|listing| category.is_none_or(|wanted| listing.category == wanted))
        .filter(|listing| {
            location
                .as_deref()
                .is_none_or(|wanted| listing.location.to_lowercase().contains(wanted))
        })
        .collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items.truncate(limit);
    Ok(Json(ListingListResponse { items }))
}

#[utoipa::path(
    get,
    path = "/v1/listings/{id}",
    tag = "listings",
    params(("id" = String, Path, description = "Listing identifier")),
    responses(
        (status = 200, description = "Listing detail", body = ListingDetailResponse),
        (status = 404, description = "Listing not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_listing(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ListingDetailResponse>, ApiError> {
    let now = Utc::now();
    let mut listing = load_listing(&state, &id).await?;

    // Non-atomic view counter: read-modify-write with no synchronization.
    // Concurrent readers can lose increments; that is accepted.
    listing.view_count += 1;
    match serde_json::to_value(&listing) {
        Ok(doc) => index::best_effort(
            "view_count",
            state.store.set(&keys::listing(&id), doc).await,
        ),
        Err(err) => tracing::warn!(error = %err, "view counter encode failed"),
    }

    Ok(Json(ListingDetailResponse {
        expired: lifecycle::is_expired(listing.expires_at, now),
        days_remaining: lifecycle::days_remaining(listing.expires_at, now),
        listing,
    }))
}

#[utoipa::path(
    patch,
    path = "/v1/listings/{id}",
    tag = "listings",
    params(("id" = String, Path, description = "Listing identifier")),
    request_body = ListingUpdateRequest,
    responses(
        (status = 200, description = "Listing updated", body = Listing),
        (status = 403, description = "Caller is not the owner", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Listing not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_listing(
    Path(id): Path<String>,
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<ListingUpdateRequest>,
) -> Result<Json<Listing>, ApiError> {
    let now = Utc::now();
    let mut listing = load_listing(&state, &id).await?;
    ensure_owner(&listing.owner_id, &identity)?;

    if let Some(title) = body.title {
        if title.trim().is_empty() {
            return Err(api_validation_error("title must not be empty"));
        }
        listing.title = title;
    }
    if let Some(description) = body.description {
        listing.description = description;
    }
    if let Some(category) = body.category {
        listing.category = category;
    }
    if let Some(location) = body.location {
        listing.location = location;
    }
    if let Some(price) = body.price {
        validate_price(Some(price))?;
        listing.price = Some(price);
    }
    if let Some(images) = body.images {
        validate_images(&images)?;
        listing.images = images;
    }
    if let Some(expires_at) = body.expires_at {
        validate_expiry(Some(expires_at), now)?;
        listing.expires_at = Some(expires_at);
    }

    let doc = encode_doc(&listing)?;
    state
        .store
        .set(&keys::listing(&id), doc)
        .await
        .map_err(|err| api_internal("failed to update listing", &err))?;
    Ok(Json(listing))
}

#[utoipa::path(
    post,
    path = "/v1/listings/{id}/acquire",
    tag = "listings",
    params(("id" = String, Path, description = "Listing identifier")),
    responses(
        (status = 200, description = "Listing marked acquired", body = Listing),
        (status = 403, description = "Caller is not the owner", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Listing not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Already acquired", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn acquire_listing(
    Path(id): Path<String>,
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Listing>, ApiError> {
    let mut listing = load_listing(&state, &id).await?;
    ensure_owner(&listing.owner_id, &identity)?;
    if listing.is_acquired {
        return Err(api_conflict("already_acquired", "listing already acquired"));
    }

    // Status and flag flip together in one document write so they cannot
    // diverge.
    listing.status = ListingStatus::Acquired;
    listing.is_acquired = true;
    let doc = encode_doc(&listing)?;
    state
        .store
        .set(&keys::listing(&id), doc)
        .await
        .map_err(|err| api_internal("failed to update listing", &err))?;

    notify(
        state.store.as_ref(),
        identity.as_str(),
        NotificationKind::ListingAcquired,
        "Listing acquired",
        &format!("\"{}\" was marked as acquired", listing.title),
        Some(&listing.id),
    )
    .await;
    metrics::counter!("exchange_listing_ops_total", "op" => "acquired").increment(1);
    Ok(Json(listing))
}

#[utoipa::path(
    delete,
    path = "/v1/listings/{id}",
    tag = "listings",
    params(("id" = String, Path, description = "Listing identifier")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 403, description = "Caller is not the owner", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Listing not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_listing(
    Path(id): Path<String>,
    State(state): State<AppState>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    let listing = load_listing(&state, &id).await?;
    ensure_owner(&listing.owner_id, &identity)?;

    state
        .store
        .delete(&keys::listing(&id))
        .await
        .map_err(|err| api_internal("failed to delete listing", &err))?;
    index::best_effort(
        "listing_index",
        index::remove(
            state.store.as_ref(),
            &keys::user_listing_index(identity.as_str()),
            &id,
        )
        .await,
    );
    notify(
        state.store.as_ref(),
        identity.as_str(),
        NotificationKind::ListingDeleted,
        "Listing removed",
        &format!("\"{}\" was removed", listing.title),
        Some(&id),
    )
    .await;
    metrics::counter!("exchange_listing_ops_total", "op" => "deleted").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/listings",
    tag = "listings",
    params(("user_id" = String, Path, description = "Owner identifier")),
    responses(
        (status = 200, description = "Listings owned by the user", body = ListingListResponse)
    )
)]
pub(crate) async fn user_listings(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ListingListResponse>, ApiError> {
    let ids = index::read(state.store.as_ref(), &keys::user_listing_index(&user_id))
        .await
        .map_err(|err| api_internal("failed to read listing index", &err))?;

    // The index is not transactionally linked to the primaries: dangling IDs
    // are skipped, and entities older than the cap are simply not shown here.
    let mut items = Vec::with_capacity(ids.len());
    for id in ids {
        let doc = state
            .store
            .get(&keys::listing(&id))
            .await
            .map_err(|err| api_internal("failed to load listing", &err))?;
        if let Some(listing) = doc.and_then(decode_doc::<Listing>) {
            items.push(listing);
        }
    }
    Ok(Json(ListingListResponse { items }))
}
