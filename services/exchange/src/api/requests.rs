//! Request API handlers and the request-response workflow.
//!
//! # Purpose
//! Implements request CRUD, the owner-only `active → fulfilled` and
//! `active → deleted` transitions, and the guarded add-response path with its
//! denormalized `response_count`.
//!
//! # Counter semantics
//! `response_count` is maintained by increment-on-write: after the response
//! document is durably written, the parent is re-read, incremented by one,
//! and written back. The increment is a plain read-modify-write with no
//! synchronization, so concurrent responders can lose updates, and a failed
//! increment after a durable child write undercounts permanently. `recount`
//! is the repair path; the hot path never recomputes.
use crate::api::error::{ApiError, api_conflict, api_internal, api_validation_error};
use crate::api::types::{
    RecountResponse, RequestCreateRequest, RequestDetailResponse, RequestListResponse,
    RequestUpdateRequest, ResponseCreateRequest, ResponseListResponse,
};
use crate::api::{decode_doc, encode_doc, ensure_owner, load_request};
use crate::app::AppState;
use crate::auth::Identity;
use crate::index;
use crate::model::lifecycle;
use crate::model::{NotificationKind, Request, RequestResponse, RequestStatus};
use crate::notify::notify;
use crate::store::keys;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

fn ensure_active(request: &Request) -> Result<(), ApiError> {
    if request.status != RequestStatus::Active {
        return Err(api_conflict("request_not_active", "request is not active"));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/requests",
    tag = "requests",
    request_body = RequestCreateRequest,
    responses(
        (status = 201, description = "Request created", body = Request),
        (status = 400, description = "Validation failed", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Caller identity missing", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_request(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<RequestCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    if body.title.trim().is_empty() {
        return Err(api_validation_error("title must not be empty"));
    }
    // Unlike listings, request expiry is mandatory and strictly future.
    if body.expires_at <= now {
        return Err(api_validation_error("expiry must be in the future"));
    }
    if let Some(budget) = &body.budget {
        if !budget.min.is_finite() || !budget.max.is_finite() || budget.min < 0.0 {
            return Err(api_validation_error("budget bounds must be non-negative"));
        }
        if budget.min > budget.max {
            return Err(api_validation_error("budget minimum exceeds maximum"));
        }
    }

    let request = Request {
        id: Uuid::new_v4().to_string(),
        owner_id: identity.as_str().to_string(),
        title: body.title,
        description: body.description,
        category: body.category,
        location: body.location,
        expires_at: body.expires_at,
        status: RequestStatus::Active,
        urgency: body.urgency,
        budget: body.budget,
        response_count: 0,
        created_at: now,
    };
    let doc = encode_doc(&request)?;
    state
        .store
        .set(&keys::request(&request.id), doc)
        .await
        .map_err(|err| api_internal("failed to create request", &err))?;

    index::best_effort(
        "request_index",
        index::push(
            state.store.as_ref(),
            &keys::user_request_index(identity.as_str()),
            &request.id,
            state.index_cap,
        )
        .await,
    );
    notify(
        state.store.as_ref(),
        identity.as_str(),
        NotificationKind::RequestCreated,
        "Request published",
        &format!("\"{}\" is now visible to other members", request.title),
        Some(&request.id),
    )
    .await;
    metrics::counter!("exchange_request_ops_total", "op" => "created").increment(1);
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/v1/requests",
    tag = "requests",
    params(
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("urgency" = Option<String>, Query, description = "Filter by urgency"),
        ("limit" = Option<usize>, Query, description = "Maximum items returned")
    ),
    responses(
        (status = 200, description = "Active request feed", body = RequestListResponse)
    )
)]
pub(crate) async fn list_requests(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<RequestListResponse>, ApiError> {
    let now = Utc::now();
    let docs = state
        .store
        .scan_by_prefix(keys::REQUEST_PREFIX)
        .await
        .map_err(|err| api_internal("failed to list requests", &err))?;

    let category = params
        .get("category")
        .and_then(|value| crate::model::Category::parse(value));
    let urgency = params
        .get("urgency")
        .and_then(|value| crate::model::Urgency::parse(value));
    let limit = params
        .get("limit")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(state.feed_limit)
        .min(state.feed_limit);

    let mut items: Vec<Request> = docs
        .into_iter()
        .filter_map(decode_doc::<Request>)
        .filter(|request| lifecycle::request_in_feed(request, now))
        .filter(|request| category.is_none_or(|wanted| request.category == wanted))
        .filter(|request| urgency.is_none_or(|wanted| request.urgency == wanted))
        .collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items.truncate(limit);
    Ok(Json(RequestListResponse { items }))
}

#[utoipa::path(
    get,
    path = "/v1/requests/{id}",
    tag = "requests",
    params(("id" = String, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Request detail", body = RequestDetailResponse),
        (status = 404, description = "Request not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_request(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RequestDetailResponse>, ApiError> {
    let now = Utc::now();
    // Direct lookup serves any stored status, expired or not; only the feeds
    // filter.
    let request = load_request(&state, &id).await?;
    Ok(Json(RequestDetailResponse {
        expired: lifecycle::is_expired(Some(request.expires_at), now),
        days_remaining: lifecycle::days_remaining(Some(request.expires_at), now),
        request,
    }))
}

#[utoipa::path(
    patch,
    path = "/v1/requests/{id}",
    tag = "requests",
    params(("id" = String, Path, description = "Request identifier")),
    request_body = RequestUpdateRequest,
    responses(
        (status = 200, description = "Request updated", body = Request),
        (status = 403, description = "Caller is not the owner", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Request is not active", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_request(
    Path(id): Path<String>,
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<RequestUpdateRequest>,
) -> Result<Json<Request>, ApiError> {
    let now = Utc::now();
    let mut request = load_request(&state, &id).await?;
    ensure_owner(&request.owner_id, &identity)?;
    ensure_active(&request)?;

    if let Some(title) = body.title {
        if title.trim().is_empty() {
            return Err(api_validation_error("title must not be empty"));
        }
        request.title = title;
    }
    if let Some(description) = body.description {
        request.description = description;
    }
    if let Some(category) = body.category {
        request.category = category;
    }
    if let Some(location) = body.location {
        request.location = location;
    }
    if let Some(expires_at) = body.expires_at {
        if expires_at <= now {
            return Err(api_validation_error("expiry must be in the future"));
        }
        request.expires_at = expires_at;
    }
    if let Some(urgency) = body.urgency {
        request.urgency = urgency;
    }
    if let Some(budget) = body.budget {
        if budget.min > budget.max {
            return Err(api_validation_error("budget minimum exceeds maximum"));
        }
        request.budget = Some(budget);
    }

    let doc = encode_doc(&request)?;
    state
        .store
        .set(&keys::request(&id), doc)
        .await
        .map_err(|err| api_internal("failed to update request", &err))?;
    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/v1/requests/{id}/fulfill",
    tag = "requests",
    params(("id" = String, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Request fulfilled", body = Request),
        (status = 403, description = "Caller is not the owner", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Request is not active", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn fulfill_request(
    Path(id): Path<String>,
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Request>, ApiError> {
    let mut request = load_request(&state, &id).await?;
    ensure_owner(&request.owner_id, &identity)?;
    ensure_active(&request)?;

    // Terminal for accepting new responses; existing responses stay.
    request.status = RequestStatus::Fulfilled;
    let doc = encode_doc(&request)?;
    state
        .store
        .set(&keys::request(&id), doc)
        .await
        .map_err(|err| api_internal("failed to update request", &err))?;

    notify(
        state.store.as_ref(),
        identity.as_str(),
        NotificationKind::RequestFulfilled,
        "Request fulfilled",
        &format!("\"{}\" was marked as fulfilled", request.title),
        Some(&request.id),
    )
    .await;
    metrics::counter!("exchange_request_ops_total", "op" => "fulfilled").increment(1);
    Ok(Json(request))
}

#[utoipa::path(
    delete,
    path = "/v1/requests/{id}",
    tag = "requests",
    params(("id" = String, Path, description = "Request identifier")),
    responses(
        (status = 204, description = "Request deleted"),
        (status = 403, description = "Caller is not the owner", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Request is not active", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_request(
    Path(id): Path<String>,
    State(state): State<AppState>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    let mut request = load_request(&state, &id).await?;
    ensure_owner(&request.owner_id, &identity)?;
    ensure_active(&request)?;

    // Soft delete on the primary first: the document stays retrievable by ID
    // with status `deleted` while the feeds and index stop showing it.
    request.status = RequestStatus::Deleted;
    let doc = encode_doc(&request)?;
    state
        .store
        .set(&keys::request(&id), doc)
        .await
        .map_err(|err| api_internal("failed to delete request", &err))?;

    // Cascade: remove every child response. Individual failures are logged
    // and skipped so a retried delete can finish the job.
    let children = state
        .store
        .scan_by_prefix(&keys::response_prefix(&id))
        .await
        .map_err(|err| api_internal("failed to scan responses", &err))?;
    for child in children {
        let Some(response) = decode_doc::<RequestResponse>(child) else {
            continue;
        };
        index::best_effort(
            "response_cascade",
            state
                .store
                .delete(&keys::response(&id, &response.id))
                .await,
        );
    }

    index::best_effort(
        "request_index",
        index::remove(
            state.store.as_ref(),
            &keys::user_request_index(identity.as_str()),
            &id,
        )
        .await,
    );
    notify(
        state.store.as_ref(),
        identity.as_str(),
        NotificationKind::RequestDeleted,
        "Request removed",
        &format!("\"{}\" was removed", request.title),
        Some(&id),
    )
    .await;
    metrics::counter!("exchange_request_ops_total", "op" => "deleted").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/requests/{id}/responses",
    tag = "requests",
    params(("id" = String, Path, description = "Request identifier")),
    request_body = ResponseCreateRequest,
    responses(
        (status = 201, description = "Response added", body = RequestResponse),
        (status = 400, description = "Validation failed", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Responding to own or non-active request", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn add_response(
    Path(id): Path<String>,
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<ResponseCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.message.trim().is_empty() {
        return Err(api_validation_error("message must not be empty"));
    }
    // All guards run before any write.
    let request = load_request(&state, &id).await?;
    ensure_active(&request)?;
    if request.owner_id == identity.as_str() {
        return Err(api_conflict("own_request", "cannot respond to own request"));
    }

    let response = RequestResponse {
        id: Uuid::new_v4().to_string(),
        request_id: id.clone(),
        responder_id: identity.as_str().to_string(),
        message: body.message,
        created_at: Utc::now(),
    };
    let doc = encode_doc(&response)?;
    state
        .store
        .set(&keys::response(&id, &response.id), doc)
        .await
        .map_err(|err| api_internal("failed to add response", &err))?;

    // Counter increment: re-read the parent so concurrent responders at
    // least see each other's committed writes, then +1 and write back. The
    // window between read and write is the documented lost-update race. A
    // failure here is swallowed; the response document is already durable.
    index::best_effort(
        "response_count",
        increment_response_count(&state, &id).await,
    );

    notify(
        state.store.as_ref(),
        &request.owner_id,
        NotificationKind::ResponseReceived,
        "New response",
        &format!("Someone responded to \"{}\"", request.title),
        Some(&id),
    )
    .await;
    metrics::counter!("exchange_request_ops_total", "op" => "response_added").increment(1);
    Ok((StatusCode::CREATED, Json(response)))
}

async fn increment_response_count(
    state: &AppState,
    request_id: &str,
) -> crate::store::StoreResult<()> {
    let key = keys::request(request_id);
    let Some(doc) = state.store.get(&key).await? else {
        return Ok(());
    };
    let Ok(mut request) = serde_json::from_value::<Request>(doc) else {
        return Ok(());
    };
    request.response_count += 1;
    let doc = serde_json::to_value(&request)
        .map_err(|err| crate::store::StoreError::Unexpected(err.into()))?;
    state.store.set(&key, doc).await
}

#[utoipa::path(
    get,
    path = "/v1/requests/{id}/responses",
    tag = "requests",
    params(("id" = String, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Responses for the request", body = ResponseListResponse),
        (status = 404, description = "Request not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_responses(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ResponseListResponse>, ApiError> {
    load_request(&state, &id).await?;
    let docs = state
        .store
        .scan_by_prefix(&keys::response_prefix(&id))
        .await
        .map_err(|err| api_internal("failed to list responses", &err))?;
    let mut items: Vec<RequestResponse> =
        docs.into_iter().filter_map(decode_doc::<RequestResponse>).collect();
    items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(Json(ResponseListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/requests/{id}/recount",
    tag = "requests",
    params(("id" = String, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Counter rebuilt from children", body = RecountResponse),
        (status = 403, description = "Caller is not the owner", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn recount_responses(
    Path(id): Path<String>,
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<RecountResponse>, ApiError> {
    let mut request = load_request(&state, &id).await?;
    ensure_owner(&request.owner_id, &identity)?;

    // Ground truth is the child set; this is the only path that recomputes.
    let children = state
        .store
        .scan_by_prefix(&keys::response_prefix(&id))
        .await
        .map_err(|err| api_internal("failed to scan responses", &err))?;
    let count = children
        .into_iter()
        .filter_map(decode_doc::<RequestResponse>)
        .count() as u64;

    request.response_count = count;
    let doc = encode_doc(&request)?;
    state
        .store
        .set(&keys::request(&id), doc)
        .await
        .map_err(|err| api_internal("failed to update request", &err))?;
    Ok(Json(RecountResponse {
        response_count: count,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/requests",
    tag = "requests",
    params(("user_id" = String, Path, description = "Owner identifier")),
    responses(
        (status = 200, description = "Requests owned by the user", body = RequestListResponse)
    )
)]
pub(crate) async fn user_requests(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RequestListResponse>, ApiError> {
    let ids = index::read(state.store.as_ref(), &keys::user_request_index(&user_id))
        .await
        .map_err(|err| api_internal("failed to read request index", &err))?;

    let mut items = Vec::with_capacity(ids.len());
    for id in ids {
        let doc = state
            .store
            .get(&keys::request(&id))
            .await
            .map_err(|err| api_internal("failed to load request", &err))?;
        if let Some(request) = doc.and_then(decode_doc::<Request>) {
            items.push(request);
        }
    }
    Ok(Json(RequestListResponse { items }))
}
