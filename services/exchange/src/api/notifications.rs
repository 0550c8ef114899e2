//! Notification API handlers.
//!
//! # Purpose
//! Recipient-scoped notification routes. Keys embed the recipient id
//! (`notification:<recipient>:<id>`), so every route here builds keys from
//! the caller's identity and can only ever touch the caller's own documents.
use crate::api::error::{ApiError, api_internal, api_not_found, api_validation_error};
use crate::api::types::{NotificationCreateRequest, NotificationListResponse, ReadAllResponse};
use crate::api::{decode_doc, encode_doc};
use crate::app::AppState;
use crate::auth::Identity;
use crate::model::Notification;
use crate::store::keys;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/v1/notifications",
    tag = "notifications",
    params(
        ("unread_only" = Option<bool>, Query, description = "Only unread notifications")
    ),
    responses(
        (status = 200, description = "Caller's notifications", body = NotificationListResponse),
        (status = 401, description = "Caller identity missing", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_notifications(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let docs = state
        .store
        .scan_by_prefix(&keys::notification_prefix(identity.as_str()))
        .await
        .map_err(|err| api_internal("failed to list notifications", &err))?;

    let unread_only = params
        .get("unread_only")
        .is_some_and(|value| value == "true");
    let mut items: Vec<Notification> = docs
        .into_iter()
        .filter_map(decode_doc::<Notification>)
        .filter(|notification| !unread_only || !notification.is_read)
        .collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(NotificationListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/notifications",
    tag = "notifications",
    request_body = NotificationCreateRequest,
    responses(
        (status = 201, description = "Notification created", body = Notification),
        (status = 400, description = "Validation failed", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Caller identity missing", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_notification(
    State(state): State<AppState>,
    _identity: Identity,
    Json(body): Json<NotificationCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.recipient_id.trim().is_empty() {
        return Err(api_validation_error("recipient_id must not be empty"));
    }
    if body.title.trim().is_empty() {
        return Err(api_validation_error("title must not be empty"));
    }

    // Unlike the fanout side channel, this is the route's primary operation,
    // so store failures do surface to the caller.
    let notification = Notification {
        id: Uuid::new_v4().to_string(),
        recipient_id: body.recipient_id,
        kind: body.kind,
        title: body.title,
        message: body.message,
        related_id: body.related_id,
        is_read: false,
        created_at: Utc::now(),
    };
    let doc = encode_doc(&notification)?;
    state
        .store
        .set(
            &keys::notification(&notification.recipient_id, &notification.id),
            doc,
        )
        .await
        .map_err(|err| api_internal("failed to create notification", &err))?;
    Ok((StatusCode::CREATED, Json(notification)))
}

#[utoipa::path(
    post,
    path = "/v1/notifications/{id}/read",
    tag = "notifications",
    params(("id" = String, Path, description = "Notification identifier")),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 404, description = "Notification not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn mark_read(
    Path(id): Path<String>,
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Notification>, ApiError> {
    let key = keys::notification(identity.as_str(), &id);
    let doc = state
        .store
        .get(&key)
        .await
        .map_err(|err| api_internal("failed to load notification", &err))?
        .ok_or_else(|| api_not_found("notification not found"))?;
    let mut notification: Notification = serde_json::from_value(doc)
        .map_err(|_| api_not_found("notification not found"))?;

    notification.is_read = true;
    let doc = encode_doc(&notification)?;
    state
        .store
        .set(&key, doc)
        .await
        .map_err(|err| api_internal("failed to update notification", &err))?;
    Ok(Json(notification))
}

#[utoipa::path(
    post,
    path = "/v1/notifications/read-all",
    tag = "notifications",
    responses(
        (status = 200, description = "All notifications marked read", body = ReadAllResponse),
        (status = 401, description = "Caller identity missing", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn read_all(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<ReadAllResponse>, ApiError> {
    let docs = state
        .store
        .scan_by_prefix(&keys::notification_prefix(identity.as_str()))
        .await
        .map_err(|err| api_internal("failed to list notifications", &err))?;

    // One write per unread document; a failure mid-way leaves earlier marks
    // in place, and the count reports only what actually got written.
    let mut updated = 0u64;
    for doc in docs {
        let Some(mut notification) = decode_doc::<Notification>(doc) else {
            continue;
        };
        if notification.is_read {
            continue;
        }
        notification.is_read = true;
        let key = keys::notification(identity.as_str(), &notification.id);
        let doc = encode_doc(&notification)?;
        match state.store.set(&key, doc).await {
            Ok(()) => updated += 1,
            Err(err) => {
                tracing::warn!(error = %err, id = notification.id, "mark-read write failed");
            }
        }
    }
    Ok(Json(ReadAllResponse { updated }))
}

#[utoipa::path(
    delete,
    path = "/v1/notifications/{id}",
    tag = "notifications",
    params(("id" = String, Path, description = "Notification identifier")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "Notification not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_notification(
    Path(id): Path<String>,
    State(state): State<AppState>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    let key = keys::notification(identity.as_str(), &id);
    let exists = state
        .store
        .get(&key)
        .await
        .map_err(|err| api_internal("failed to load notification", &err))?
        .is_some();
    if !exists {
        return Err(api_not_found("notification not found"));
    }
    state
        .store
        .delete(&key)
        .await
        .map_err(|err| api_internal("failed to delete notification", &err))?;
    Ok(StatusCode::NO_CONTENT)
}
