//! HTTP API request/response types.
//!
//! # Purpose
//! Defines shared payload shapes for the marketplace REST API and OpenAPI
//! schema generation.
use crate::model::{
    BudgetRange, Category, Listing, Notification, NotificationKind, Request, RequestResponse,
    Urgency,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SystemInfo {
    pub api_version: String,
    pub backend: String,
    pub durable_storage: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ListingCreateRequest {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub location: String,
    pub price: Option<f64>,
    pub images: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct ListingUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ListingListResponse {
    pub items: Vec<Listing>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ListingDetailResponse {
    pub listing: Listing,
    /// Computed at read time; the stored status is never flipped by expiry.
    pub expired: bool,
    pub days_remaining: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RequestCreateRequest {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub location: String,
    pub expires_at: DateTime<Utc>,
    pub urgency: Urgency,
    pub budget: Option<BudgetRange>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct RequestUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub location: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub urgency: Option<Urgency>,
    pub budget: Option<BudgetRange>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RequestListResponse {
    pub items: Vec<Request>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RequestDetailResponse {
    pub request: Request,
    pub expired: bool,
    pub days_remaining: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ResponseCreateRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ResponseListResponse {
    pub items: Vec<RequestResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RecountResponse {
    pub response_count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct NotificationCreateRequest {
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct NotificationListResponse {
    pub items: Vec<Notification>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ReadAllResponse {
    pub updated: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SavedListResponse {
    pub items: Vec<Listing>,
}
