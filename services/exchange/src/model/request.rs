//! Request document: a material wanted, plus the responses offered against it.
use super::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Request {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub location: String,
    /// Required and strictly in the future at creation.
    pub expires_at: DateTime<Utc>,
    pub status: RequestStatus,
    pub urgency: Urgency,
    pub budget: Option<BudgetRange>,
    /// Denormalized count of `request_response:<id>:*` documents, maintained
    /// by increment-on-write. Under concurrent responses the non-atomic
    /// read-modify-write can lose updates; `recount` rebuilds it from the
    /// children.
    pub response_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Active,
    Fulfilled,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Normal,
    High,
}

impl Urgency {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
}

/// An offer made against a request by a user other than its owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RequestResponse {
    pub id: String,
    pub request_id: String,
    pub responder_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
