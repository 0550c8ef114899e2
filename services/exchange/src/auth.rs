//! Caller identity extraction.
//!
//! # Purpose
//! The authentication provider is an external collaborator: it validates the
//! bearer credential upstream and forwards the resulting opaque user id in
//! the `x-user-id` header. This module only materializes that id as a typed
//! extractor — no token parsing or validation happens in this service.
//!
//! # Usage
//! Mutating routes take `Identity` as an argument and get a 401 rejection for
//! free when the header is absent. Read routes simply omit the extractor.
use crate::api::error::{ApiError, api_unauthorized};
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub const IDENTITY_HEADER: &str = "x-user-id";

/// Opaque user id of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Identity(value.to_string()))
            .ok_or_else(|| api_unauthorized("caller identity missing"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Identity, ApiError> {
        let (mut parts, _) = request.into_parts();
        Identity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn header_present_yields_identity() {
        let request = Request::builder()
            .header(IDENTITY_HEADER, "user-42")
            .body(())
            .unwrap();
        let identity = extract(request).await.expect("identity");
        assert_eq!(identity.as_str(), "user-42");
    }

    #[tokio::test]
    async fn missing_or_blank_header_is_unauthorized() {
        let request = Request::builder().body(()).unwrap();
        let err = extract(request).await.expect_err("missing");
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .header(IDENTITY_HEADER, "   ")
            .body(())
            .unwrap();
        let err = extract(request).await.expect_err("blank");
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }
}
