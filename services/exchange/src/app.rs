//! HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! This module centralizes route composition to keep `main` small and testable.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::observability;
use crate::store::EntityStore;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub api_version: String,
    pub store: Arc<dyn EntityStore>,
    /// Maximum IDs retained per per-owner index; older entries truncate off.
    pub index_cap: usize,
    /// Maximum items a feed endpoint returns.
    pub feed_limit: usize,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route(
            "/v1/system/info",
            axum::routing::get(api::system::system_info),
        )
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/v1/listings",
            axum::routing::get(api::listings::list_listings)
                .post(api::listings::create_listing),
        )
        .route(
            "/v1/listings/:id",
            axum::routing::get(api::listings::get_listing)
                .patch(api::listings::update_listing)
                .delete(api::listings::delete_listing),
        )
        .route(
            "/v1/listings/:id/acquire",
            axum::routing::post(api::listings::acquire_listing),
        )
        .route(
            "/v1/listings/:id/save",
            axum::routing::put(api::saved::save_listing).delete(api::saved::unsave_listing),
        )
        .route("/v1/saved", axum::routing::get(api::saved::list_saved))
        .route(
            "/v1/users/:user_id/listings",
            axum::routing::get(api::listings::user_listings),
        )
        .route(
            "/v1/users/:user_id/requests",
            axum::routing::get(api::requests::user_requests),
        )
        .route(
            "/v1/requests",
            axum::routing::get(api::requests::list_requests)
                .post(api::requests::create_request),
        )
        .route(
            "/v1/requests/:id",
            axum::routing::get(api::requests::get_request)
                .patch(api::requests::update_request)
                .delete(api::requests::delete_request),
        )
        .route(
            "/v1/requests/:id/fulfill",
            axum::routing::post(api::requests::fulfill_request),
        )
        .route(
            "/v1/requests/:id/responses",
            axum::routing::get(api::requests::list_responses)
                .post(api::requests::add_response),
        )
        .route(
            "/v1/requests/:id/recount",
            axum::routing::post(api::requests::recount_responses),
        )
        .route(
            "/v1/notifications",
            axum::routing::get(api::notifications::list_notifications)
                .post(api::notifications::create_notification),
        )
        .route(
            "/v1/notifications/read-all",
            axum::routing::post(api::notifications::read_all),
        )
        .route(
            "/v1/notifications/:id/read",
            axum::routing::post(api::notifications::mark_read),
        )
        .route(
            "/v1/notifications/:id",
            axum::routing::delete(api::notifications::delete_notification),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}
