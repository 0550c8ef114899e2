//! OpenAPI schema aggregation for the marketplace API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document for
//! docs and client generation.
use crate::api::{
    listings, notifications, requests, saved, system,
    types::{
        ErrorResponse, HealthStatus, ListingCreateRequest, ListingDetailResponse,
        ListingListResponse, ListingUpdateRequest, NotificationCreateRequest,
        NotificationListResponse, ReadAllResponse, RecountResponse, RequestCreateRequest,
        RequestDetailResponse, RequestListResponse, RequestUpdateRequest, ResponseCreateRequest,
        ResponseListResponse, SavedListResponse, SystemInfo,
    },
};
use crate::model::{
    BudgetRange, Category, Listing, ListingStatus, Notification, NotificationKind, Request,
    RequestResponse, RequestStatus, SavedItem, Urgency,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "exchange",
        version = "v1",
        description = "Marketplace listing/request persistence and indexing API"
    ),
    paths(
        system::system_info,
        system::system_health,
        listings::create_listing,
        listings::list_listings,
        listings::get_listing,
        listings::update_listing,
        listings::acquire_listing,
        listings::delete_listing,
        listings::user_listings,
        saved::save_listing,
        saved::unsave_listing,
        saved::list_saved,
        requests::create_request,
        requests::list_requests,
        requests::get_request,
        requests::update_request,
        requests::fulfill_request,
        requests::delete_request,
        requests::add_response,
        requests::list_responses,
        requests::recount_responses,
        requests::user_requests,
        notifications::list_notifications,
        notifications::create_notification,
        notifications::mark_read,
        notifications::read_all,
        notifications::delete_notification
    ),
    components(schemas(
        ErrorResponse,
        SystemInfo,
        HealthStatus,
        Category,
        Listing,
        ListingStatus,
        ListingCreateRequest,
        ListingUpdateRequest,
        ListingListResponse,
        ListingDetailResponse,
        SavedItem,
        SavedListResponse,
        Request,
        RequestStatus,
        Urgency,
        BudgetRange,
        RequestCreateRequest,
        RequestUpdateRequest,
        RequestListResponse,
        RequestDetailResponse,
        RequestResponse,
        ResponseCreateRequest,
        ResponseListResponse,
        RecountResponse,
        Notification,
        NotificationKind,
        NotificationCreateRequest,
        NotificationListResponse,
        ReadAllResponse
    )),
    tags(
        (name = "system", description = "System and health endpoints"),
        (name = "listings", description = "Material listings"),
        (name = "saved", description = "Saved-item bookmarks"),
        (name = "requests", description = "Material requests and responses"),
        (name = "notifications", description = "Recipient-owned notifications")
    )
)]
pub struct ApiDoc;
