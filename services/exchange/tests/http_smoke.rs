mod common;

use axum::body::Body;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::read_json;
use exchange::app::{AppState, build_router};
use exchange::config::{DEFAULT_FEED_LIMIT, DEFAULT_INDEX_CAP};
use exchange::store::memory::MemoryStore;
use exchange::store::{EntityStore, keys};
use http_helpers::{auth_json_request, auth_request, get_request, json_request};
use std::sync::Arc;
use tower::ServiceExt;

type App = axum::routing::RouterIntoService<Body, ()>;

fn test_app() -> (App, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        api_version: "v1".to_string(),
        store: store.clone(),
        index_cap: DEFAULT_INDEX_CAP,
        feed_limit: DEFAULT_FEED_LIMIT,
    };
    (build_router(state).into_service(), store)
}

fn listing_body(title: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "Leftover from a renovation",
        "category": "wood",
        "location": "Depot 4",
        "price": 25.0,
        "images": ["https://img.example/1.jpg"],
        "expires_at": null
    })
}

#[tokio::test]
async fn listings_crud_smoke() {
    let (app, _store) = test_app();

    let response = app
        .clone()
        .oneshot(auth_json_request(
            "POST",
            "/v1/listings",
            "u1",
            listing_body("Oak boards"),
        ))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    let id = created["id"].as_str().expect("id").to_string();
    assert_eq!(created["owner_id"], "u1");
    assert_eq!(created["status"], "active");
    assert_eq!(created["is_acquired"], false);
    assert_eq!(created["view_count"], 0);

    let response = app
        .clone()
        .oneshot(get_request("/v1/listings"))
        .await
        .expect("feed");
    assert_eq!(response.status(), StatusCode::OK);
    let feed = read_json(response).await;
    assert_eq!(feed["items"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/v1/listings/{id}")))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::OK);
    let detail = read_json(response).await;
    assert_eq!(detail["listing"]["id"], id.as_str());
    assert_eq!(detail["expired"], false);
    assert_eq!(detail["days_remaining"], serde_json::Value::Null);
    assert_eq!(detail["listing"]["view_count"], 1);

    let response = app
        .clone()
        .oneshot(auth_json_request(
            "PATCH",
            &format!("/v1/listings/{id}"),
            "u1",
            serde_json::json!({ "title": "Reclaimed oak boards" }),
        ))
        .await
        .expect("patch");
    assert_eq!(response.status(), StatusCode::OK);
    let updated = read_json(response).await;
    assert_eq!(updated["title"], "Reclaimed oak boards");

    let response = app
        .clone()
        .oneshot(auth_json_request(
            "PATCH",
            &format!("/v1/listings/{id}"),
            "u2",
            serde_json::json!({ "title": "hijack" }),
        ))
        .await
        .expect("patch as non-owner");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(auth_request("GET", "/v1/users/u1/listings", "u1"))
        .await
        .expect("user listings");
    let mine = read_json(response).await;
    assert_eq!(mine["items"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(auth_request("DELETE", &format!("/v1/listings/{id}"), "u1"))
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/v1/listings/{id}")))
        .await
        .expect("get deleted");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(auth_request("GET", "/v1/users/u1/listings", "u1"))
        .await
        .expect("user listings after delete");
    let mine = read_json(response).await;
    assert!(mine["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn acquire_keeps_status_and_flag_in_lockstep() {
    let (app, _store) = test_app();

    let response = app
        .clone()
        .oneshot(auth_json_request(
            "POST",
            "/v1/listings",
            "u1",
            listing_body("Steel beams"),
        ))
        .await
        .expect("create");
    let created = read_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "active");
    assert_eq!(created["is_acquired"], false);

    let response = app
        .clone()
        .oneshot(auth_request(
            "POST",
            &format!("/v1/listings/{id}/acquire"),
            "u1",
        ))
        .await
        .expect("acquire");
    assert_eq!(response.status(), StatusCode::OK);
    let acquired = read_json(response).await;
    assert_eq!(acquired["status"], "acquired");
    assert_eq!(acquired["is_acquired"], true);

    // Second acquire conflicts and changes nothing.
    let response = app
        .clone()
        .oneshot(auth_request(
            "POST",
            &format!("/v1/listings/{id}/acquire"),
            "u1",
        ))
        .await
        .expect("second acquire");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json(response).await;
    assert_eq!(body["code"], "already_acquired");

    // Edits after acquire do not disturb the pair.
    let response = app
        .clone()
        .oneshot(auth_json_request(
            "PATCH",
            &format!("/v1/listings/{id}"),
            "u1",
            serde_json::json!({ "description": "gone" }),
        ))
        .await
        .expect("patch");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/v1/listings/{id}")))
        .await
        .expect("get");
    let detail = read_json(response).await;
    let listing = &detail["listing"];
    assert_eq!(
        listing["is_acquired"] == serde_json::json!(true),
        listing["status"] == serde_json::json!("acquired")
    );
    assert_eq!(listing["status"], "acquired");

    // Acquired listings leave the active feed.
    let response = app
        .clone()
        .oneshot(get_request("/v1/listings"))
        .await
        .expect("feed");
    let feed = read_json(response).await;
    assert!(feed["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn create_listing_without_images_writes_nothing() {
    let (app, store) = test_app();

    let mut body = listing_body("No photos");
    body["images"] = serde_json::json!([]);
    let response = app
        .clone()
        .oneshot(auth_json_request("POST", "/v1/listings", "u1", body))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = read_json(response).await;
    assert_eq!(error["code"], "validation_error");

    // Rejected before any write: no primary, no index entry.
    let primaries = store.scan_by_prefix(keys::LISTING_PREFIX).await.expect("scan");
    assert!(primaries.is_empty());
    let index = store
        .get(&keys::user_listing_index("u1"))
        .await
        .expect("index get");
    assert!(index.is_none());
}

#[tokio::test]
async fn create_listing_validation_errors() {
    let (app, _store) = test_app();

    let mut body = listing_body("Too many photos");
    body["images"] = serde_json::json!([
        "https://img/1", "https://img/2", "https://img/3",
        "https://img/4", "https://img/5", "https://img/6"
    ]);
    let response = app
        .clone()
        .oneshot(auth_json_request("POST", "/v1/listings", "u1", body))
        .await
        .expect("six images");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut body = listing_body("  ");
    body["title"] = serde_json::json!("   ");
    let response = app
        .clone()
        .oneshot(auth_json_request("POST", "/v1/listings", "u1", body))
        .await
        .expect("blank title");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut body = listing_body("Negative price");
    body["price"] = serde_json::json!(-4.0);
    let response = app
        .clone()
        .oneshot(auth_json_request("POST", "/v1/listings", "u1", body))
        .await
        .expect("negative price");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut body = listing_body("Expired on arrival");
    body["expires_at"] = serde_json::json!((Utc::now() - Duration::days(1)).to_rfc3339());
    let response = app
        .clone()
        .oneshot(auth_json_request("POST", "/v1/listings", "u1", body))
        .await
        .expect("past expiry");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Mutating routes require an identity.
    let response = app
        .clone()
        .oneshot(json_request("POST", "/v1/listings", listing_body("Anon")))
        .await
        .expect("no identity");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_listing_leaves_feed_but_not_storage() {
    let (app, store) = test_app();

    // Seed a stored-active listing whose expiry has already passed, as
    // another client instance could have written it.
    let doc = serde_json::json!({
        "id": "l-expired",
        "owner_id": "u1",
        "title": "Old pallets",
        "description": "",
        "category": "wood",
        "location": "Depot 4",
        "price": null,
        "images": ["https://img/1"],
        "created_at": (Utc::now() - Duration::days(30)).to_rfc3339(),
        "expires_at": (Utc::now() - Duration::days(2)).to_rfc3339(),
        "status": "active",
        "is_acquired": false,
        "view_count": 0,
        "inquiry_count": 0
    });
    store
        .set(&keys::listing("l-expired"), doc)
        .await
        .expect("seed");

    let response = app
        .clone()
        .oneshot(get_request("/v1/listings"))
        .await
        .expect("feed");
    let feed = read_json(response).await;
    assert!(feed["items"].as_array().unwrap().is_empty());

    // Direct lookup still serves it, flagged expired, stored status intact.
    let response = app
        .clone()
        .oneshot(get_request("/v1/listings/l-expired"))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::OK);
    let detail = read_json(response).await;
    assert_eq!(detail["expired"], true);
    assert_eq!(detail["days_remaining"], 0);
    assert_eq!(detail["listing"]["status"], "active");

    let stored = store
        .get(&keys::listing("l-expired"))
        .await
        .expect("get")
        .expect("present");
    assert_eq!(stored["status"], "active");
}

#[tokio::test]
async fn feed_filters_by_category_and_location() {
    let (app, _store) = test_app();

    let mut body = listing_body("Copper pipe");
    body["category"] = serde_json::json!("metal");
    let response = app
        .clone()
        .oneshot(auth_json_request("POST", "/v1/listings", "u1", body))
        .await
        .expect("create metal");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(auth_json_request(
            "POST",
            "/v1/listings",
            "u1",
            listing_body("Oak boards"),
        ))
        .await
        .expect("create wood");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get_request("/v1/listings?category=metal"))
        .await
        .expect("filter");
    let feed = read_json(response).await;
    let items = feed["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Copper pipe");

    let response = app
        .clone()
        .oneshot(get_request("/v1/listings?location=depot"))
        .await
        .expect("location filter");
    let feed = read_json(response).await;
    assert_eq!(feed["items"].as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(get_request("/v1/listings?location=elsewhere"))
        .await
        .expect("location miss");
    let feed = read_json(response).await;
    assert!(feed["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn saved_items_roundtrip_and_skip_dangling() {
    let (app, _store) = test_app();

    let response = app
        .clone()
        .oneshot(auth_json_request(
            "POST",
            "/v1/listings",
            "u1",
            listing_body("Window frames"),
        ))
        .await
        .expect("create");
    let created = read_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(auth_request("PUT", &format!("/v1/listings/{id}/save"), "u2"))
        .await
        .expect("save");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Saving twice is idempotent: still one bookmark.
    let response = app
        .clone()
        .oneshot(auth_request("PUT", &format!("/v1/listings/{id}/save"), "u2"))
        .await
        .expect("save again");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(auth_request("GET", "/v1/saved", "u2"))
        .await
        .expect("list saved");
    let saved = read_json(response).await;
    assert_eq!(saved["items"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(auth_request("PUT", "/v1/listings/missing/save", "u2"))
        .await
        .expect("save missing");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Owner deletes the listing; the dangling bookmark is skipped on read.
    let response = app
        .clone()
        .oneshot(auth_request("DELETE", &format!("/v1/listings/{id}"), "u1"))
        .await
        .expect("delete listing");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(auth_request("GET", "/v1/saved", "u2"))
        .await
        .expect("list saved after delete");
    let saved = read_json(response).await;
    assert!(saved["items"].as_array().unwrap().is_empty());

    let response = app
        .clone()
        .oneshot(auth_request(
            "DELETE",
            &format!("/v1/listings/{id}/save"),
            "u2",
        ))
        .await
        .expect("unsave");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn notification_routes_are_recipient_scoped() {
    let (app, _store) = test_app();

    // Creating a listing fans out a notification to the owner.
    let response = app
        .clone()
        .oneshot(auth_json_request(
            "POST",
            "/v1/listings",
            "u1",
            listing_body("Brick pile"),
        ))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(auth_request("GET", "/v1/notifications", "u1"))
        .await
        .expect("list");
    let notifications = read_json(response).await;
    let items = notifications["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["kind"], "listing_created");
    assert_eq!(items[0]["is_read"], false);
    let notification_id = items[0]["id"].as_str().unwrap().to_string();

    // Another user sees nothing.
    let response = app
        .clone()
        .oneshot(auth_request("GET", "/v1/notifications", "u2"))
        .await
        .expect("list other");
    let notifications = read_json(response).await;
    assert!(notifications["items"].as_array().unwrap().is_empty());

    // A recipient cannot mark someone else's notification read; key scoping
    // turns the attempt into not-found.
    let response = app
        .clone()
        .oneshot(auth_request(
            "POST",
            &format!("/v1/notifications/{notification_id}/read"),
            "u2",
        ))
        .await
        .expect("foreign mark read");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(auth_request(
            "POST",
            &format!("/v1/notifications/{notification_id}/read"),
            "u1",
        ))
        .await
        .expect("mark read");
    assert_eq!(response.status(), StatusCode::OK);
    let marked = read_json(response).await;
    assert_eq!(marked["is_read"], true);

    let response = app
        .clone()
        .oneshot(auth_request("GET", "/v1/notifications?unread_only=true", "u1"))
        .await
        .expect("unread only");
    let notifications = read_json(response).await;
    assert!(notifications["items"].as_array().unwrap().is_empty());

    let response = app
        .clone()
        .oneshot(auth_json_request(
            "POST",
            "/v1/notifications",
            "u1",
            serde_json::json!({
                "recipient_id": "u2",
                "kind": "response_received",
                "title": "Manual ping",
                "message": "check this request",
                "related_id": null
            }),
        ))
        .await
        .expect("create notification");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(auth_request("POST", "/v1/notifications/read-all", "u2"))
        .await
        .expect("read all");
    let result = read_json(response).await;
    assert_eq!(result["updated"], 1);

    let response = app
        .clone()
        .oneshot(auth_request(
            "DELETE",
            &format!("/v1/notifications/{notification_id}"),
            "u1",
        ))
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(auth_request(
            "DELETE",
            &format!("/v1/notifications/{notification_id}"),
            "u1",
        ))
        .await
        .expect("delete again");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn system_endpoints_report_backend() {
    let (app, _store) = test_app();

    let response = app
        .clone()
        .oneshot(get_request("/v1/system/info"))
        .await
        .expect("info");
    assert_eq!(response.status(), StatusCode::OK);
    let info = read_json(response).await;
    assert_eq!(info["api_version"], "v1");
    assert_eq!(info["backend"], "memory");
    assert_eq!(info["durable_storage"], false);

    let response = app
        .clone()
        .oneshot(get_request("/v1/system/health"))
        .await
        .expect("health");
    assert_eq!(response.status(), StatusCode::OK);
    let health = read_json(response).await;
    assert_eq!(health["status"], "ok");
}
