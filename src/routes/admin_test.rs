use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::routes::test_helpers::*;
use crate::state::AppState;
use crate::state::test_helpers::{MockAuth, seeded_app_state, test_app_state};

fn labels(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["label"].as_str().unwrap().to_owned())
        .collect()
}

fn indices(list: &Value) -> Vec<i64> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["order_index"].as_i64().unwrap())
        .collect()
}

async fn seed_abc(app: &axum::Router) -> Vec<String> {
    let mut ids = Vec::new();
    for label in ["A", "B", "C"] {
        let (status, body) = call(app, "POST", "/api/admin/nav", Some(json!({ "label": label, "href": "#" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["id"].as_str().unwrap().to_owned());
    }
    ids
}

#[tokio::test]
async fn list_returns_records_in_order() {
    let app = test_router(seeded_app_state().await);
    let (status, body) = call(&app, "GET", "/api/admin/nav", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(indices(&body), [0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn empty_body_creates_from_template() {
    let app = test_router(seeded_app_state().await);
    let (status, body) = call(&app, "POST", "/api/admin/pricing", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "New Tier");
    assert_eq!(body["order_index"], 3);
}

#[tokio::test]
async fn gallery_requires_explicit_fields() {
    let app = test_router(test_app_state());
    let (status, body) = call(&app, "POST", "/api/admin/gallery", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "E_INVALID_RECORD");

    let item = json!({ "media_type": "video", "media_url": "https://cdn.example.com/a.mp4" });
    let (status, body) = call(&app, "POST", "/api/admin/gallery", Some(item)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], Value::Null);
}

#[tokio::test]
async fn malformed_create_body_is_bad_request() {
    let app = test_router(test_app_state());
    let (status, body) = call(&app, "POST", "/api/admin/nav", Some(json!({ "label": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E_BAD_REQUEST");
}

#[tokio::test]
async fn patch_updates_fields() {
    let app = test_router(test_app_state());
    let ids = seed_abc(&app).await;

    let (status, _) = call(&app, "PATCH", &format!("/api/admin/nav/{}", ids[1]), Some(json!({ "label": "Bee" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = call(&app, "GET", "/api/admin/nav", None).await;
    assert_eq!(labels(&list), ["A", "Bee", "C"]);
}

#[tokio::test]
async fn patch_cannot_touch_order_index() {
    let app = test_router(test_app_state());
    let ids = seed_abc(&app).await;

    let (status, body) =
        call(&app, "PATCH", &format!("/api/admin/nav/{}", ids[0]), Some(json!({ "order_index": 2 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "E_INVALID_FIELD");
}

#[tokio::test]
async fn patch_unknown_id_is_not_found() {
    let app = test_router(test_app_state());
    let path = format!("/api/admin/nav/{}", uuid::Uuid::new_v4());
    let (status, _) = call(&app, "PATCH", &path, Some(json!({ "label": "x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, "PATCH", &path, Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E_NOT_FOUND");
}

#[tokio::test]
async fn delete_requires_confirmation() {
    let app = test_router(test_app_state());
    let ids = seed_abc(&app).await;

    let (status, body) = call(&app, "DELETE", &format!("/api/admin/nav/{}", ids[1]), None).await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);
    assert_eq!(body["code"], "E_CONFIRMATION_REQUIRED");

    let (status, _) = call(&app, "DELETE", &format!("/api/admin/nav/{}?confirm=false", ids[1]), None).await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);

    let (_, list) = call(&app, "GET", "/api/admin/nav", None).await;
    assert_eq!(labels(&list), ["A", "B", "C"]);
}

#[tokio::test]
async fn confirmed_delete_compacts() {
    let app = test_router(test_app_state());
    let ids = seed_abc(&app).await;

    let (status, _) = call(&app, "DELETE", &format!("/api/admin/nav/{}?confirm=true", ids[0]), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = call(&app, "GET", "/api/admin/nav", None).await;
    assert_eq!(labels(&list), ["B", "C"]);
    assert_eq!(indices(&list), [0, 1]);
}

#[tokio::test]
async fn reorder_moves_record() {
    let app = test_router(test_app_state());
    seed_abc(&app).await;

    let (status, body) = call(&app, "POST", "/api/admin/nav/reorder", Some(json!({ "index": 2, "direction": -1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(labels(&body), ["A", "C", "B"]);
    assert_eq!(indices(&body), [0, 1, 2]);

    let (_, list) = call(&app, "GET", "/api/admin/nav", None).await;
    assert_eq!(labels(&list), ["A", "C", "B"]);
}

#[tokio::test]
async fn reorder_past_the_end_is_noop() {
    let app = test_router(test_app_state());
    seed_abc(&app).await;

    let (status, body) = call(&app, "POST", "/api/admin/nav/reorder", Some(json!({ "index": 0, "direction": -1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(labels(&body), ["A", "B", "C"]);
}

#[tokio::test]
async fn reorder_rejects_bad_direction() {
    let app = test_router(test_app_state());
    seed_abc(&app).await;
    let (status, _) = call(&app, "POST", "/api/admin/nav/reorder", Some(json!({ "index": 0, "direction": 2 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn without_backend_lists_defaults_and_refuses_writes() {
    let app = test_router(AppState::new(None, Some(Arc::new(MockAuth)), None));

    let (status, body) = call(&app, "GET", "/api/admin/features", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, body) = call(&app, "POST", "/api/admin/features", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "E_NOT_CONFIGURED");
}
