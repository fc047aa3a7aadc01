use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::routes::test_helpers::*;
use crate::state::test_helpers::{seeded_app_state, test_app_state};

#[tokio::test]
async fn load_returns_stored_settings() {
    let app = test_router(seeded_app_state().await);
    let (status, body) = call(&app, "GET", "/api/admin/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["settings"]["brand_name"], "AURENIX");
    assert!(body["settings"]["id"].is_string());
}

#[tokio::test]
async fn load_before_first_save_is_null() {
    let app = test_router(test_app_state());
    let (status, body) = call(&app, "GET", "/api/admin/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["settings"], Value::Null);
}

#[tokio::test]
async fn save_without_id_inserts_then_save_with_id_updates() {
    let app = test_router(test_app_state());

    let (status, body) = call(&app, "PUT", "/api/admin/settings", Some(json!({ "brand_name": "Acme" }))).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap().to_owned();

    let (status, body) =
        call(&app, "PUT", "/api/admin/settings", Some(json!({ "id": id, "tagline": "Made well" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());

    let (_, body) = call(&app, "GET", "/api/admin/settings", None).await;
    assert_eq!(body["settings"]["id"], id.as_str());
    assert_eq!(body["settings"]["brand_name"], "Acme");
    assert_eq!(body["settings"]["tagline"], "Made well");
    assert!(body["settings"]["updated_at"].is_string());
}

#[tokio::test]
async fn save_rejects_unknown_field() {
    let app = test_router(test_app_state());
    let (status, body) = call(&app, "PUT", "/api/admin/settings", Some(json!({ "logo": "x.png" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "E_INVALID_FIELD");
}

#[tokio::test]
async fn save_with_stale_id_is_not_found() {
    let app = test_router(test_app_state());
    let body = json!({ "id": uuid::Uuid::new_v4(), "brand_name": "Acme" });
    let (status, _) = call(&app, "PUT", "/api/admin/settings", Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
