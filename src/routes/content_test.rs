use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;

use crate::routes::test_helpers::*;
use crate::state::test_helpers::{seeded_app_state, unconfigured_app_state};

#[tokio::test]
async fn content_without_backend_is_builtin() {
    let app = test_router(unconfigured_app_state());
    let (status, headers, body) = send(&app, request("GET", "/api/content", false, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[CACHE_CONTROL], "no-store");
    assert_eq!(body["settings"]["brand_name"], "AURENIX");
    assert_eq!(body["nav_links"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn content_reflects_admin_edits_immediately() {
    let app = test_router(seeded_app_state().await);
    let (_, list) = call(&app, "GET", "/api/admin/features", None).await;
    let id = list[0]["id"].as_str().unwrap().to_owned();

    let (status, _) = call(
        &app,
        "PATCH",
        &format!("/api/admin/features/{id}"),
        Some(serde_json::json!({ "heading": "Edited" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = send(&app, request("GET", "/api/content", false, None)).await;
    assert_eq!(body["features"][0]["heading"], "Edited");
}

#[tokio::test]
async fn content_is_public() {
    let app = test_router(seeded_app_state().await);
    let (status, _, body) = send(&app, request("GET", "/api/content", false, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pricing_tiers"][1]["highlighted"], true);
}
