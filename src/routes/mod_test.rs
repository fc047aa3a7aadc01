use super::test_helpers::*;
use super::*;
use crate::state::test_helpers::unconfigured_app_state;
use crate::store::BackendError;

#[test]
fn store_error_to_status_maps_every_kind() {
    assert_eq!(store_error_to_status(&StoreError::ConfigurationMissing), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(store_error_to_status(&StoreError::NotFound(uuid::Uuid::nil())), StatusCode::NOT_FOUND);
    assert_eq!(store_error_to_status(&StoreError::InvalidField("x".into())), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(store_error_to_status(&StoreError::ConfirmationRequired), StatusCode::PRECONDITION_REQUIRED);
    let failed = StoreError::ReorderFailed { attempts: 3, source: BackendError::Rejected("x".into()) };
    assert_eq!(store_error_to_status(&failed), StatusCode::BAD_GATEWAY);
}

#[test]
fn media_and_auth_errors_map_to_status() {
    assert_eq!(media_error_to_status(&MediaError::NotConfigured), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(media_error_to_status(&MediaError::EmptyFile), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(auth_error_to_status(&AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED);
    assert_eq!(auth_error_to_status(&AuthError::Provider("down".into())), StatusCode::BAD_GATEWAY);
}

#[test]
fn api_error_codes_delegate_to_source() {
    let err = ApiError::from(StoreError::ConfirmationRequired);
    assert_eq!(err.error_code(), "E_CONFIRMATION_REQUIRED");
    assert_eq!(err.status(), StatusCode::PRECONDITION_REQUIRED);
    assert_eq!(ApiError::Unauthorized.error_code(), "E_UNAUTHORIZED");
}

#[tokio::test]
async fn api_error_renders_json_body() {
    let resp = ApiError::from(StoreError::InvalidField("order_index".into())).into_response();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "E_INVALID_FIELD");
    assert_eq!(body["message"], "field cannot be written: order_index");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn healthz_is_ok() {
    let app = test_router(unconfigured_app_state());
    let (status, _, _) = send(&app, request("GET", "/healthz", false, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_static_files_are_not_found() {
    let app = test_router(unconfigured_app_state());
    let (status, _, _) = send(&app, request("GET", "/index.html", false, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
