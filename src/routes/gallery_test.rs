use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};

use uuid::Uuid;

use crate::routes::test_helpers::*;
use crate::services::media::MediaStore;
use crate::state::AppState;
use crate::state::test_helpers::{MockAuth, test_app_state};
use crate::store::memory::MemoryBackend;
use crate::store::{Backend, BackendError, Row, Table};

/// Memory backend that refuses every insert.
struct ReadOnlyBackend(MemoryBackend);

#[async_trait::async_trait]
impl Backend for ReadOnlyBackend {
    async fn select_all(&self, table: &Table) -> Result<Vec<Row>, BackendError> {
        self.0.select_all(table).await
    }

    async fn select_one(&self, table: &Table, id: Uuid) -> Result<Option<Row>, BackendError> {
        self.0.select_one(table, id).await
    }

    async fn select_first(&self, table: &Table) -> Result<Option<Row>, BackendError> {
        self.0.select_first(table).await
    }

    async fn count(&self, table: &Table) -> Result<usize, BackendError> {
        self.0.count(table).await
    }

    async fn insert(&self, table: &Table, _row: Row) -> Result<Row, BackendError> {
        Err(BackendError::Rejected(format!("{} is read-only", table.name)))
    }

    async fn update(&self, table: &Table, id: Uuid, fields: Row) -> Result<(), BackendError> {
        self.0.update(table, id, fields).await
    }

    async fn delete(&self, table: &Table, id: Uuid) -> Result<(), BackendError> {
        self.0.delete(table, id).await
    }

    async fn write_order(&self, table: &Table, order: &[(Uuid, i32)]) -> Result<(), BackendError> {
        self.0.write_order(table, order).await
    }
}

const BOUNDARY: &str = "aurenix-test-boundary";

fn part(name: &str, file: Option<(&str, &str)>, data: &str) -> String {
    let disposition = match file {
        Some((file_name, content_type)) => format!(
            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n"
        ),
        None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n"),
    };
    format!("--{BOUNDARY}\r\n{disposition}\r\n{data}\r\n")
}

fn upload_request(parts: &[String]) -> Request<Body> {
    let body = format!("{}--{BOUNDARY}--\r\n", parts.concat());
    Request::builder()
        .method("POST")
        .uri("/api/admin/gallery/upload")
        .header(header::COOKIE, session_cookie())
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn upload_stores_file_and_appends_gallery_item() {
    let app = test_router(test_app_state());
    let req = upload_request(&[
        part("title", None, "Studio"),
        part("file", Some(("studio tour.mp4", "video/mp4")), "frames"),
    ]);

    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Studio");
    assert_eq!(body["media_type"], "video");
    assert_eq!(body["order_index"], 0);
    let url = body["media_url"].as_str().unwrap();
    assert!(url.starts_with("https://cdn.example.com/site-media/gallery/"), "{url}");
    assert!(url.ends_with("-studio_tour.mp4"), "{url}");

    let (_, list) = call(&app, "GET", "/api/admin/gallery", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn upload_without_title_has_no_title() {
    let app = test_router(test_app_state());
    let req = upload_request(&[part("file", Some(("a.png", "image/png")), "png")]);
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], serde_json::Value::Null);
    assert_eq!(body["media_type"], "image");
}

#[tokio::test]
async fn upload_without_file_is_bad_request() {
    let app = test_router(test_app_state());
    let (status, _, body) = send(&app, upload_request(&[part("title", None, "Orphan")])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E_BAD_REQUEST");
}

#[tokio::test]
async fn empty_file_is_rejected() {
    let app = test_router(test_app_state());
    let req = upload_request(&[part("file", Some(("a.png", "image/png")), "")]);
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "E_EMPTY_FILE");
}

#[tokio::test]
async fn upload_without_media_store_is_unavailable() {
    let state = AppState::new(Some(Arc::new(MemoryBackend::new())), Some(Arc::new(MockAuth)), None);
    let app = test_router(state);
    let req = upload_request(&[part("file", Some(("a.png", "image/png")), "png")]);
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "E_MEDIA_NOT_CONFIGURED");
}

#[tokio::test]
async fn upload_requires_session() {
    let app = test_router(test_app_state());
    let mut req = upload_request(&[part("file", Some(("a.png", "image/png")), "png")]);
    req.headers_mut().remove(header::COOKIE);
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn failed_record_write_reports_persistence_error() {
    let media = MediaStore::in_memory("https://cdn.example.com/site-media").unwrap();
    let state = AppState::new(
        Some(Arc::new(ReadOnlyBackend(MemoryBackend::new()))),
        Some(Arc::new(MockAuth)),
        Some(Arc::new(media)),
    );
    let app = test_router(state);
    let req = upload_request(&[part("file", Some(("a.png", "image/png")), "png")]);

    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "E_PERSISTENCE");

    let (_, list) = call(&app, "GET", "/api/admin/gallery", None).await;
    assert_eq!(list, serde_json::json!([]));
}
