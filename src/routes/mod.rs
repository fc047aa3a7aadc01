//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the JSON API and the two static front ends under a
//! single Axum router. The public brand page is served as static files at
//! `/` and reads `GET /api/content`; the admin panel lives under `/admin`
//! behind the session gate and edits content through `/api/admin/*`.
//!
//! ERROR HANDLING
//! ==============
//! Handlers return [`ApiError`], which renders every failure as
//! `{ "code", "message", "retryable" }` with a status chosen per error kind.

pub mod admin;
pub mod auth;
pub mod content;
pub mod gallery;
pub mod settings;

use std::path::{Path, PathBuf};

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, patch, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::records::{Feature, GalleryItem, NavLink, PricingTier, ProtocolStep};
use crate::services::auth::{ADMIN_PATH, AuthError};
use crate::services::media::MediaError;
use crate::state::AppState;
use crate::store::{ErrorCode, OrderedResource, StoreError};

/// Largest accepted gallery upload.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

// =============================================================================
// ERRORS
// =============================================================================

/// Failure of an API request, rendered as a JSON error body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("not signed in")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Store(e) => e.error_code(),
            Self::Media(e) => e.error_code(),
            Self::Auth(e) => e.error_code(),
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::BadRequest(_) => "E_BAD_REQUEST",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.retryable(),
            Self::Media(e) => e.retryable(),
            Self::Auth(e) => e.retryable(),
            Self::Unauthorized | Self::BadRequest(_) => false,
        }
    }
}

pub(crate) fn store_error_to_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::ConfigurationMissing => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidField(_) | StoreError::InvalidRecord(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::ConfirmationRequired => StatusCode::PRECONDITION_REQUIRED,
        StoreError::Persistence(_) | StoreError::ReorderFailed { .. } => StatusCode::BAD_GATEWAY,
    }
}

pub(crate) fn media_error_to_status(err: &MediaError) -> StatusCode {
    match err {
        MediaError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        MediaError::EmptyFile => StatusCode::UNPROCESSABLE_ENTITY,
        MediaError::Storage { .. } => StatusCode::BAD_GATEWAY,
    }
}

pub(crate) fn auth_error_to_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::Provider(_) | AuthError::Http(_) => StatusCode::BAD_GATEWAY,
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(e) => store_error_to_status(e),
            Self::Media(e) => media_error_to_status(e),
            Self::Auth(e) => auth_error_to_status(e),
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, code = self.error_code(), "request failed");
        }
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
            "retryable": self.retryable(),
        });
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Admin CRUD routes for one ordered resource under `/api/admin/{slug}`.
fn with_resource<T: OrderedResource>(router: Router<AppState>) -> Router<AppState> {
    let base = format!("/api/admin/{}", T::SLUG);
    router
        .route(&base, get(admin::list_records::<T>).post(admin::create_record::<T>))
        .route(&format!("{base}/reorder"), post(admin::reorder_records::<T>))
        .route(
            &format!("{base}/{{id}}"),
            patch(admin::update_record::<T>).delete(admin::delete_record::<T>),
        )
}

/// JSON API routes.
fn api_routes() -> Router<AppState> {
    let public_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    let router = Router::new()
        .route("/api/content", get(content::site_content).layer(public_cors))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/admin/settings", get(settings::load_settings).put(settings::save_settings))
        .route(
            "/api/admin/gallery/upload",
            post(gallery::upload_media).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/healthz", get(healthz));

    let router = with_resource::<NavLink>(router);
    let router = with_resource::<Feature>(router);
    let router = with_resource::<ProtocolStep>(router);
    let router = with_resource::<PricingTier>(router);
    with_resource::<GalleryItem>(router)
}

/// Static front ends.
#[derive(Debug, Clone)]
pub struct StaticDirs {
    /// Public brand page, served at `/`.
    pub website: PathBuf,
    /// Admin single-page app, served at `/admin`.
    pub admin: PathBuf,
}

fn admin_service(dir: &Path) -> ServeDir<ServeFile> {
    // Client-side routes such as `/admin/features` fall back to the app shell.
    ServeDir::new(dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(dir.join("index.html")))
}

/// Full application: API, gated admin panel, and the public site.
pub fn app(state: AppState, dirs: &StaticDirs) -> Router {
    let website = ServeDir::new(&dirs.website).append_index_html_on_directories(true);

    api_routes()
        .nest_service(ADMIN_PATH, admin_service(&dirs.admin))
        .fallback_service(website)
        .layer(middleware::from_fn_with_state(state.clone(), auth::admin_session))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
