//! Public content route.

use axum::extract::State;
use axum::http::header::CACHE_CONTROL;
use axum::response::{IntoResponse, Json};

use crate::services::content::load_site_content;
use crate::state::AppState;

/// `GET /api/content` — everything the public page renders.
///
/// Never cached, so admin edits show up on the next page load.
pub async fn site_content(State(state): State<AppState>) -> impl IntoResponse {
    let content = load_site_content(state.backend.as_ref()).await;
    ([(CACHE_CONTROL, "no-store")], Json(content))
}

#[cfg(test)]
#[path = "content_test.rs"]
mod tests;
