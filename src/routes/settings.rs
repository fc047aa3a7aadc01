//! Site settings routes.
//!
//! The client holds the id returned by a load or save and sends it back on
//! the next save; a save without an id inserts the settings row.

use axum::extract::State;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiError;
use crate::routes::auth::AdminUser;
use crate::state::AppState;
use crate::store::{Row, SettingsRecord, StoreError};

#[derive(Serialize)]
pub struct SettingsResponse {
    /// `None` until settings have been saved once.
    pub settings: Option<SettingsRecord>,
}

/// `GET /api/admin/settings` — the stored settings row, if any.
pub async fn load_settings(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<SettingsResponse>, ApiError> {
    let settings = state.settings(None).load().await?;
    Ok(Json(SettingsResponse { settings }))
}

#[derive(Deserialize)]
pub struct SaveSettingsBody {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub fields: Row,
}

#[derive(Serialize)]
pub struct SaveSettingsResponse {
    pub id: Uuid,
}

/// `PUT /api/admin/settings` — insert or update the settings row.
pub async fn save_settings(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<SaveSettingsBody>,
) -> Result<Json<SaveSettingsResponse>, ApiError> {
    let mut store = state.settings(body.id);
    store.save(body.fields).await?;
    let id = store.held_id().ok_or(StoreError::ConfigurationMissing)?;
    Ok(Json(SaveSettingsResponse { id }))
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
