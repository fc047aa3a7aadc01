//! Admin CRUD routes, generic over every ordered resource.
//!
//! Each handler is instantiated once per resource type in
//! [`super::with_resource`]; the resource's slug picks the URL and its table
//! description drives validation.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::ApiError;
use crate::routes::auth::AdminUser;
use crate::state::AppState;
use crate::store::{DeleteConfirmation, Direction, OrderedRecord, OrderedResource, Row};

/// `GET /api/admin/{resource}` — records in display order.
pub async fn list_records<T: OrderedResource>(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Json<Vec<OrderedRecord<T>>> {
    Json(state.records::<T>().list().await)
}

/// `POST /api/admin/{resource}` — append a record.
///
/// An empty body appends the resource's "new item" template.
pub async fn create_record<T: OrderedResource>(
    State(state): State<AppState>,
    _admin: AdminUser,
    body: Bytes,
) -> Result<(StatusCode, Json<OrderedRecord<T>>), ApiError> {
    let store = state.records::<T>();
    let record = if body.iter().all(u8::is_ascii_whitespace) {
        store.create_from_template().await?
    } else {
        let payload: T = serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
        store.create(payload).await?
    };
    Ok((StatusCode::CREATED, Json(record)))
}

/// `PATCH /api/admin/{resource}/{id}` — overwrite the supplied fields.
pub async fn update_record<T: OrderedResource>(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(fields): Json<Row>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.records::<T>().update(id, fields).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// `DELETE /api/admin/{resource}/{id}?confirm=true` — remove a record.
///
/// Without `confirm=true` nothing is deleted and 428 is returned.
pub async fn delete_record<T: OrderedResource>(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let confirmation = DeleteConfirmation::affirm(query.confirm)?;
    state.records::<T>().delete(id, confirmation).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Deserialize)]
pub struct ReorderBody {
    pub index: usize,
    /// `-1` moves the record up, `1` moves it down.
    pub direction: Direction,
}

/// `POST /api/admin/{resource}/reorder` — swap a record with its neighbour
/// and return the new order.
pub async fn reorder_records<T: OrderedResource>(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<ReorderBody>,
) -> Result<Json<Vec<OrderedRecord<T>>>, ApiError> {
    let records = state.records::<T>().reorder(body.index, body.direction).await?;
    Ok(Json(records))
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
