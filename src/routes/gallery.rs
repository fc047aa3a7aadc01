//! Gallery upload route.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Json;
use tracing::{error, info, warn};

use super::ApiError;
use crate::records::GalleryItem;
use crate::routes::auth::AdminUser;
use crate::services::media::{GALLERY_PREFIX, MediaError, MediaStore};
use crate::state::AppState;
use crate::store::{OrderedRecord, StoreError};

struct UploadedFile {
    name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Best-effort cleanup of an object whose gallery record was never written.
async fn discard_upload(media: &MediaStore, path: &str) {
    match media.remove(path).await {
        Ok(()) => warn!(%path, "gallery record not created; uploaded object removed"),
        Err(e) => error!(%path, error = %e, "gallery record not created; uploaded object orphaned"),
    }
}

/// `POST /api/admin/gallery/upload` — store a file and append it to the
/// gallery.
///
/// Multipart fields: `file` (required) and `title` (optional). The media
/// type is taken from the file's content type. If the record cannot be
/// created the stored object is removed again.
pub async fn upload_media(
    State(state): State<AppState>,
    _admin: AdminUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<OrderedRecord<GalleryItem>>), ApiError> {
    if state.backend.is_none() {
        return Err(StoreError::ConfigurationMissing.into());
    }
    let Some(media) = &state.media else {
        return Err(MediaError::NotConfigured.into());
    };

    let mut file = None;
    let mut title = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::BadRequest(e.to_string()))? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_owned();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(|e| ApiError::BadRequest(e.to_string()))?;
                file = Some(UploadedFile { name, content_type, bytes: bytes.to_vec() });
            }
            Some("title") => {
                title = Some(field.text().await.map_err(|e| ApiError::BadRequest(e.to_string()))?);
            }
            _ => {}
        }
    }
    let Some(file) = file else {
        return Err(ApiError::BadRequest("missing multipart field 'file'".into()));
    };

    let stored = media
        .upload(GALLERY_PREFIX, &file.name, file.content_type.as_deref(), file.bytes)
        .await?;
    let item = GalleryItem { title, media_type: stored.media_type, media_url: stored.url };
    let record = match state.records::<GalleryItem>().create(item).await {
        Ok(record) => record,
        Err(e) => {
            discard_upload(media, &stored.path).await;
            return Err(e.into());
        }
    };

    info!(id = %record.id, path = %stored.path, "gallery item uploaded");
    Ok((StatusCode::CREATED, Json(record)))
}

#[cfg(test)]
#[path = "gallery_test.rs"]
mod tests;
