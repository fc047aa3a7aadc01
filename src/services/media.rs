//! Media uploads to object storage for the gallery.
//!
//! DESIGN
//! ======
//! Objects are written with `opendal` (S3 service in production, memory
//! service in tests) under `<prefix>/<unix-millis>-<sanitized-name>` and
//! served from the bucket's public base URL. The store only hands back a
//! URL and a media type; recording the gallery row is the caller's job.

use std::time::{SystemTime, UNIX_EPOCH};

use opendal::Operator;
use tracing::info;

use crate::config::MediaConfig;
use crate::records::MediaType;

pub const GALLERY_PREFIX: &str = "gallery";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media storage is not configured")]
    NotConfigured,
    #[error("uploaded file is empty")]
    EmptyFile,
    #[error("storage error (is the public bucket '{bucket}' available?): {source}")]
    Storage {
        bucket: String,
        #[source]
        source: opendal::Error,
    },
}

impl crate::store::ErrorCode for MediaError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotConfigured => "E_MEDIA_NOT_CONFIGURED",
            Self::EmptyFile => "E_EMPTY_FILE",
            Self::Storage { .. } => "E_STORAGE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Storage { source, .. } if source.is_temporary())
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub path: String,
    pub url: String,
    pub media_type: MediaType,
}

pub struct MediaStore {
    operator: Operator,
    bucket: String,
    public_url: String,
}

impl MediaStore {
    /// Connect to the configured S3-compatible bucket.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the operator cannot be built.
    pub fn from_config(config: &MediaConfig) -> Result<Self, MediaError> {
        let builder = opendal::services::S3::default()
            .endpoint(&config.endpoint)
            .access_key_id(&config.access_key)
            .secret_access_key(&config.secret_key)
            .bucket(&config.bucket)
            .region(&config.region);
        let operator = Operator::new(builder)
            .map_err(|source| MediaError::Storage { bucket: config.bucket.clone(), source })?
            .finish();
        Ok(Self { operator, bucket: config.bucket.clone(), public_url: config.public_url.clone() })
    }

    /// In-process store; objects vanish with the process.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the operator cannot be built.
    #[cfg(test)]
    pub fn in_memory(public_url: &str) -> Result<Self, MediaError> {
        let bucket = "memory".to_owned();
        let operator = Operator::new(opendal::services::Memory::default())
            .map_err(|source| MediaError::Storage { bucket: bucket.clone(), source })?
            .finish();
        Ok(Self { operator, bucket, public_url: public_url.trim_end_matches('/').to_owned() })
    }

    fn supports_content_type(&self) -> bool {
        self.operator.info().full_capability().write_with_content_type
    }

    /// Store `bytes` under `prefix` and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `EmptyFile` for an empty upload or a storage error if the
    /// write fails.
    pub async fn upload(
        &self,
        prefix: &str,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<StoredMedia, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::EmptyFile);
        }

        let path = object_path(prefix, file_name, unix_millis());
        let size = bytes.len();
        let mut write = self.operator.write_with(&path, bytes);
        if let Some(content_type) = content_type.filter(|_| self.supports_content_type()) {
            write = write.content_type(content_type);
        }
        write
            .await
            .map_err(|source| MediaError::Storage { bucket: self.bucket.clone(), source })?;

        let media_type = MediaType::from_content_type(content_type);
        info!(%path, size, ?media_type, "media uploaded");
        Ok(StoredMedia { url: format!("{}/{path}", self.public_url), path, media_type })
    }

    /// Delete a stored object. Deleting a missing object succeeds.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the delete fails.
    pub async fn remove(&self, path: &str) -> Result<(), MediaError> {
        self.operator
            .delete(path)
            .await
            .map_err(|source| MediaError::Storage { bucket: self.bucket.clone(), source })?;
        info!(%path, "media removed");
        Ok(())
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    if sanitized.is_empty() { "file".to_owned() } else { sanitized }
}

/// `<prefix>/<millis>-<sanitized-name>`.
#[must_use]
pub fn object_path(prefix: &str, file_name: &str, millis: u128) -> String {
    format!("{}/{millis}-{}", prefix.trim_matches('/'), sanitize_file_name(file_name))
}

#[cfg(test)]
#[path = "media_test.rs"]
mod tests;
