//! Content store: the backend seam and the record contracts built on it.
//!
//! DESIGN
//! ======
//! Every editable piece of the site is a row in one of six tables. Five of
//! them are ordered lists (nav links, features, protocol steps, pricing
//! tiers, gallery items) and share `OrderedRecordStore<T>`; site settings is
//! a zero-or-one row document handled by `SettingsStore`.
//!
//! Stores talk to a `Backend` through JSON rows so one trait covers every
//! record shape. Table and column identifiers only ever come from the
//! static `Table` descriptors below, never from request input.
//!
//! ERROR HANDLING
//! ==============
//! `BackendError` is what the storage layer reports; `StoreError` is what
//! callers see. Reorder failures are never folded into success: the order
//! batch is atomic and a terminal failure surfaces `ReorderFailed`.

pub mod memory;
pub mod ordered;
pub mod postgres;
pub mod settings;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

pub use ordered::{DeleteConfirmation, Direction, OrderedRecord, OrderedRecordStore, ReorderRetry};
pub use settings::{SettingsRecord, SettingsStore};

/// A backend row: column name to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

pub const ID_COLUMN: &str = "id";
pub const ORDER_COLUMN: &str = "order_index";
pub const UPDATED_COLUMN: &str = "updated_at";

// =============================================================================
// ERROR CODES
// =============================================================================

/// Stable machine-readable code carried next to an error message.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// TABLE DESCRIPTORS
// =============================================================================

/// Static description of one content table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    /// Editable payload columns. Excludes `id` and `order_index`.
    pub columns: &'static [&'static str],
    /// Whether rows carry an `order_index` kept contiguous by the store.
    pub ordered: bool,
    /// Whether rows carry an `updated_at` stamp written on every save.
    pub stamped: bool,
}

impl Table {
    /// True if `column` may appear in a row written to this table.
    #[must_use]
    pub fn accepts(&self, column: &str) -> bool {
        column == ID_COLUMN || (self.ordered && column == ORDER_COLUMN) || self.is_writable(column)
    }

    /// True if `column` is an editable payload column.
    #[must_use]
    pub fn is_payload(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }

    /// True if an update may set `column`: payload columns plus the
    /// `updated_at` stamp. Callers never supply the stamp themselves.
    #[must_use]
    pub fn is_writable(&self, column: &str) -> bool {
        self.is_payload(column) || (self.stamped && column == UPDATED_COLUMN)
    }
}

/// A record shape stored in one table.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: Table;

    /// Trim or otherwise canonicalise fields before a write.
    fn normalize(&mut self) {}

    /// Reject payloads that must never reach the backend.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the payload is invalid.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// A resource kept as a manually ordered list.
pub trait OrderedResource: Resource {
    /// Path segment used by the admin API (e.g. `features`).
    const SLUG: &'static str;

    /// Payload created by the admin "add" action for a collection of `len`
    /// records, or `None` if the resource cannot be created without input.
    fn template(len: usize) -> Option<Self>;

    /// Built-in content served when no backend is configured.
    fn defaults() -> Vec<OrderedRecord<Self>>;
}

// =============================================================================
// BACKEND
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("record not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("write rejected: {0}")]
    Rejected(String),
    #[error("order batch matched {matched} of {expected} rows")]
    StaleOrder { expected: usize, matched: usize },
}

impl ErrorCode for BackendError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Database(_) => "E_DATABASE",
            Self::Rejected(_) => "E_REJECTED",
            Self::StaleOrder { .. } => "E_STALE_ORDER",
        }
    }

    fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Database(sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Protocol(_))
        )
    }
}

/// Storage primitives the content stores are written against.
///
/// Rows are JSON objects keyed by column name. Ordered tables return rows
/// ascending by `order_index`.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Every row of `table`, ordered by `order_index` for ordered tables.
    async fn select_all(&self, table: &Table) -> Result<Vec<Row>, BackendError>;

    /// The row with the given id, if any.
    async fn select_one(&self, table: &Table, id: Uuid) -> Result<Option<Row>, BackendError>;

    /// The oldest row of `table`, if any. Used for singleton tables, where a
    /// duplicate insert must not change which row the site shows.
    async fn select_first(&self, table: &Table) -> Result<Option<Row>, BackendError>;

    async fn count(&self, table: &Table) -> Result<usize, BackendError>;

    /// Insert a complete row and return it as stored.
    async fn insert(&self, table: &Table, row: Row) -> Result<Row, BackendError>;

    /// Write only the supplied columns of the row with the given id.
    async fn update(&self, table: &Table, id: Uuid, fields: Row) -> Result<(), BackendError>;

    /// Delete a row. For ordered tables the remaining rows are renumbered
    /// to `0..n-1` in the same write.
    async fn delete(&self, table: &Table, id: Uuid) -> Result<(), BackendError>;

    /// Apply every `(id, order_index)` pair as one atomic write. Either all
    /// pairs land or none do.
    async fn write_order(&self, table: &Table, order: &[(Uuid, i32)]) -> Result<(), BackendError>;
}

// =============================================================================
// STORE ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("content backend is not configured")]
    ConfigurationMissing,
    #[error("record not found: {0}")]
    NotFound(Uuid),
    #[error("field cannot be written: {0}")]
    InvalidField(String),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    #[error("delete requires explicit confirmation")]
    ConfirmationRequired,
    #[error("{0}")]
    Persistence(BackendError),
    #[error("reorder not saved after {attempts} attempt(s): {source}")]
    ReorderFailed {
        attempts: u32,
        #[source]
        source: BackendError,
    },
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(id) => Self::NotFound(id),
            other => Self::Persistence(other),
        }
    }
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing => "E_NOT_CONFIGURED",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::InvalidField(_) => "E_INVALID_FIELD",
            Self::InvalidRecord(_) => "E_INVALID_RECORD",
            Self::ConfirmationRequired => "E_CONFIRMATION_REQUIRED",
            Self::Persistence(_) => "E_PERSISTENCE",
            Self::ReorderFailed { .. } => "E_REORDER_FAILED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Persistence(err) | Self::ReorderFailed { source: err, .. } => err.retryable(),
            _ => false,
        }
    }
}

// =============================================================================
// ROW HELPERS
// =============================================================================

/// Serialize a value that must be a JSON object into a row.
pub(crate) fn to_row<V: Serialize>(value: &V) -> Result<Row, StoreError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::InvalidRecord("record must serialize to an object".into())),
        Err(e) => Err(StoreError::InvalidRecord(e.to_string())),
    }
}

/// Decode a backend row into a typed record.
pub(crate) fn from_row<V: DeserializeOwned>(table: &Table, row: Row) -> Result<V, StoreError> {
    serde_json::from_value(serde_json::Value::Object(row))
        .map_err(|e| StoreError::InvalidRecord(format!("malformed {} row: {e}", table.name)))
}

/// Reject any field that is not an editable payload column of `table`.
pub(crate) fn check_payload_fields(table: &Table, fields: &Row) -> Result<(), StoreError> {
    match fields.keys().find(|key| !table.is_payload(key)) {
        Some(key) => Err(StoreError::InvalidField(key.clone())),
        None => Ok(()),
    }
}

/// Overlay `fields` on `base` and decode the result, checking field types.
pub(crate) fn merge_fields<V: Resource>(base: &V, fields: &Row) -> Result<V, StoreError> {
    let mut row = to_row(base)?;
    for (key, value) in fields {
        row.insert(key.clone(), value.clone());
    }
    let mut merged: V = serde_json::from_value(serde_json::Value::Object(row))
        .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
    merged.normalize();
    merged.validate().map_err(StoreError::InvalidRecord)?;
    Ok(merged)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
