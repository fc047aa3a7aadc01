//! Site settings: a zero-or-one row configuration document.
//!
//! DESIGN
//! ======
//! Save chooses insert or update purely from whether the caller holds an id
//! from a previous load or save. There is no upsert primitive: an editor
//! that never loaded a row inserts one, and from then on updates it.
//!
//! Every save stamps `updated_at`; clients cannot write it themselves.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;
use uuid::Uuid;

use super::{Backend, Resource, Row, StoreError, UPDATED_COLUMN, check_payload_fields, from_row, merge_fields, to_row};
use crate::records::SiteSettings;

/// The stored settings row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsRecord {
    pub id: Uuid,
    /// Time of the last save. `None` for built-in settings.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(flatten)]
    pub settings: SiteSettings,
}

/// Editor for the singleton settings row.
pub struct SettingsStore {
    backend: Option<Arc<dyn Backend>>,
    held_id: Option<Uuid>,
}

impl SettingsStore {
    /// Editor that has not loaded anything yet.
    #[must_use]
    pub fn new(backend: Option<Arc<dyn Backend>>) -> Self {
        Self { backend, held_id: None }
    }

    /// Editor resuming with the id a client loaded earlier.
    #[must_use]
    pub fn with_held_id(backend: Option<Arc<dyn Backend>>, held_id: Option<Uuid>) -> Self {
        Self { backend, held_id }
    }

    #[must_use]
    pub fn held_id(&self) -> Option<Uuid> {
        self.held_id
    }

    fn backend(&self) -> Result<&Arc<dyn Backend>, StoreError> {
        self.backend.as_ref().ok_or(StoreError::ConfigurationMissing)
    }

    /// Load the settings row, holding its id for later saves.
    ///
    /// Without a backend this returns the built-in settings under the nil id
    /// and holds nothing.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the read fails or `InvalidRecord` for
    /// an undecodable row.
    pub async fn load(&mut self) -> Result<Option<SettingsRecord>, StoreError> {
        let Some(backend) = &self.backend else {
            return Ok(Some(SettingsRecord { id: Uuid::nil(), updated_at: None, settings: SiteSettings::builtin() }));
        };
        let Some(row) = backend.select_first(&SiteSettings::TABLE).await? else {
            return Ok(None);
        };
        let record: SettingsRecord = from_row(&SiteSettings::TABLE, row)?;
        self.held_id = Some(record.id);
        Ok(Some(record))
    }

    /// Save the supplied fields: insert when no id is held, else update the
    /// held row. After an insert the new row's id is held.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` without a backend, `InvalidField` or
    /// `InvalidRecord` for bad input, `NotFound` if the held row is gone, or
    /// a persistence error if the backend rejects the write.
    pub async fn save(&mut self, fields: Row) -> Result<(), StoreError> {
        let backend = self.backend()?;
        check_payload_fields(&SiteSettings::TABLE, &fields)?;
        let now = OffsetDateTime::now_utc();

        if let Some(id) = self.held_id {
            let current = backend
                .select_one(&SiteSettings::TABLE, id)
                .await?
                .ok_or(StoreError::NotFound(id))?;
            let current: SettingsRecord = from_row(&SiteSettings::TABLE, current)?;
            merge_fields(&current.settings, &fields)?;
            let stamp = now.format(&Rfc3339).map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
            let mut writes = fields;
            writes.insert(UPDATED_COLUMN.to_owned(), stamp.into());
            backend.update(&SiteSettings::TABLE, id, writes).await?;
            info!(%id, "site settings updated");
            return Ok(());
        }

        let settings = merge_fields(&SiteSettings::blank(), &fields)?;
        let record = SettingsRecord { id: Uuid::new_v4(), updated_at: Some(now), settings };
        let stored = backend.insert(&SiteSettings::TABLE, to_row(&record)?).await?;
        let stored: SettingsRecord = from_row(&SiteSettings::TABLE, stored)?;
        self.held_id = Some(stored.id);
        info!(id = %stored.id, "site settings created");
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
