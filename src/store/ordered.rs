//! Ordered record store: list, create, update, delete and reorder for any
//! manually ordered resource.
//!
//! DESIGN
//! ======
//! The invariant is "order_index equals position": after every successful
//! mutation the indices of a collection are exactly `0..n-1`. Create appends
//! at `n`, delete compacts in the backend's delete write, and reorder swaps
//! two neighbours then renumbers the whole sequence.
//!
//! TRADE-OFFS
//! ==========
//! Reorder rewrites every index whose position changed (O(n) rows per
//! single-step move) instead of using sparse or fractional indices. The
//! collections are tens of rows, and the whole batch goes out as one atomic
//! write, so a failure never leaves a half-renumbered list behind.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    Backend, ErrorCode, OrderedResource, Row, StoreError, check_payload_fields, from_row,
    merge_fields, to_row,
};

const DEFAULT_REORDER_RETRIES: u32 = 3;
const DEFAULT_REORDER_RETRY_BASE_MS: u64 = 50;

// =============================================================================
// TYPES
// =============================================================================

/// One row of an ordered collection: identity, position, and payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedRecord<T> {
    pub id: Uuid,
    pub order_index: i32,
    #[serde(flatten)]
    pub payload: T,
}

/// Single-step move direction. On the wire: `-1` (up) or `1` (down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    #[must_use]
    pub fn offset(self) -> isize {
        match self {
            Self::Up => -1,
            Self::Down => 1,
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Up),
            1 => Ok(Self::Down),
            other => Err(format!("direction must be -1 or 1, got {other}")),
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

/// Proof that the operator affirmatively confirmed a delete.
///
/// The only constructor is [`DeleteConfirmation::affirm`], so
/// [`OrderedRecordStore::delete`] cannot run without one.
#[derive(Debug)]
pub struct DeleteConfirmation(());

impl DeleteConfirmation {
    /// Turn the caller's confirmation signal into a delete token.
    ///
    /// # Errors
    ///
    /// Returns `ConfirmationRequired` unless `confirmed` is true.
    pub fn affirm(confirmed: bool) -> Result<Self, StoreError> {
        if confirmed { Ok(Self(())) } else { Err(StoreError::ConfirmationRequired) }
    }
}

/// Retry policy for the reorder batch write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderRetry {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    pub base_ms: u64,
}

impl ReorderRetry {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            attempts: crate::config::env_parse("REORDER_RETRIES", DEFAULT_REORDER_RETRIES),
            base_ms: crate::config::env_parse("REORDER_RETRY_BASE_MS", DEFAULT_REORDER_RETRY_BASE_MS),
        }
    }

    /// Back-off delay after the given failed attempt (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.base_ms.saturating_mul(1 << shift))
    }
}

impl Default for ReorderRetry {
    fn default() -> Self {
        Self { attempts: DEFAULT_REORDER_RETRIES, base_ms: DEFAULT_REORDER_RETRY_BASE_MS }
    }
}

// =============================================================================
// PURE ORDERING
// =============================================================================

/// Sort records ascending by `order_index`. Stable for equal indices.
pub fn sort_by_order<T>(records: &mut [OrderedRecord<T>]) {
    records.sort_by_key(|record| record.order_index);
}

/// Set every record's `order_index` to its position and return the
/// `(id, order_index)` pairs that changed.
pub fn renumber<T>(records: &mut [OrderedRecord<T>]) -> Vec<(Uuid, i32)> {
    let mut changed = Vec::new();
    for (position, record) in records.iter_mut().enumerate() {
        let Ok(index) = i32::try_from(position) else {
            break;
        };
        if record.order_index != index {
            record.order_index = index;
            changed.push((record.id, index));
        }
    }
    changed
}

/// Move the record at `index` one step in `direction` and renumber.
///
/// Returns the index changes to persist, or `None` when the move falls
/// outside the list (first item up, last item down, or a stale index), in
/// which case `records` is untouched.
pub fn move_record<T>(records: &mut [OrderedRecord<T>], index: usize, direction: Direction) -> Option<Vec<(Uuid, i32)>> {
    let target = index.checked_add_signed(direction.offset())?;
    if index >= records.len() || target >= records.len() {
        return None;
    }
    records.swap(index, target);
    Some(renumber(records))
}

// =============================================================================
// STORE
// =============================================================================

/// Ordered collection of `T` records in one backend table.
pub struct OrderedRecordStore<T> {
    backend: Option<Arc<dyn Backend>>,
    retry: ReorderRetry,
    _resource: std::marker::PhantomData<fn() -> T>,
}

impl<T: OrderedResource> OrderedRecordStore<T> {
    /// Build a store over an injected backend handle. `None` means no
    /// backend is configured: reads serve built-in defaults and writes fail
    /// with `ConfigurationMissing`.
    #[must_use]
    pub fn new(backend: Option<Arc<dyn Backend>>, retry: ReorderRetry) -> Self {
        Self { backend, retry, _resource: std::marker::PhantomData }
    }

    fn backend(&self) -> Result<&Arc<dyn Backend>, StoreError> {
        self.backend.as_ref().ok_or(StoreError::ConfigurationMissing)
    }

    /// All records ascending by `order_index`.
    ///
    /// Read failures are logged and reported as an empty list.
    pub async fn list(&self) -> Vec<OrderedRecord<T>> {
        if self.backend.is_none() {
            let mut defaults = T::defaults();
            sort_by_order(&mut defaults);
            return defaults;
        }
        match self.try_list().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, table = T::TABLE.name, "list failed; returning empty collection");
                Vec::new()
            }
        }
    }

    /// All records ascending by `order_index`, surfacing read failures.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` without a backend, a persistence error
    /// if the read fails, or `InvalidRecord` for an undecodable row.
    pub async fn try_list(&self) -> Result<Vec<OrderedRecord<T>>, StoreError> {
        let rows = self.backend()?.select_all(&T::TABLE).await?;
        let mut records = rows
            .into_iter()
            .map(|row| from_row(&T::TABLE, row))
            .collect::<Result<Vec<OrderedRecord<T>>, _>>()?;
        sort_by_order(&mut records);
        Ok(records)
    }

    /// Append a record built from `payload` at the end of the collection.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` for a payload that fails validation, or a
    /// persistence error if the backend rejects the insert.
    pub async fn create(&self, mut payload: T) -> Result<OrderedRecord<T>, StoreError> {
        let backend = self.backend()?;
        payload.normalize();
        payload.validate().map_err(StoreError::InvalidRecord)?;

        let len = backend.count(&T::TABLE).await?;
        let order_index = i32::try_from(len).map_err(|_| StoreError::InvalidRecord("collection is full".into()))?;
        let record = OrderedRecord { id: Uuid::new_v4(), order_index, payload };

        let stored = backend.insert(&T::TABLE, to_row(&record)?).await?;
        let created: OrderedRecord<T> = from_row(&T::TABLE, stored)?;
        info!(table = T::TABLE.name, id = %created.id, order_index = created.order_index, "record created");
        Ok(created)
    }

    /// Append a record built from the resource's template.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` if the resource has no template, otherwise
    /// as [`Self::create`].
    pub async fn create_from_template(&self) -> Result<OrderedRecord<T>, StoreError> {
        let len = self.backend()?.count(&T::TABLE).await?;
        let payload = T::template(len)
            .ok_or_else(|| StoreError::InvalidRecord(format!("{} records need explicit fields", T::SLUG)))?;
        self.create(payload).await
    }

    /// Write the supplied payload fields of one record.
    ///
    /// `id` and `order_index` are never writable here. Fields are checked by
    /// merging them onto the stored record before anything is written. An
    /// empty field set writes nothing but still requires the record to exist.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` for an unknown or read-only column,
    /// `InvalidRecord` for a type mismatch, `NotFound` for an unknown id,
    /// or a persistence error if the backend rejects the write.
    pub async fn update(&self, id: Uuid, fields: Row) -> Result<(), StoreError> {
        let backend = self.backend()?;
        check_payload_fields(&T::TABLE, &fields)?;

        let current = backend.select_one(&T::TABLE, id).await?.ok_or(StoreError::NotFound(id))?;
        if fields.is_empty() {
            return Ok(());
        }
        let current: OrderedRecord<T> = from_row(&T::TABLE, current)?;
        let merged = to_row(&merge_fields(&current.payload, &fields)?)?;

        let writes = fields
            .keys()
            .filter_map(|key| merged.get(key).map(|value| (key.clone(), value.clone())))
            .collect::<Row>();
        backend.update(&T::TABLE, id, writes).await?;
        info!(table = T::TABLE.name, %id, fields = fields.len(), "record updated");
        Ok(())
    }

    /// Delete one record and compact the remaining indices.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id or a persistence error if the
    /// backend rejects the delete.
    pub async fn delete(&self, id: Uuid, confirmation: DeleteConfirmation) -> Result<(), StoreError> {
        let DeleteConfirmation(()) = confirmation;
        self.backend()?.delete(&T::TABLE, id).await?;
        info!(table = T::TABLE.name, %id, "record deleted");
        Ok(())
    }

    /// Move the record at `index` one step and persist the new order.
    ///
    /// Returns the new sequence. A move past either end is a no-op that
    /// returns the current sequence unchanged.
    ///
    /// # Errors
    ///
    /// Returns a read error if the current order cannot be loaded, or
    /// `ReorderFailed` if the order batch could not be written. In the
    /// latter case the stored order is the one from before the call.
    pub async fn reorder(&self, index: usize, direction: Direction) -> Result<Vec<OrderedRecord<T>>, StoreError> {
        let mut records = self.try_list().await?;
        let Some(changes) = move_record(&mut records, index, direction) else {
            return Ok(records);
        };
        self.persist_order(&changes).await?;
        info!(table = T::TABLE.name, index, ?direction, writes = changes.len(), "records reordered");
        Ok(records)
    }

    async fn persist_order(&self, changes: &[(Uuid, i32)]) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }
        let backend = self.backend()?;
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match backend.write_order(&T::TABLE, changes).await {
                Ok(()) => return Ok(()),
                Err(e) if e.retryable() && attempt < attempts => {
                    warn!(error = %e, attempt, total = attempts, table = T::TABLE.name, "order write failed; retrying");
                    tokio::time::sleep(self.retry.delay(attempt)).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(error = %e, attempt, table = T::TABLE.name, "order write failed");
                    return Err(StoreError::ReorderFailed { attempts: attempt, source: e });
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "ordered_test.rs"]
mod tests;
