//! In-process backend used by tests and by `DATABASE_URL=memory://` runs.
//!
//! Mirrors the Postgres backend's guarantees: unique ids, unique order
//! indices per table, delete-with-compaction, and an all-or-nothing order
//! batch.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Backend, BackendError, ID_COLUMN, ORDER_COLUMN, Row, Table};

#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<&'static str, Vec<Row>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn row_id(row: &Row) -> Option<Uuid> {
    row.get(ID_COLUMN)
        .and_then(serde_json::Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

fn row_order(row: &Row) -> Option<i64> {
    row.get(ORDER_COLUMN).and_then(serde_json::Value::as_i64)
}

fn sort_rows(rows: &mut [Row]) {
    rows.sort_by_key(|row| row_order(row).unwrap_or(i64::MAX));
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    async fn select_all(&self, table: &Table) -> Result<Vec<Row>, BackendError> {
        let tables = self.tables.read().await;
        let mut rows = tables.get(table.name).cloned().unwrap_or_default();
        if table.ordered {
            sort_rows(&mut rows);
        }
        Ok(rows)
    }

    async fn select_one(&self, table: &Table, id: Uuid) -> Result<Option<Row>, BackendError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table.name)
            .and_then(|rows| rows.iter().find(|row| row_id(row) == Some(id)))
            .cloned())
    }

    // Unordered tables keep insertion order.
    async fn select_first(&self, table: &Table) -> Result<Option<Row>, BackendError> {
        Ok(self.select_all(table).await?.into_iter().next())
    }

    async fn count(&self, table: &Table) -> Result<usize, BackendError> {
        let tables = self.tables.read().await;
        Ok(tables.get(table.name).map_or(0, Vec::len))
    }

    async fn insert(&self, table: &Table, row: Row) -> Result<Row, BackendError> {
        if let Some(column) = row.keys().find(|key| !table.accepts(key)) {
            return Err(BackendError::Rejected(format!("unknown column {}.{column}", table.name)));
        }
        let id = row_id(&row).ok_or_else(|| BackendError::Rejected(format!("{} row without id", table.name)))?;

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.name).or_default();
        if rows.iter().any(|existing| row_id(existing) == Some(id)) {
            return Err(BackendError::Rejected(format!("duplicate id {id} in {}", table.name)));
        }
        if table.ordered {
            let order = row_order(&row).ok_or_else(|| BackendError::Rejected("missing order_index".into()))?;
            if order < 0 || rows.iter().any(|existing| row_order(existing) == Some(order)) {
                return Err(BackendError::Rejected(format!("order_index {order} taken in {}", table.name)));
            }
        }
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &Table, id: Uuid, fields: Row) -> Result<(), BackendError> {
        if let Some(column) = fields.keys().find(|key| !table.is_writable(key)) {
            return Err(BackendError::Rejected(format!("column {}.{column} is not writable", table.name)));
        }
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(table.name)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == Some(id)))
            .ok_or(BackendError::NotFound(id))?;
        row.extend(fields);
        Ok(())
    }

    async fn delete(&self, table: &Table, id: Uuid) -> Result<(), BackendError> {
        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(table.name).ok_or(BackendError::NotFound(id))?;
        let position = rows
            .iter()
            .position(|row| row_id(row) == Some(id))
            .ok_or(BackendError::NotFound(id))?;
        rows.remove(position);

        if table.ordered {
            sort_rows(rows);
            for (index, row) in rows.iter_mut().enumerate() {
                row.insert(ORDER_COLUMN.into(), serde_json::Value::from(index));
            }
        }
        Ok(())
    }

    async fn write_order(&self, table: &Table, order: &[(Uuid, i32)]) -> Result<(), BackendError> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.name).or_default();

        // Validate the whole batch before touching any row.
        let positions = order
            .iter()
            .map(|(id, _)| rows.iter().position(|row| row_id(row) == Some(*id)))
            .collect::<Vec<_>>();
        let matched = positions.iter().flatten().count();
        if matched != order.len() {
            return Err(BackendError::StaleOrder { expected: order.len(), matched });
        }

        let mut staged = rows.clone();
        for (position, (_, index)) in positions.into_iter().flatten().zip(order) {
            staged[position].insert(ORDER_COLUMN.into(), serde_json::Value::from(*index));
        }
        let mut seen = HashSet::new();
        if !staged.iter().filter_map(row_order).all(|index| seen.insert(index)) {
            return Err(BackendError::Rejected(format!("duplicate order_index in {}", table.name)));
        }
        *rows = staged;
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
