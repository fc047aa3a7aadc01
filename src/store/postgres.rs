//! Postgres backend.
//!
//! DESIGN
//! ======
//! Rows cross the boundary as JSONB: reads use `to_jsonb(t)`, writes go
//! through `jsonb_populate_record(NULL::<table>, $1)` so Postgres applies
//! each column's own type. Identifiers are spliced into SQL only after being
//! resolved against the static `Table` descriptor.
//!
//! The `order_index` unique constraint is DEFERRABLE INITIALLY DEFERRED (see
//! migrations), which lets a single UPDATE swap indices and lets delete
//! compaction run in the same transaction as the delete.

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{Backend, BackendError, ID_COLUMN, ORDER_COLUMN, Row, Table, UPDATED_COLUMN};

/// Every table carries an insert timestamp; unordered tables read oldest first.
const CREATED_COLUMN: &str = "created_at";

pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Resolve row keys to the table's static column names.
pub(crate) fn resolve_columns(table: &Table, row: &Row) -> Result<Vec<&'static str>, BackendError> {
    row.keys()
        .map(|key| {
            [ID_COLUMN, ORDER_COLUMN, UPDATED_COLUMN]
                .into_iter()
                .chain(table.columns.iter().copied())
                .find(|column| table.accepts(column) && *column == key.as_str())
                .ok_or_else(|| BackendError::Rejected(format!("unknown column {}.{key}", table.name)))
        })
        .collect()
}

pub(crate) fn select_all_sql(table: &Table) -> String {
    if table.ordered {
        format!("SELECT to_jsonb(t) FROM {name} AS t ORDER BY t.{ORDER_COLUMN} ASC", name = table.name)
    } else {
        format!(
            "SELECT to_jsonb(t) FROM {name} AS t ORDER BY t.{CREATED_COLUMN} ASC, t.{ID_COLUMN} ASC",
            name = table.name
        )
    }
}

pub(crate) fn insert_sql(table: &Table, columns: &[&str]) -> String {
    let list = columns.join(", ");
    format!(
        "INSERT INTO {name} ({list}) SELECT {list} FROM jsonb_populate_record(NULL::{name}, $1) \
         RETURNING to_jsonb({name}.*)",
        name = table.name
    )
}

pub(crate) fn compact_sql(table: &Table) -> String {
    format!(
        "UPDATE {name} AS t SET {ORDER_COLUMN} = s.position \
         FROM (SELECT id, (row_number() OVER (ORDER BY {ORDER_COLUMN}, id) - 1)::int4 AS position FROM {name}) AS s \
         WHERE t.id = s.id AND t.{ORDER_COLUMN} <> s.position",
        name = table.name
    )
}

pub(crate) fn write_order_sql(table: &Table) -> String {
    format!(
        "UPDATE {name} AS t SET {ORDER_COLUMN} = v.position \
         FROM UNNEST($1::uuid[], $2::int4[]) AS v(id, position) \
         WHERE t.id = v.id",
        name = table.name
    )
}

fn into_row(table: &Table, value: serde_json::Value) -> Result<Row, BackendError> {
    match value {
        serde_json::Value::Object(row) => Ok(row),
        _ => Err(BackendError::Rejected(format!("{} returned a non-object row", table.name))),
    }
}

#[async_trait::async_trait]
impl Backend for PgBackend {
    async fn select_all(&self, table: &Table) -> Result<Vec<Row>, BackendError> {
        let sql = select_all_sql(table);
        let values = sqlx::query_scalar::<_, serde_json::Value>(&sql)
            .fetch_all(&self.pool)
            .await?;
        values.into_iter().map(|value| into_row(table, value)).collect()
    }

    async fn select_one(&self, table: &Table, id: Uuid) -> Result<Option<Row>, BackendError> {
        let sql = format!("SELECT to_jsonb(t) FROM {name} AS t WHERE t.id = $1", name = table.name);
        let value = sqlx::query_scalar::<_, serde_json::Value>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        value.map(|value| into_row(table, value)).transpose()
    }

    async fn select_first(&self, table: &Table) -> Result<Option<Row>, BackendError> {
        let sql = format!("{} LIMIT 1", select_all_sql(table));
        let value = sqlx::query_scalar::<_, serde_json::Value>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        value.map(|value| into_row(table, value)).transpose()
    }

    async fn count(&self, table: &Table) -> Result<usize, BackendError> {
        let sql = format!("SELECT count(*) FROM {name}", name = table.name);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn insert(&self, table: &Table, row: Row) -> Result<Row, BackendError> {
        let columns = resolve_columns(table, &row)?;
        let sql = insert_sql(table, &columns);
        let value = sqlx::query_scalar::<_, serde_json::Value>(&sql)
            .bind(serde_json::Value::Object(row))
            .fetch_one(&self.pool)
            .await?;
        into_row(table, value)
    }

    async fn update(&self, table: &Table, id: Uuid, fields: Row) -> Result<(), BackendError> {
        let columns = resolve_columns(table, &fields)?;
        if let Some(column) = columns.iter().find(|column| !table.is_writable(column)) {
            return Err(BackendError::Rejected(format!("column {}.{column} is not writable", table.name)));
        }
        if columns.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Postgres>::new(format!("UPDATE {} AS t SET ", table.name));
        {
            let mut separated = builder.separated(", ");
            for column in &columns {
                separated.push(format!("{column} = r.{column}"));
            }
        }
        builder.push(format!(" FROM jsonb_populate_record(NULL::{}, ", table.name));
        builder.push_bind(serde_json::Value::Object(fields));
        builder.push(") AS r WHERE t.id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(BackendError::NotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, table: &Table, id: Uuid) -> Result<(), BackendError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!("DELETE FROM {name} WHERE id = $1", name = table.name);
        let result = sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(BackendError::NotFound(id));
        }
        if table.ordered {
            sqlx::query(&compact_sql(table)).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn write_order(&self, table: &Table, order: &[(Uuid, i32)]) -> Result<(), BackendError> {
        let (ids, positions): (Vec<Uuid>, Vec<i32>) = order.iter().copied().unzip();

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&write_order_sql(table))
            .bind(ids)
            .bind(positions)
            .execute(&mut *tx)
            .await?;
        let matched = usize::try_from(result.rows_affected()).unwrap_or_default();
        if matched != order.len() {
            // Dropping the transaction rolls the partial batch back.
            return Err(BackendError::StaleOrder { expected: order.len(), matched });
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
