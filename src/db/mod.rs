//! Backend initialization.
//!
//! SYSTEM CONTEXT
//! ==============
//! Startup uses this module to turn the database configuration into the one
//! shared `Backend` handle that every store receives. A missing or
//! unreachable database is not fatal: the site falls back to built-in
//! content and the admin API reports the backend as unconfigured.

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::records::seed_builtin_content;
use crate::store::Backend;
use crate::store::memory::MemoryBackend;
use crate::store::postgres::PgBackend;

/// Initialize the `PostgreSQL` connection pool and run migrations.
///
/// # Errors
///
/// Returns an error if the connection or migrations fail.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;

    Ok(pool)
}

/// Build the process-wide backend handle, or `None` to serve built-in
/// content only.
pub async fn connect(config: Option<&DatabaseConfig>) -> Option<Arc<dyn Backend>> {
    match config {
        None => {
            warn!("DATABASE_URL not set; serving built-in content, admin edits disabled");
            None
        }
        Some(DatabaseConfig::Memory) => {
            let backend = MemoryBackend::new();
            if let Err(e) = seed_builtin_content(&backend).await {
                error!(error = %e, "seeding in-memory content failed");
            }
            info!("using in-memory content store");
            Some(Arc::new(backend))
        }
        Some(DatabaseConfig::Postgres { url, max_connections }) => match init_pool(url, *max_connections).await {
            Ok(pool) => {
                info!(max_connections, "postgres content store ready");
                Some(Arc::new(PgBackend::new(pool)))
            }
            Err(e) => {
                error!(error = %e, "database init failed; serving built-in content");
                None
            }
        },
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
