//! Process configuration parsed from environment variables.
//!
//! Every external collaborator is optional. A missing database leaves the
//! public page on built-in content; missing auth or media settings disable
//! login or uploads without stopping the server.

use std::path::PathBuf;

use crate::store::ReorderRetry;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_MEDIA_BUCKET: &str = "site-media";
pub const DEFAULT_MEDIA_REGION: &str = "us-east-1";
pub const MEMORY_DATABASE_URL: &str = "memory://";

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

/// Non-empty, trimmed value of an environment variable.
pub(crate) fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Where content rows live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    /// Seeded in-process store; contents are lost on restart.
    Memory,
    Postgres { url: String, max_connections: u32 },
}

/// External auth provider endpoint and its public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub url: String,
    pub public_key: String,
}

impl AuthConfig {
    /// Load from `AUTH_URL` and `AUTH_PUBLIC_KEY`. `None` if either is
    /// missing (admin login will be disabled).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let url = env_string("AUTH_URL")?.trim_end_matches('/').to_owned();
        let public_key = env_string("AUTH_PUBLIC_KEY")?;
        Some(Self { url, public_key })
    }
}

/// S3-compatible bucket for gallery uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConfig {
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    /// Base URL under which uploaded objects are publicly readable.
    pub public_url: String,
}

impl MediaConfig {
    /// Load from `MEDIA_S3_*` and `MEDIA_PUBLIC_URL`. `None` if the endpoint,
    /// credentials, or public URL are missing (uploads will be disabled).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Some(Self {
            endpoint: env_string("MEDIA_S3_ENDPOINT")?,
            bucket: env_string("MEDIA_S3_BUCKET").unwrap_or_else(|| DEFAULT_MEDIA_BUCKET.into()),
            region: env_string("MEDIA_S3_REGION").unwrap_or_else(|| DEFAULT_MEDIA_REGION.into()),
            access_key: env_string("MEDIA_S3_ACCESS_KEY")?,
            secret_key: env_string("MEDIA_S3_SECRET_KEY")?,
            public_url: env_string("MEDIA_PUBLIC_URL")?.trim_end_matches('/').to_owned(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// `None` when `DATABASE_URL` is unset: built-in content only.
    pub database: Option<DatabaseConfig>,
    pub auth: Option<AuthConfig>,
    pub media: Option<MediaConfig>,
    pub reorder_retry: ReorderRetry,
    /// Forces the `Secure` cookie flag; defaults to whether auth runs over https.
    pub cookie_secure: bool,
    pub website_dir: PathBuf,
    pub admin_dir: PathBuf,
}

impl AppConfig {
    /// Build the full configuration from the environment.
    ///
    /// - `PORT`: default 3000
    /// - `DATABASE_URL`: Postgres URL, or `memory://` for a seeded in-process store
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `AUTH_URL`, `AUTH_PUBLIC_KEY`: external auth provider
    /// - `COOKIE_SECURE`: override the session cookie `Secure` flag
    /// - `MEDIA_S3_ENDPOINT`, `MEDIA_S3_BUCKET`, `MEDIA_S3_REGION`,
    ///   `MEDIA_S3_ACCESS_KEY`, `MEDIA_S3_SECRET_KEY`, `MEDIA_PUBLIC_URL`
    /// - `REORDER_RETRIES`, `REORDER_RETRY_BASE_MS`
    /// - `WEBSITE_DIR`, `ADMIN_DIR`: static front ends
    #[must_use]
    pub fn from_env() -> Self {
        let auth = AuthConfig::from_env();
        let cookie_secure = env_bool("COOKIE_SECURE")
            .unwrap_or_else(|| auth.as_ref().is_some_and(|a| a.url.starts_with("https://")));

        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            database: database_from_env(),
            auth,
            media: MediaConfig::from_env(),
            reorder_retry: ReorderRetry::from_env(),
            cookie_secure,
            website_dir: dir_from_env("WEBSITE_DIR", "site"),
            admin_dir: dir_from_env("ADMIN_DIR", "admin"),
        }
    }
}

fn database_from_env() -> Option<DatabaseConfig> {
    let url = env_string("DATABASE_URL")?;
    if url == MEMORY_DATABASE_URL {
        return Some(DatabaseConfig::Memory);
    }
    Some(DatabaseConfig::Postgres {
        url,
        max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
    })
}

fn dir_from_env(key: &str, fallback: &str) -> PathBuf {
    env_string(key)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public").join(fallback))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
