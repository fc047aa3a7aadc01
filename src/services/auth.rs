//! External auth provider — password sign-in, session lookup, sign-out.
//!
//! ARCHITECTURE
//! ============
//! Admin identity is owned by a GoTrue-compatible auth service. This module
//! only exchanges credentials for an access token and asks the provider who a
//! token belongs to; there are no local users or roles. Any authenticated
//! user has full admin rights.
//!
//! Access tokens are short-lived. A sign-in also returns a refresh token,
//! which the session middleware trades for a new access token once the old
//! one has expired.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("admin login is not configured")]
    NotConfigured,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("auth provider error: {0}")]
    Provider(String),
    #[error("auth provider unreachable: {0}")]
    Http(#[from] reqwest::Error),
}

impl crate::store::ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotConfigured => "E_AUTH_NOT_CONFIGURED",
            Self::InvalidCredentials => "E_INVALID_CREDENTIALS",
            Self::Provider(_) => "E_AUTH_PROVIDER",
            Self::Http(_) => "E_AUTH_UNREACHABLE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Authenticated admin as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens issued by a successful sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AdminIdentity,
}

/// Provider-neutral auth seam. Enables mocking in tests.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// The user owning `access_token`, or `None` if the token is not valid.
    async fn current_user(&self, access_token: &str) -> Result<Option<AdminIdentity>, AuthError>;

    /// Exchange a refresh token for a new session, or `None` if the refresh
    /// token is no longer valid.
    async fn refresh(&self, refresh_token: &str) -> Result<Option<AuthSession>, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// HTTP client for a GoTrue-style auth API.
pub struct GoTrueClient {
    http: reqwest::Client,
    base_url: String,
    public_key: String,
}

impl GoTrueClient {
    /// Build a client for `{base_url}/auth/v1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &crate::config::AuthConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { http, base_url: config.url.clone(), public_key: config.public_key.clone() })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default, alias = "error_description", alias = "msg")]
    message: Option<String>,
}

async fn provider_message(resp: reqwest::Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    serde_json::from_str::<ProviderError>(&body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

#[async_trait::async_trait]
impl AuthProvider for GoTrueClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let resp = self
            .http
            .post(self.endpoint("token?grant_type=password"))
            .header("apikey", &self.public_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(resp.json::<AuthSession>().await?),
            reqwest::StatusCode::BAD_REQUEST | reqwest::StatusCode::UNAUTHORIZED => Err(AuthError::InvalidCredentials),
            _ => Err(AuthError::Provider(provider_message(resp).await)),
        }
    }

    async fn current_user(&self, access_token: &str) -> Result<Option<AdminIdentity>, AuthError> {
        let resp = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.public_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(Some(resp.json::<AdminIdentity>().await?)),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => Ok(None),
            _ => Err(AuthError::Provider(provider_message(resp).await)),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Option<AuthSession>, AuthError> {
        let resp = self
            .http
            .post(self.endpoint("token?grant_type=refresh_token"))
            .header("apikey", &self.public_key)
            .json(&RefreshGrant { refresh_token })
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(Some(resp.json::<AuthSession>().await?)),
            reqwest::StatusCode::BAD_REQUEST | reqwest::StatusCode::UNAUTHORIZED => Ok(None),
            _ => Err(AuthError::Provider(provider_message(resp).await)),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let resp = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.public_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if resp.status().is_success() || resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(AuthError::Provider(provider_message(resp).await))
        }
    }
}

// =============================================================================
// ADMIN GATE
// =============================================================================

pub const ADMIN_PATH: &str = "/admin";
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

/// What the admin gate does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    RedirectToLogin,
    RedirectToAdmin,
}

/// True for `/admin` and anything below it.
#[must_use]
pub fn is_admin_path(path: &str) -> bool {
    path == ADMIN_PATH || path.starts_with("/admin/")
}

/// Decide how to route `path` for a visitor who is or is not signed in.
///
/// Signed-out visitors are sent to the login page from any admin path;
/// signed-in visitors are sent from the login page to the dashboard.
#[must_use]
pub fn gate(path: &str, authenticated: bool) -> GateDecision {
    let path = path.trim_end_matches('/');
    let is_login = path == ADMIN_LOGIN_PATH;
    if is_login && authenticated {
        GateDecision::RedirectToAdmin
    } else if is_admin_path(path) && !is_login && !authenticated {
        GateDecision::RedirectToLogin
    } else {
        GateDecision::Proceed
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
