//! Auth routes — password login against the provider, session cookies, and
//! the admin session middleware.
//!
//! The access token lives in `admin_session` and expires with the provider
//! session. The refresh token lives in `admin_refresh`; when a request to an
//! admin page or the admin API arrives without a live access token, the
//! middleware trades the refresh token for a new session and re-issues both
//! cookies on the response.

use axum::extract::{FromRef, Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;
use tracing::{info, warn};

use super::ApiError;
use crate::services::auth::{
    ADMIN_LOGIN_PATH, ADMIN_PATH, AdminIdentity, AuthError, AuthSession, GateDecision, gate, is_admin_path,
};
use crate::state::AppState;

pub const COOKIE_NAME: &str = "admin_session";
pub const REFRESH_COOKIE_NAME: &str = "admin_refresh";
const REFRESH_COOKIE_DAYS: i64 = 30;

fn auth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn cookie_value<'a>(jar: &'a CookieJar, name: &str) -> Option<&'a str> {
    jar.get(name).map(Cookie::value).filter(|token| !token.is_empty())
}

fn session_token(jar: &CookieJar) -> Option<&str> {
    cookie_value(jar, COOKIE_NAME)
}

/// Add the cookies for a fresh provider session to `jar`.
fn store_session(jar: CookieJar, session: &AuthSession, secure: bool) -> CookieJar {
    let mut access = auth_cookie(COOKIE_NAME, session.access_token.clone(), secure);
    if let Some(seconds) = session.expires_in {
        access.set_max_age(Duration::seconds(seconds));
    }
    let jar = jar.add(access);

    match &session.refresh_token {
        Some(token) => {
            let mut refresh = auth_cookie(REFRESH_COOKIE_NAME, token.clone(), secure);
            refresh.set_max_age(Duration::days(REFRESH_COOKIE_DAYS));
            jar.add(refresh)
        }
        None => jar,
    }
}

/// Resolve the admin owning `token`, or `None` if it is not a live session.
async fn resolve_admin(state: &AppState, token: &str) -> Result<Option<AdminIdentity>, AuthError> {
    let Some(auth) = &state.auth else {
        return Err(AuthError::NotConfigured);
    };
    auth.current_user(token).await
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Signed-in admin extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AdminUser {
    pub identity: AdminIdentity,
}

impl<S> axum::extract::FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = session_token(&jar) else {
            return Err(ApiError::Unauthorized);
        };

        let app_state = AppState::from_ref(state);
        let identity = resolve_admin(&app_state, token)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(Self { identity })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/login` — exchange credentials for a session cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Result<(CookieJar, Json<AdminIdentity>), ApiError> {
    let Some(auth) = &state.auth else {
        return Err(AuthError::NotConfigured.into());
    };

    let session = auth.sign_in(body.email.trim(), &body.password).await?;
    let jar = store_session(jar, &session, state.cookie_secure);

    info!(user_id = %session.user.id, "admin signed in");
    Ok((jar, Json(session.user)))
}

/// `POST /api/auth/logout` — end the provider session, clear cookies.
///
/// Always clears the cookies, even if the provider call fails.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let (Some(auth), Some(token)) = (&state.auth, session_token(&jar)) {
        if let Err(e) = auth.sign_out(token).await {
            warn!(error = %e, "provider sign-out failed");
        }
    }

    let mut jar = jar;
    for name in [COOKIE_NAME, REFRESH_COOKIE_NAME] {
        let mut cookie = auth_cookie(name, String::new(), state.cookie_secure);
        cookie.set_max_age(Duration::ZERO);
        jar = jar.add(cookie);
    }
    (jar, StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me` — return the signed-in admin.
pub async fn me(admin: AdminUser) -> Json<AdminIdentity> {
    Json(admin.identity)
}

// =============================================================================
// ADMIN SESSION MIDDLEWARE
// =============================================================================

/// Requests for files (`/admin/assets/app.js`) carry no content and must
/// load on the login page too.
fn is_static_asset(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}

/// API routes that run as the signed-in admin.
fn is_admin_api(path: &str) -> bool {
    path.starts_with("/api/admin/") || path == "/api/auth/me"
}

/// Trade the refresh cookie for a new session when no access token is sent.
async fn refresh_session(state: &AppState, jar: &CookieJar) -> Option<AuthSession> {
    if session_token(jar).is_some() {
        return None;
    }
    let refresh_token = cookie_value(jar, REFRESH_COOKIE_NAME)?;
    let auth = state.auth.as_ref()?;
    match auth.refresh(refresh_token).await {
        Ok(Some(session)) => {
            info!(user_id = %session.user.id, "admin session refreshed");
            Some(session)
        }
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "admin session refresh failed");
            None
        }
    }
}

/// Point the request's `Cookie` header at a refreshed access token so the
/// handler sees the new session.
fn set_request_token(request: &mut Request, jar: &CookieJar, token: &str) {
    let jar = jar.clone().add(Cookie::new(COOKIE_NAME, token.to_owned()));
    let cookies = jar
        .iter()
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect::<Vec<_>>()
        .join("; ");
    if let Ok(value) = HeaderValue::from_str(&cookies) {
        request.headers_mut().insert(header::COOKIE, value);
    }
}

async fn page_authenticated(state: &AppState, jar: &CookieJar) -> bool {
    let Some(token) = session_token(jar) else {
        return false;
    };
    match resolve_admin(state, token).await {
        Ok(identity) => identity.is_some(),
        Err(e) => {
            warn!(error = %e, "admin session check failed");
            false
        }
    }
}

/// Middleware for admin pages and the admin API.
///
/// Renews an expired session from the refresh cookie, then applies [`gate`]
/// to admin pages. API requests are left to the [`AdminUser`] extractor. A
/// provider failure counts as signed out.
pub async fn admin_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let page = is_admin_path(path.trim_end_matches('/')) && !is_static_asset(&path);
    if !page && !is_admin_api(&path) {
        return next.run(request).await;
    }

    let refreshed = refresh_session(&state, &jar).await;
    if let Some(session) = &refreshed {
        set_request_token(&mut request, &jar, &session.access_token);
    }

    let response = if page {
        let authenticated = refreshed.is_some() || page_authenticated(&state, &jar).await;
        match gate(&path, authenticated) {
            GateDecision::Proceed => next.run(request).await,
            GateDecision::RedirectToLogin => Redirect::temporary(ADMIN_LOGIN_PATH).into_response(),
            GateDecision::RedirectToAdmin => Redirect::temporary(ADMIN_PATH).into_response(),
        }
    } else {
        next.run(request).await
    };

    match refreshed {
        Some(session) => (store_session(CookieJar::new(), &session, state.cookie_secure), response).into_response(),
        None => response,
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
