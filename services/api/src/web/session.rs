//! services/api/src/web/session.rs
//!
//! Cookie-backed session handling: the `CurrentUser` extractor resolves the
//! `session` cookie to a user id, rejecting missing, unknown or expired
//! sessions with 401.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// The authenticated caller. Add this as a handler argument to require a
/// valid session on that route.
pub struct CurrentUser(pub Uuid);

fn session_id_from_headers(parts: &Parts) -> Option<&str> {
    let raw = parts.headers.get(COOKIE)?.to_str().ok()?;
    session_id_from_cookie_header(raw)
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session_id = session_id_from_headers(parts).ok_or_else(ApiError::unauthorized)?;
        let user_id = state.store.validate_auth_session(session_id).await?;
        Ok(CurrentUser(user_id))
    }
}

/// Builds the `Set-Cookie` value for a fresh session.
pub fn session_cookie(session_id: &str, max_age_days: i64) -> String {
    format!(
        "{SESSION_COOKIE}={session_id}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        max_age_days * 24 * 60 * 60
    )
}

/// Builds the `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Extracts the session id from a raw Cookie header value, for routes that
/// act on the session itself (logout).
pub fn session_id_from_cookie_header(raw: &str) -> Option<&str> {
    raw.split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("session="))
        .filter(|v| !v.is_empty())
}
