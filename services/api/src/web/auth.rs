//! services/api/src/web/auth.rs
//!
//! Signup, login and logout. Sessions are stored server-side and referenced
//! by an HttpOnly cookie.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Response};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::session::{clear_session_cookie, session_cookie, session_id_from_cookie_header};
use crate::web::state::AppState;
use gramseva_core::domain::{NewProfile, UserRole};
use gramseva_core::ports::PortError;
use gramseva_core::validation::validate_phone;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    pub role: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

async fn issue_session(
    state: &AppState,
    user_id: Uuid,
) -> Result<String, ApiError> {
    let session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(state.config.session_days);
    state
        .store
        .create_auth_session(&session_id, user_id, expires_at)
        .await?;
    Ok(session_cookie(&session_id, state.config.session_days))
}

/// Creates an account: profile, credentials and a first session.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created; session cookie set"),
        (status = 400, description = "Invalid phone, role, or duplicate email")
    )
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<Response, ApiError> {
    if !validate_phone(&req.phone) {
        return Err(ApiError::validation(
            "Please enter a valid 10-digit mobile number",
        ));
    }
    if req.password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters",
        ));
    }
    let role: UserRole = req
        .role
        .parse()
        .map_err(|e: String| ApiError::validation(e))?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?
        .to_string();

    let profile = state
        .store
        .create_user(
            &req.email,
            &password_hash,
            NewProfile {
                full_name: req.full_name,
                phone: req.phone,
                whatsapp_number: req.whatsapp_number,
                village: req.village,
                block: req.block,
                district: req.district,
                role,
            },
        )
        .await?;
    info!(user_id = %profile.id, "account created");

    let cookie = issue_session(&state, profile.id).await?;
    Ok(([(SET_COOKIE, cookie)], Json(profile)).into_response())
}

/// Verifies credentials and opens a new session.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session cookie set"),
        (status = 400, description = "Phone-only login attempted"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let Some(email) = req.email.as_deref().filter(|e| !e.is_empty()) else {
        // Phone-only login is a guidance case, not an auth failure: accounts
        // are keyed by email, the phone is profile data.
        if let Some(phone) = req.phone.as_deref().filter(|p| !p.is_empty()) {
            let msg = if state.store.profile_id_by_phone(phone).await?.is_some() {
                "An account with this phone exists. Please sign in with the email you registered."
            } else {
                "No account found for this phone. Please sign in with your email."
            };
            return Err(ApiError::validation(msg));
        }
        return Err(ApiError::validation("Email is required"));
    };
    let password = req
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation("Password is required"))?;

    let credentials = match state.store.get_credentials_by_email(email).await {
        Ok(c) => c,
        // Not-found folds into the same non-identifying 401.
        Err(PortError::NotFound(_)) => return Err(ApiError::unauthorized()),
        Err(e) => return Err(e.into()),
    };

    let parsed = PasswordHash::new(&credentials.password_hash)
        .map_err(|e| ApiError::Internal(format!("stored hash unreadable: {e}")))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_err()
    {
        return Err(ApiError::unauthorized());
    }

    let profile = state.store.get_profile(credentials.user_id).await?;
    let cookie = issue_session(&state, profile.id).await?;
    Ok(([(SET_COOKIE, cookie)], Json(profile)).into_response())
}

/// Reports who is signed in, so a client can restore its state on load.
/// A missing, unknown or expired session is not an error here: the body is
/// `{"user": null}` with 200.
#[utoipa::path(
    get,
    path = "/auth/session",
    responses((status = 200, description = "Current profile, or null when signed out"))
)]
pub async fn current_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let Some(session_id) = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_id_from_cookie_header)
    else {
        return Ok(Json(json!({ "user": null })));
    };
    match state.store.validate_auth_session(session_id).await {
        Ok(user_id) => {
            let profile = state.store.get_profile(user_id).await?;
            Ok(Json(json!({ "user": profile })))
        }
        Err(PortError::Unauthorized) => Ok(Json(json!({ "user": null }))),
        Err(e) => Err(e.into()),
    }
}

/// Deletes the session row and clears the cookie. Always succeeds.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Session cleared"))
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(session_id) = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_id_from_cookie_header)
    {
        state.store.delete_auth_session(session_id).await?;
    }
    Ok((
        [(SET_COOKIE, clear_session_cookie())],
        Json(json!({ "success": true })),
    )
        .into_response())
}
