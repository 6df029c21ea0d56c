//! The web layer: routing, session extraction, request/response shapes.

pub mod auth;
pub mod contacts;
pub mod docs;
pub mod providers;
pub mod reviews;
pub mod saved;
pub mod session;
pub mod state;
pub mod upload;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;

use state::AppState;

/// Builds the application router. Kept separate from server startup so
/// integration tests can drive the exact production routes in-process.
pub fn app_router(state: Arc<AppState>) -> Router {
    // Leave headroom over the image limit so oversized files reach the
    // validation layer and fail with the 400 body instead of a bare 413.
    let body_limit = state.config.max_upload_bytes + 64 * 1024;

    Router::new()
        .route(
            "/providers",
            get(providers::list_providers).post(providers::create_provider),
        )
        .route(
            "/providers/{id}",
            get(providers::get_provider).put(providers::update_provider),
        )
        .route(
            "/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route(
            "/contacts",
            get(contacts::list_contacts).post(contacts::create_contact),
        )
        .route("/saved", get(saved::list_saved).post(saved::save_provider))
        .route("/saved/{provider_id}", delete(saved::remove_saved))
        .route("/upload", post(upload::upload))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/session", get(auth::current_session))
        .route("/auth/logout", post(auth::logout))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
