//! services/api/src/web/saved.rs
//!
//! The saved-providers registry: a customer's bookmark list.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::session::CurrentUser;
use crate::web::state::AppState;

/// Lists the caller's saved providers as full listings.
#[utoipa::path(
    get,
    path = "/saved",
    responses(
        (status = 200, description = "Saved provider listings"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_saved(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let ids = state.store.saved_provider_ids(user_id).await?;
    // Zero saved short-circuits: no second fetch.
    if ids.is_empty() {
        return Ok(Json(json!({ "providers": [] })));
    }
    let providers = state.store.providers_by_ids(&ids).await?;
    Ok(Json(json!({ "providers": providers })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveProviderRequest {
    pub provider_id: Uuid,
}

/// Saves a provider. Saving the same provider twice is a no-op.
#[utoipa::path(
    post,
    path = "/saved",
    request_body = SaveProviderRequest,
    responses(
        (status = 200, description = "Saved"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn save_provider(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<SaveProviderRequest>,
) -> Result<Json<Value>, ApiError> {
    state.store.save_provider(user_id, req.provider_id).await?;
    Ok(Json(json!({ "success": true })))
}

/// Removes a saved provider. Removing an absent pair still succeeds.
#[utoipa::path(
    delete,
    path = "/saved/{provider_id}",
    params(("provider_id" = Uuid, Path, description = "Provider id")),
    responses(
        (status = 200, description = "Removed"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn remove_saved(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .remove_saved_provider(user_id, provider_id)
        .await?;
    Ok(Json(json!({ "success": true })))
}
