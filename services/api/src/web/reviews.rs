//! services/api/src/web/reviews.rs
//!
//! Review listing and creation. Every insert refreshes the provider's
//! rating aggregate in the same store operation.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::session::CurrentUser;
use crate::web::state::AppState;
use gramseva_core::domain::NewReview;

#[derive(Debug, Deserialize)]
pub struct ReviewListParams {
    pub provider_id: Option<Uuid>,
}

/// Lists a provider's reviews, newest first, with author names.
#[utoipa::path(
    get,
    path = "/reviews",
    params(("provider_id" = Option<Uuid>, Query, description = "Provider id (required)")),
    responses(
        (status = 200, description = "Reviews, newest first"),
        (status = 400, description = "provider_id missing")
    )
)]
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReviewListParams>,
) -> Result<Json<Value>, ApiError> {
    let provider_id = params
        .provider_id
        .ok_or_else(|| ApiError::validation("provider_id is required"))?;
    let reviews = state.store.reviews_for_provider(provider_id).await?;
    Ok(Json(json!({ "reviews": reviews })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub provider_id: Uuid,
    #[serde(default)]
    pub lead_id: Option<Uuid>,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Records a review and refreshes the provider's rating aggregate.
#[utoipa::path(
    post,
    path = "/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 200, description = "Created review"),
        (status = 400, description = "Rating out of range"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateReviewRequest>,
) -> Result<Json<Value>, ApiError> {
    if !(1..=5).contains(&req.rating) {
        return Err(ApiError::validation("Rating must be between 1 and 5"));
    }
    let review = state
        .store
        .create_review(NewReview {
            customer_id: user_id,
            provider_id: req.provider_id,
            lead_id: req.lead_id,
            rating: req.rating,
            comment: req.comment,
        })
        .await?;
    Ok(Json(json!({ "review": review })))
}
