//! services/api/src/web/providers.rs
//!
//! The provider directory and provider record endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::session::CurrentUser;
use crate::web::state::AppState;
use gramseva_core::catalog::ServiceCategory;
use gramseva_core::directory::{DirectoryQuery, Pagination};
use gramseva_core::domain::{NewProvider, ProviderPatch, ServiceAreaInput};
use gramseva_core::validation::validate_aadhaar;

/// Raw directory query parameters. Everything is optional and tolerant:
/// malformed numbers fall back to defaults instead of failing the request.
/// The one strict field is `category`, where an unknown value is a caller
/// error rather than an empty result.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub location: Option<String>,
    pub search: Option<String>,
    pub available: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

impl ListParams {
    fn into_query(self) -> Result<DirectoryQuery, ApiError> {
        let category = match self.category.as_deref().filter(|c| !c.is_empty()) {
            Some(raw) => Some(
                raw.parse::<ServiceCategory>()
                    .map_err(|e: String| ApiError::validation(e))?,
            ),
            None => None,
        };
        let available_only = self.available.as_deref() == Some("true");
        Ok(DirectoryQuery::new(
            category,
            self.location,
            self.search,
            available_only,
            self.page.and_then(|p| p.parse::<i64>().ok()),
            self.limit.and_then(|l| l.parse::<i64>().ok()),
            self.sort.as_deref(),
        ))
    }
}

/// Lists providers: filter, sort, paginate, joined with owner profiles.
#[utoipa::path(
    get,
    path = "/providers",
    params(
        ("category" = Option<String>, Query, description = "Service category key"),
        ("location" = Option<String>, Query, description = "Service area match"),
        ("search" = Option<String>, Query, description = "About substring or exact service"),
        ("available" = Option<String>, Query, description = "'true' to show available only"),
        ("page" = Option<String>, Query, description = "1-indexed page"),
        ("limit" = Option<String>, Query, description = "Page size, default 12"),
        ("sort" = Option<String>, Query, description = "rating | newest | price_low"),
    ),
    responses(
        (status = 200, description = "One page of listings with pagination metadata"),
        (status = 400, description = "Unknown category")
    )
)]
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let query = params.into_query()?;
    let (providers, total) = state.store.search_providers(&query).await?;
    let pagination = Pagination::new(query.page, query.page_size, total);
    Ok(Json(json!({
        "providers": providers,
        "pagination": pagination,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProviderRequest {
    pub service_category: String,
    #[serde(default)]
    pub specific_services: Vec<String>,
    #[serde(default)]
    pub experience_years: i32,
    #[serde(default)]
    pub price_min: Option<i32>,
    #[serde(default)]
    pub price_max: Option<i32>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub service_area: Option<ServiceAreaInput>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
    #[serde(default)]
    pub work_photos: Vec<String>,
    #[serde(default)]
    pub aadhaar_number: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

/// Registers the caller as a service provider.
#[utoipa::path(
    post,
    path = "/providers",
    request_body = CreateProviderRequest,
    responses(
        (status = 200, description = "Created provider record"),
        (status = 400, description = "Unknown category or invalid Aadhaar"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn create_provider(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateProviderRequest>,
) -> Result<Json<Value>, ApiError> {
    let service_category = req
        .service_category
        .parse::<ServiceCategory>()
        .map_err(|e: String| ApiError::validation(e))?;
    if let Some(aadhaar) = req.aadhaar_number.as_deref() {
        if !validate_aadhaar(aadhaar) {
            return Err(ApiError::validation(
                "Please enter a valid 12-digit Aadhaar number",
            ));
        }
    }

    let provider = state
        .store
        .create_provider(
            user_id,
            NewProvider {
                service_category,
                specific_services: req.specific_services,
                experience_years: req.experience_years,
                price_min: req.price_min,
                price_max: req.price_max,
                service_area: req.service_area.map(ServiceAreaInput::into_vec).unwrap_or_default(),
                about: req.about,
                profile_photo_url: req.profile_photo_url,
                work_photos: req.work_photos,
                aadhaar_number: req.aadhaar_number,
                is_available: req.is_available,
            },
        )
        .await?;
    info!(provider_id = %provider.id, owner = %user_id, "provider registered");
    Ok(Json(json!({ "provider": provider })))
}

/// One provider's page: record, owner profile and reviews. Each fetch counts
/// as a view; the body carries the pre-increment count.
#[utoipa::path(
    get,
    path = "/providers/{id}",
    params(("id" = Uuid, Path, description = "Provider id")),
    responses(
        (status = 200, description = "Provider with reviews"),
        (status = 404, description = "No such provider")
    )
)]
pub async fn get_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let detail = state.store.get_provider_detail(id).await?;
    state.store.increment_view_count(id).await?;
    Ok(Json(json!({ "provider": detail })))
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProviderRequest {
    #[serde(default)]
    pub service_category: Option<String>,
    #[serde(default)]
    pub specific_services: Option<Vec<String>>,
    #[serde(default)]
    pub experience_years: Option<i32>,
    #[serde(default)]
    pub price_min: Option<i32>,
    #[serde(default)]
    pub price_max: Option<i32>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub service_area: Option<ServiceAreaInput>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
    #[serde(default)]
    pub work_photos: Option<Vec<String>>,
    #[serde(default)]
    pub is_available: Option<bool>,
}

/// Updates an owned provider record. The patch is a fixed allow-list:
/// derived fields and verification status never pass through here.
#[utoipa::path(
    put,
    path = "/providers/{id}",
    params(("id" = Uuid, Path, description = "Provider id")),
    request_body = UpdateProviderRequest,
    responses(
        (status = 200, description = "Updated provider record"),
        (status = 403, description = "Caller does not own this record"),
        (status = 404, description = "No such provider")
    )
)]
pub async fn update_provider(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProviderRequest>,
) -> Result<Json<Value>, ApiError> {
    // Ownership is checked before any write.
    let existing = state.store.get_provider(id).await?;
    if existing.user_id != user_id {
        return Err(ApiError::forbidden(
            "You can only update your own provider profile",
        ));
    }

    let service_category = match req.service_category.as_deref() {
        Some(raw) => Some(
            raw.parse::<ServiceCategory>()
                .map_err(|e: String| ApiError::validation(e))?,
        ),
        None => None,
    };
    let patch = ProviderPatch {
        service_category,
        specific_services: req.specific_services,
        experience_years: req.experience_years,
        price_min: req.price_min,
        price_max: req.price_max,
        service_area: req.service_area.map(ServiceAreaInput::into_vec),
        about: req.about,
        profile_photo_url: req.profile_photo_url,
        work_photos: req.work_photos,
        is_available: req.is_available,
    };

    let provider = state.store.update_provider(id, patch).await?;
    Ok(Json(json!({ "provider": provider })))
}
