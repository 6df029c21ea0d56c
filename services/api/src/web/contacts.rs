//! services/api/src/web/contacts.rs
//!
//! The contact/lead recorder: customers record outreach, and each side of
//! the marketplace sees its own slice of the contact log.

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
use gramseva_core::domain::{ContactMethod, NewContact, UserRole};

#[derive(Debug, Default, Deserialize)]
pub struct ContactListParams {
    /// `provider` or `customer`; defaults to the caller's profile role.
    pub role: Option<String>,
}

/// Lists contacts for the caller, role-aware: providers see leads against
/// their provider record, customers see their own outreach.
#[utoipa::path(
    get,
    path = "/contacts",
    params(("role" = Option<String>, Query, description = "provider | customer")),
    responses(
        (status = 200, description = "Contacts, newest first"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<ContactListParams>,
) -> Result<Json<Value>, ApiError> {
    let role = match params.role.as_deref() {
        Some("provider") => UserRole::Provider,
        Some("customer") => UserRole::Customer,
        _ => state.store.get_profile(user_id).await?.role,
    };

    match role {
        UserRole::Provider => {
            // Leads are keyed by the provider *record* id, not the user id.
            // A provider-role user with no record yet simply has no leads.
            let Some(provider) = state.store.get_provider_by_owner(user_id).await? else {
                return Ok(Json(json!({ "contacts": [] })));
            };
            let leads = state.store.leads_for_provider(provider.id).await?;
            Ok(Json(json!({ "contacts": leads })))
        }
        UserRole::Customer => {
            let outreach = state.store.outreach_for_customer(user_id).await?;
            Ok(Json(json!({ "contacts": outreach })))
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateContactRequest {
    pub provider_id: Uuid,
    pub service_type: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub contact_method: Option<ContactMethod>,
}

/// Records one outreach event. Append-only: repeat contacts to the same
/// provider each get their own row.
#[utoipa::path(
    post,
    path = "/contacts",
    request_body = CreateContactRequest,
    responses(
        (status = 200, description = "Created contact"),
        (status = 400, description = "Unknown provider"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateContactRequest>,
) -> Result<Json<Value>, ApiError> {
    let contact = state
        .store
        .record_contact(NewContact {
            customer_id: user_id,
            provider_id: req.provider_id,
            service_type: req.service_type,
            message: req.message,
            contact_method: req.contact_method.unwrap_or(ContactMethod::Whatsapp),
        })
        .await?;
    Ok(Json(json!({ "contact": contact })))
}
