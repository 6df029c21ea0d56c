//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use crate::web::{auth, contacts, providers, reviews, saved, upload};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GramSeva API",
        description = "Local services marketplace: provider directory, leads, reviews and bookmarks."
    ),
    paths(
        providers::list_providers,
        providers::create_provider,
        providers::get_provider,
        providers::update_provider,
        reviews::list_reviews,
        reviews::create_review,
        contacts::list_contacts,
        contacts::create_contact,
        saved::list_saved,
        saved::save_provider,
        saved::remove_saved,
        upload::upload,
        auth::signup,
        auth::login,
        auth::current_session,
        auth::logout,
    ),
    components(schemas(
        providers::CreateProviderRequest,
        providers::UpdateProviderRequest,
        reviews::CreateReviewRequest,
        contacts::CreateContactRequest,
        saved::SaveProviderRequest,
        auth::SignupRequest,
        auth::LoginRequest,
    )),
    tags(
        (name = "providers", description = "Directory and provider records"),
        (name = "reviews", description = "Reviews and rating aggregates"),
        (name = "contacts", description = "Leads and outreach"),
        (name = "saved", description = "Saved providers"),
        (name = "auth", description = "Accounts and sessions"),
    )
)]
pub struct ApiDoc;
