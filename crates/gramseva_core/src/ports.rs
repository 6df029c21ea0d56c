//! crates/gramseva_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the marketplace core.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete database and object storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::directory::DirectoryQuery;
use crate::domain::{
    Contact, Credentials, Lead, NewContact, NewProfile, NewProvider, NewReview, Outreach, Profile,
    ProviderDetail, ProviderListing, ProviderPatch, Review, ReviewWithAuthor, ServiceProvider,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by all port operations. Adapters translate
/// backend-specific failures into these variants.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Store Port
//=========================================================================================

/// The relational store behind every request handler. One wide contract so a
/// single adapter (Postgres in production, in-memory in tests) backs the
/// whole pipeline.
#[async_trait]
pub trait StoreService: Send + Sync {
    // --- Identity & sessions ---
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        profile: NewProfile,
    ) -> PortResult<Profile>;

    async fn get_profile(&self, user_id: Uuid) -> PortResult<Profile>;

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<Credentials>;

    async fn profile_id_by_phone(&self, phone: &str) -> PortResult<Option<Uuid>>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Directory ---
    /// Runs the filter/sort/paginate pipeline. Returns one page of listings
    /// joined with owner profiles, plus the total pre-pagination match count.
    async fn search_providers(
        &self,
        query: &DirectoryQuery,
    ) -> PortResult<(Vec<ProviderListing>, u64)>;

    // --- Provider records ---
    async fn create_provider(
        &self,
        owner_id: Uuid,
        new: NewProvider,
    ) -> PortResult<ServiceProvider>;

    async fn get_provider(&self, id: Uuid) -> PortResult<ServiceProvider>;

    async fn get_provider_by_owner(&self, user_id: Uuid) -> PortResult<Option<ServiceProvider>>;

    /// Provider joined with its owner profile and reviews, newest first.
    async fn get_provider_detail(&self, id: Uuid) -> PortResult<ProviderDetail>;

    /// Adds exactly 1 to the provider's view count. Must be free of lost
    /// updates under concurrent callers.
    async fn increment_view_count(&self, id: Uuid) -> PortResult<()>;

    /// Applies an allow-listed patch. Ownership is checked by the caller
    /// before this is invoked.
    async fn update_provider(&self, id: Uuid, patch: ProviderPatch)
        -> PortResult<ServiceProvider>;

    // --- Contacts / leads ---
    async fn record_contact(&self, new: NewContact) -> PortResult<Contact>;

    async fn leads_for_provider(&self, provider_id: Uuid) -> PortResult<Vec<Lead>>;

    async fn outreach_for_customer(&self, customer_id: Uuid) -> PortResult<Vec<Outreach>>;

    // --- Reviews ---
    /// Inserts the review and refreshes the provider's rating_avg and
    /// rating_count as one consistent update: after N concurrent inserts the
    /// aggregate must equal the true count and mean.
    async fn create_review(&self, new: NewReview) -> PortResult<Review>;

    async fn reviews_for_provider(&self, provider_id: Uuid) -> PortResult<Vec<ReviewWithAuthor>>;

    // --- Saved providers ---
    /// Idempotent: a second save of the same pair is a no-op.
    async fn save_provider(&self, customer_id: Uuid, provider_id: Uuid) -> PortResult<()>;

    /// Removing a pair that does not exist is not an error.
    async fn remove_saved_provider(&self, customer_id: Uuid, provider_id: Uuid) -> PortResult<()>;

    async fn saved_provider_ids(&self, customer_id: Uuid) -> PortResult<Vec<Uuid>>;

    async fn providers_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<ProviderListing>>;
}

//=========================================================================================
// Object Storage Port
//=========================================================================================

/// The stored object's addressable location.
#[derive(Debug, Clone, Serialize)]
pub struct StoredObject {
    pub url: String,
    pub path: String,
}

/// Binary object storage for profile and work photos. Validation happens
/// before this port is reached; implementations only move bytes.
#[async_trait]
pub trait ObjectStorageService: Send + Sync {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> PortResult<StoredObject>;
}
