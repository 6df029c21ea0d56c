//! crates/gramseva_core/src/domain.rs
//!
//! Defines the pure, core data structures for the marketplace.
//! These structs are independent of any database schema; the adapters map
//! their own record types into these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ServiceCategory;

//=========================================================================================
// Closed enums
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Provider,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Provider => "provider",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(UserRole::Customer),
            "provider" => Ok(UserRole::Provider),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    Whatsapp,
    Call,
}

impl ContactMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactMethod::Whatsapp => "whatsapp",
            ContactMethod::Call => "call",
        }
    }
}

impl std::str::FromStr for ContactMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "whatsapp" => Ok(ContactMethod::Whatsapp),
            "call" => Ok(ContactMethod::Call),
            other => Err(format!("unknown contact method: {other}")),
        }
    }
}

/// Lifecycle of a lead. This core only ever writes `New`; the later states
/// exist in the schema but have no transition endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    New,
    Contacted,
    Completed,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::New => "new",
            ContactStatus::Contacted => "contacted",
            ContactStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ContactStatus::New),
            "contacted" => Ok(ContactStatus::Contacted),
            "completed" => Ok(ContactStatus::Completed),
            other => Err(format!("unknown contact status: {other}")),
        }
    }
}

//=========================================================================================
// Entities
//=========================================================================================

/// One per authenticated identity. The id equals the identity subject id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub whatsapp_number: Option<String>,
    pub village: Option<String>,
    pub block: Option<String>,
    pub district: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The public slice of a profile that is allowed to cross to other parties
/// (directory listings, lead views).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub whatsapp_number: Option<String>,
    pub village: Option<String>,
    pub block: Option<String>,
    pub district: Option<String>,
}

impl From<Profile> for PublicProfile {
    fn from(p: Profile) -> Self {
        PublicProfile {
            id: p.id,
            full_name: p.full_name,
            phone: p.phone,
            whatsapp_number: p.whatsapp_number,
            village: p.village,
            block: p.block,
            district: p.district,
        }
    }
}

/// A provider record. `rating_avg`, `rating_count` and `view_count` are
/// derived fields maintained only by the store adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_category: ServiceCategory,
    pub specific_services: Vec<String>,
    pub experience_years: i32,
    pub price_min: Option<i32>,
    pub price_max: Option<i32>,
    pub service_area: Vec<String>,
    pub about: Option<String>,
    pub profile_photo_url: Option<String>,
    pub work_photos: Vec<String>,
    pub aadhaar_number: Option<String>,
    pub is_available: bool,
    pub is_verified: bool,
    pub rating_avg: f64,
    pub rating_count: i64,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A directory row: the provider joined with the owner's public profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderListing {
    #[serde(flatten)]
    pub provider: ServiceProvider,
    pub profile: PublicProfile,
}

/// A single provider page: listing plus its reviews, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderDetail {
    #[serde(flatten)]
    pub provider: ServiceProvider,
    pub profile: PublicProfile,
    pub reviews: Vec<ReviewWithAuthor>,
}

/// One customer-initiated outreach event. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub service_type: String,
    pub message: Option<String>,
    pub contact_method: ContactMethod,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
}

/// A contact as the provider sees it: joined with the customer's public
/// profile fields.
#[derive(Debug, Clone, Serialize)]
pub struct Lead {
    #[serde(flatten)]
    pub contact: Contact,
    pub customer: PublicProfile,
}

/// The provider-side summary shown to the customer who reached out.
#[derive(Debug, Clone, Serialize)]
pub struct OutreachProvider {
    pub provider_id: Uuid,
    pub service_category: ServiceCategory,
    pub full_name: String,
    pub phone: String,
}

/// A contact as the customer sees it.
#[derive(Debug, Clone, Serialize)]
pub struct Outreach {
    #[serde(flatten)]
    pub contact: Contact,
    pub provider: OutreachProvider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub customer_id: Uuid,
    pub lead_id: Option<Uuid>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub author_name: String,
}

// Only used internally for login - contains sensitive data.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
}

//=========================================================================================
// Write payloads
//=========================================================================================

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub full_name: String,
    pub phone: String,
    pub whatsapp_number: Option<String>,
    pub village: Option<String>,
    pub block: Option<String>,
    pub district: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct NewProvider {
    pub service_category: ServiceCategory,
    pub specific_services: Vec<String>,
    pub experience_years: i32,
    pub price_min: Option<i32>,
    pub price_max: Option<i32>,
    pub service_area: Vec<String>,
    pub about: Option<String>,
    pub profile_photo_url: Option<String>,
    pub work_photos: Vec<String>,
    pub aadhaar_number: Option<String>,
    pub is_available: bool,
}

/// The fixed allow-list of owner-mutable provider fields. Derived fields
/// (ratings, views) and `is_verified` are deliberately absent.
#[derive(Debug, Clone, Default)]
pub struct ProviderPatch {
    pub service_category: Option<ServiceCategory>,
    pub specific_services: Option<Vec<String>>,
    pub experience_years: Option<i32>,
    pub price_min: Option<i32>,
    pub price_max: Option<i32>,
    pub service_area: Option<Vec<String>>,
    pub about: Option<String>,
    pub profile_photo_url: Option<String>,
    pub work_photos: Option<Vec<String>>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub service_type: String,
    pub message: Option<String>,
    pub contact_method: ContactMethod,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub lead_id: Option<Uuid>,
    pub rating: i32,
    pub comment: Option<String>,
}

/// Service areas arrive either as a list or as one comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServiceAreaInput {
    List(Vec<String>),
    Csv(String),
}

impl ServiceAreaInput {
    /// Normalizes to a trimmed list, dropping empty entries.
    pub fn into_vec(self) -> Vec<String> {
        let raw = match self {
            ServiceAreaInput::List(items) => items,
            ServiceAreaInput::Csv(s) => s.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
