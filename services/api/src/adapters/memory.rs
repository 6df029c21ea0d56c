//! services/api/src/adapters/memory.rs
//!
//! In-memory implementations of the `StoreService` and `ObjectStorageService`
//! ports. These back the integration tests so the whole HTTP surface can be
//! exercised without Postgres or S3.
//!
//! All state lives behind one `RwLock`, so every write method holds a single
//! write guard for its whole critical section. That gives the same guarantees
//! the Postgres adapter gets from its transactions: no lost view-count
//! updates and a rating aggregate that always matches the review rows.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use gramseva_core::directory::{DirectoryQuery, SortKey};
use gramseva_core::domain::{
    Contact, ContactStatus, Credentials, Lead, NewContact, NewProfile, NewProvider, NewReview,
    Outreach, OutreachProvider, Profile, ProviderDetail, ProviderListing, ProviderPatch,
    PublicProfile, Review, ReviewWithAuthor, ServiceProvider,
};
use gramseva_core::ports::{
    ObjectStorageService, PortError, PortResult, StoreService, StoredObject,
};

#[derive(Default)]
struct State {
    profiles: Vec<Profile>,
    credentials: Vec<Credentials>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    providers: Vec<ServiceProvider>,
    contacts: Vec<Contact>,
    reviews: Vec<Review>,
    saved: Vec<(Uuid, Uuid, DateTime<Utc>)>,
}

impl State {
    fn profile(&self, id: Uuid) -> PortResult<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Profile {id} not found")))
    }

    fn provider(&self, id: Uuid) -> PortResult<&ServiceProvider> {
        self.providers
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Provider {id} not found")))
    }

    fn provider_mut(&mut self, id: Uuid) -> PortResult<&mut ServiceProvider> {
        self.providers
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Provider {id} not found")))
    }

    fn listing(&self, provider: &ServiceProvider) -> PortResult<ProviderListing> {
        let owner = self.profile(provider.user_id)?;
        Ok(ProviderListing {
            provider: provider.clone(),
            profile: PublicProfile::from(owner.clone()),
        })
    }

    fn reviews_with_authors(&self, provider_id: Uuid) -> PortResult<Vec<ReviewWithAuthor>> {
        let mut rows: Vec<&Review> = self
            .reviews
            .iter()
            .filter(|r| r.provider_id == provider_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter()
            .map(|r| {
                Ok(ReviewWithAuthor {
                    review: r.clone(),
                    author_name: self.profile(r.customer_id)?.full_name.clone(),
                })
            })
            .collect()
    }
}

/// A store that keeps everything in process memory, in insertion order.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(provider: &ServiceProvider, query: &DirectoryQuery) -> bool {
    if let Some(category) = query.category {
        if provider.service_category != category {
            return false;
        }
    }
    if let Some(location) = &query.location {
        if !provider.service_area.iter().any(|a| a == location) {
            return false;
        }
    }
    if query.available_only && !provider.is_available {
        return false;
    }
    if let Some(term) = &query.search {
        let in_about = provider
            .about
            .as_deref()
            .map(|a| a.to_lowercase().contains(&term.to_lowercase()))
            .unwrap_or(false);
        let in_services = provider.specific_services.iter().any(|s| s == term);
        if !in_about && !in_services {
            return false;
        }
    }
    true
}

fn apply_sort(providers: &mut [ServiceProvider], sort: Option<SortKey>) {
    match sort {
        Some(SortKey::Rating) => providers.sort_by(|a, b| {
            b.rating_avg
                .partial_cmp(&a.rating_avg)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        Some(SortKey::Newest) => providers.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        Some(SortKey::PriceLow) => providers.sort_by(|a, b| match (a.price_min, b.price_min) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }),
        // Unknown sort key: insertion order stands.
        None => {}
    }
}

#[async_trait]
impl StoreService for InMemoryStore {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        profile: NewProfile,
    ) -> PortResult<Profile> {
        let mut state = self.state.write().await;
        if state.credentials.iter().any(|c| c.email == email) {
            return Err(PortError::Validation(format!(
                "duplicate record: account {email} already exists"
            )));
        }
        let now = Utc::now();
        let record = Profile {
            id: Uuid::new_v4(),
            full_name: profile.full_name,
            phone: profile.phone,
            whatsapp_number: profile.whatsapp_number,
            village: profile.village,
            block: profile.block,
            district: profile.district,
            role: profile.role,
            created_at: now,
            updated_at: now,
        };
        state.credentials.push(Credentials {
            user_id: record.id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        });
        state.profiles.push(record.clone());
        Ok(record)
    }

    async fn get_profile(&self, user_id: Uuid) -> PortResult<Profile> {
        let state = self.state.read().await;
        state.profile(user_id).cloned()
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<Credentials> {
        let state = self.state.read().await;
        state
            .credentials
            .iter()
            .find(|c| c.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("No account for {email}")))
    }

    async fn profile_id_by_phone(&self, phone: &str) -> PortResult<Option<Uuid>> {
        let state = self.state.read().await;
        Ok(state.profiles.iter().find(|p| p.phone == phone).map(|p| p.id))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut state = self.state.write().await;
        state
            .sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let state = self.state.read().await;
        match state.sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        let mut state = self.state.write().await;
        state.sessions.remove(session_id);
        Ok(())
    }

    async fn search_providers(
        &self,
        query: &DirectoryQuery,
    ) -> PortResult<(Vec<ProviderListing>, u64)> {
        let state = self.state.read().await;
        let mut matched: Vec<ServiceProvider> = state
            .providers
            .iter()
            .filter(|p| matches(p, query))
            .cloned()
            .collect();
        let total = matched.len() as u64;
        apply_sort(&mut matched, query.sort);

        let page: Vec<ProviderListing> = matched
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .map(|p| state.listing(&p))
            .collect::<PortResult<Vec<_>>>()?;
        Ok((page, total))
    }

    async fn create_provider(
        &self,
        owner_id: Uuid,
        new: NewProvider,
    ) -> PortResult<ServiceProvider> {
        let mut state = self.state.write().await;
        state.profile(owner_id)?;
        let now = Utc::now();
        let record = ServiceProvider {
            id: Uuid::new_v4(),
            user_id: owner_id,
            service_category: new.service_category,
            specific_services: new.specific_services,
            experience_years: new.experience_years,
            price_min: new.price_min,
            price_max: new.price_max,
            service_area: new.service_area,
            about: new.about,
            profile_photo_url: new.profile_photo_url,
            work_photos: new.work_photos,
            aadhaar_number: new.aadhaar_number,
            is_available: new.is_available,
            is_verified: false,
            rating_avg: 0.0,
            rating_count: 0,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };
        state.providers.push(record.clone());
        Ok(record)
    }

    async fn get_provider(&self, id: Uuid) -> PortResult<ServiceProvider> {
        let state = self.state.read().await;
        state.provider(id).cloned()
    }

    async fn get_provider_by_owner(&self, user_id: Uuid) -> PortResult<Option<ServiceProvider>> {
        let state = self.state.read().await;
        Ok(state.providers.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn get_provider_detail(&self, id: Uuid) -> PortResult<ProviderDetail> {
        let state = self.state.read().await;
        let provider = state.provider(id)?;
        let listing = state.listing(provider)?;
        let reviews = state.reviews_with_authors(id)?;
        Ok(ProviderDetail {
            provider: listing.provider,
            profile: listing.profile,
            reviews,
        })
    }

    async fn increment_view_count(&self, id: Uuid) -> PortResult<()> {
        let mut state = self.state.write().await;
        let provider = state.provider_mut(id)?;
        provider.view_count += 1;
        Ok(())
    }

    async fn update_provider(
        &self,
        id: Uuid,
        patch: ProviderPatch,
    ) -> PortResult<ServiceProvider> {
        let mut state = self.state.write().await;
        let provider = state.provider_mut(id)?;
        if let Some(v) = patch.service_category {
            provider.service_category = v;
        }
        if let Some(v) = patch.specific_services {
            provider.specific_services = v;
        }
        if let Some(v) = patch.experience_years {
            provider.experience_years = v;
        }
        if let Some(v) = patch.price_min {
            provider.price_min = Some(v);
        }
        if let Some(v) = patch.price_max {
            provider.price_max = Some(v);
        }
        if let Some(v) = patch.service_area {
            provider.service_area = v;
        }
        if let Some(v) = patch.about {
            provider.about = Some(v);
        }
        if let Some(v) = patch.profile_photo_url {
            provider.profile_photo_url = Some(v);
        }
        if let Some(v) = patch.work_photos {
            provider.work_photos = v;
        }
        if let Some(v) = patch.is_available {
            provider.is_available = v;
        }
        provider.updated_at = Utc::now();
        Ok(provider.clone())
    }

    async fn record_contact(&self, new: NewContact) -> PortResult<Contact> {
        let mut state = self.state.write().await;
        state.provider(new.provider_id)?;
        let record = Contact {
            id: Uuid::new_v4(),
            customer_id: new.customer_id,
            provider_id: new.provider_id,
            service_type: new.service_type,
            message: new.message,
            contact_method: new.contact_method,
            status: ContactStatus::New,
            created_at: Utc::now(),
        };
        state.contacts.push(record.clone());
        Ok(record)
    }

    async fn leads_for_provider(&self, provider_id: Uuid) -> PortResult<Vec<Lead>> {
        let state = self.state.read().await;
        let mut rows: Vec<&Contact> = state
            .contacts
            .iter()
            .filter(|c| c.provider_id == provider_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter()
            .map(|c| {
                Ok(Lead {
                    contact: c.clone(),
                    customer: PublicProfile::from(state.profile(c.customer_id)?.clone()),
                })
            })
            .collect()
    }

    async fn outreach_for_customer(&self, customer_id: Uuid) -> PortResult<Vec<Outreach>> {
        let state = self.state.read().await;
        let mut rows: Vec<&Contact> = state
            .contacts
            .iter()
            .filter(|c| c.customer_id == customer_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter()
            .map(|c| {
                let provider = state.provider(c.provider_id)?;
                let owner = state.profile(provider.user_id)?;
                Ok(Outreach {
                    contact: c.clone(),
                    provider: OutreachProvider {
                        provider_id: provider.id,
                        service_category: provider.service_category,
                        full_name: owner.full_name.clone(),
                        phone: owner.phone.clone(),
                    },
                })
            })
            .collect()
    }

    async fn create_review(&self, new: NewReview) -> PortResult<Review> {
        // Insert and recompute under one write guard, mirroring the
        // transactional recompute in the Postgres adapter.
        let mut state = self.state.write().await;
        state.provider(new.provider_id)?;
        let now = Utc::now();
        let record = Review {
            id: Uuid::new_v4(),
            provider_id: new.provider_id,
            customer_id: new.customer_id,
            lead_id: new.lead_id,
            rating: new.rating,
            comment: new.comment,
            created_at: now,
            updated_at: now,
        };
        state.reviews.push(record.clone());

        let ratings: Vec<i32> = state
            .reviews
            .iter()
            .filter(|r| r.provider_id == new.provider_id)
            .map(|r| r.rating)
            .collect();
        let provider = state.provider_mut(new.provider_id)?;
        provider.rating_count = ratings.len() as i64;
        provider.rating_avg = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().sum::<i32>() as f64 / ratings.len() as f64
        };
        Ok(record)
    }

    async fn reviews_for_provider(&self, provider_id: Uuid) -> PortResult<Vec<ReviewWithAuthor>> {
        let state = self.state.read().await;
        state.reviews_with_authors(provider_id)
    }

    async fn save_provider(&self, customer_id: Uuid, provider_id: Uuid) -> PortResult<()> {
        let mut state = self.state.write().await;
        state.provider(provider_id)?;
        let exists = state
            .saved
            .iter()
            .any(|(c, p, _)| *c == customer_id && *p == provider_id);
        if !exists {
            state.saved.push((customer_id, provider_id, Utc::now()));
        }
        Ok(())
    }

    async fn remove_saved_provider(&self, customer_id: Uuid, provider_id: Uuid) -> PortResult<()> {
        let mut state = self.state.write().await;
        state
            .saved
            .retain(|(c, p, _)| !(*c == customer_id && *p == provider_id));
        Ok(())
    }

    async fn saved_provider_ids(&self, customer_id: Uuid) -> PortResult<Vec<Uuid>> {
        let state = self.state.read().await;
        let mut rows: Vec<(Uuid, DateTime<Utc>)> = state
            .saved
            .iter()
            .filter(|(c, _, _)| *c == customer_id)
            .map(|(_, p, at)| (*p, *at))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(rows.into_iter().map(|(p, _)| p).collect())
    }

    async fn providers_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<ProviderListing>> {
        let state = self.state.read().await;
        state
            .providers
            .iter()
            .filter(|p| ids.contains(&p.id))
            .map(|p| state.listing(p))
            .collect()
    }
}

/// Object storage that records uploads in a map. Returned URLs use a
/// `memory://` scheme so tests can assert on the key layout.
#[derive(Default, Clone)]
pub struct InMemoryStorage {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectStorageService for InMemoryStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> PortResult<StoredObject> {
        let mut objects = self.objects.write().await;
        objects.insert(format!("{bucket}/{key}"), bytes);
        Ok(StoredObject {
            url: format!("memory://{bucket}/{key}"),
            path: key.to_string(),
        })
    }
}
