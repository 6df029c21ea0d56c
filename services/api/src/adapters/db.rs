//! services/api/src/adapters/db.rs
//!
//! The Postgres adapter: the concrete implementation of the `StoreService`
//! port using `sqlx`. Queries use the runtime API so the directory pipeline
//! can compose its WHERE/ORDER clauses dynamically.
//!
//! The two contended derived fields are kept consistent here: view counts
//! via a single in-place `view_count + 1` update, and the rating aggregate
//! via a transactional recompute on every review insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use gramseva_core::directory::{DirectoryQuery, SortKey};
use gramseva_core::domain::{
    Contact, Credentials, Lead, NewContact, NewProfile, NewProvider, NewReview, Outreach,
    OutreachProvider, Profile, ProviderDetail, ProviderListing, ProviderPatch, PublicProfile,
    Review, ReviewWithAuthor, ServiceProvider,
};
use gramseva_core::ports::{PortError, PortResult, StoreService};

/// A store adapter backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn map_db_err(e: sqlx::Error) -> PortError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return PortError::Validation(format!("duplicate record: {}", db.message()));
        }
        if db.is_foreign_key_violation() {
            return PortError::Validation(format!("unknown reference: {}", db.message()));
        }
    }
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const PROFILE_SELECT: &str = "id, full_name, phone, whatsapp_number, village, block, district, \
     role, created_at, updated_at";

const PROVIDER_SELECT: &str = "sp.id, sp.user_id, sp.service_category, sp.specific_services, \
     sp.experience_years, sp.price_min, sp.price_max, sp.service_area, sp.about, \
     sp.profile_photo_url, sp.work_photos, sp.aadhaar_number, sp.is_available, sp.is_verified, \
     sp.rating_avg, sp.rating_count, sp.view_count, sp.created_at, sp.updated_at";

const OWNER_SELECT: &str = "pr.id AS owner_profile_id, pr.full_name AS owner_full_name, \
     pr.phone AS owner_phone, pr.whatsapp_number AS owner_whatsapp_number, \
     pr.village AS owner_village, pr.block AS owner_block, pr.district AS owner_district";

const CONTACT_SELECT: &str = "c.id, c.customer_id, c.provider_id, c.service_type, c.message, \
     c.contact_method, c.status, c.created_at";

#[derive(FromRow)]
struct ProfileRecord {
    id: Uuid,
    full_name: String,
    phone: String,
    whatsapp_number: Option<String>,
    village: Option<String>,
    block: Option<String>,
    district: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRecord {
    fn to_domain(self) -> PortResult<Profile> {
        Ok(Profile {
            id: self.id,
            full_name: self.full_name,
            phone: self.phone,
            whatsapp_number: self.whatsapp_number,
            village: self.village,
            block: self.block,
            district: self.district,
            role: self.role.parse().map_err(PortError::Unexpected)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ProviderRecord {
    id: Uuid,
    user_id: Uuid,
    service_category: String,
    specific_services: Vec<String>,
    experience_years: i32,
    price_min: Option<i32>,
    price_max: Option<i32>,
    service_area: Vec<String>,
    about: Option<String>,
    profile_photo_url: Option<String>,
    work_photos: Vec<String>,
    aadhaar_number: Option<String>,
    is_available: bool,
    is_verified: bool,
    rating_avg: f64,
    rating_count: i64,
    view_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProviderRecord {
    fn to_domain(self) -> PortResult<ServiceProvider> {
        Ok(ServiceProvider {
            id: self.id,
            user_id: self.user_id,
            service_category: self.service_category.parse().map_err(PortError::Unexpected)?,
            specific_services: self.specific_services,
            experience_years: self.experience_years,
            price_min: self.price_min,
            price_max: self.price_max,
            service_area: self.service_area,
            about: self.about,
            profile_photo_url: self.profile_photo_url,
            work_photos: self.work_photos,
            aadhaar_number: self.aadhaar_number,
            is_available: self.is_available,
            is_verified: self.is_verified,
            rating_avg: self.rating_avg,
            rating_count: self.rating_count,
            view_count: self.view_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ListingRecord {
    #[sqlx(flatten)]
    provider: ProviderRecord,
    owner_profile_id: Uuid,
    owner_full_name: String,
    owner_phone: String,
    owner_whatsapp_number: Option<String>,
    owner_village: Option<String>,
    owner_block: Option<String>,
    owner_district: Option<String>,
}

impl ListingRecord {
    fn to_domain(self) -> PortResult<ProviderListing> {
        Ok(ProviderListing {
            provider: self.provider.to_domain()?,
            profile: PublicProfile {
                id: self.owner_profile_id,
                full_name: self.owner_full_name,
                phone: self.owner_phone,
                whatsapp_number: self.owner_whatsapp_number,
                village: self.owner_village,
                block: self.owner_block,
                district: self.owner_district,
            },
        })
    }
}

#[derive(FromRow)]
struct ContactRecord {
    id: Uuid,
    customer_id: Uuid,
    provider_id: Uuid,
    service_type: String,
    message: Option<String>,
    contact_method: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl ContactRecord {
    fn to_domain(self) -> PortResult<Contact> {
        Ok(Contact {
            id: self.id,
            customer_id: self.customer_id,
            provider_id: self.provider_id,
            service_type: self.service_type,
            message: self.message,
            contact_method: self.contact_method.parse().map_err(PortError::Unexpected)?,
            status: self.status.parse().map_err(PortError::Unexpected)?,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct LeadRecord {
    #[sqlx(flatten)]
    contact: ContactRecord,
    customer_profile_id: Uuid,
    customer_full_name: String,
    customer_phone: String,
    customer_whatsapp_number: Option<String>,
    customer_village: Option<String>,
    customer_block: Option<String>,
    customer_district: Option<String>,
}

impl LeadRecord {
    fn to_domain(self) -> PortResult<Lead> {
        Ok(Lead {
            contact: self.contact.to_domain()?,
            customer: PublicProfile {
                id: self.customer_profile_id,
                full_name: self.customer_full_name,
                phone: self.customer_phone,
                whatsapp_number: self.customer_whatsapp_number,
                village: self.customer_village,
                block: self.customer_block,
                district: self.customer_district,
            },
        })
    }
}

#[derive(FromRow)]
struct OutreachRecord {
    #[sqlx(flatten)]
    contact: ContactRecord,
    provider_category: String,
    provider_name: String,
    provider_phone: String,
}

impl OutreachRecord {
    fn to_domain(self) -> PortResult<Outreach> {
        let contact = self.contact.to_domain()?;
        Ok(Outreach {
            provider: OutreachProvider {
                provider_id: contact.provider_id,
                service_category: self.provider_category.parse().map_err(PortError::Unexpected)?,
                full_name: self.provider_name,
                phone: self.provider_phone,
            },
            contact,
        })
    }
}

#[derive(FromRow)]
struct ReviewRecord {
    id: Uuid,
    provider_id: Uuid,
    customer_id: Uuid,
    lead_id: Option<Uuid>,
    rating: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReviewRecord {
    fn to_domain(self) -> Review {
        Review {
            id: self.id,
            provider_id: self.provider_id,
            customer_id: self.customer_id,
            lead_id: self.lead_id,
            rating: self.rating,
            comment: self.comment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ReviewWithAuthorRecord {
    #[sqlx(flatten)]
    review: ReviewRecord,
    author_name: String,
}

//=========================================================================================
// Directory filter composition
//=========================================================================================

/// Appends the conjunctive filter clauses to a builder that already ends in
/// `WHERE 1=1`. Shared between the page query and the count query so both
/// always agree.
fn push_directory_filters(qb: &mut QueryBuilder<Postgres>, query: &DirectoryQuery) {
    if let Some(category) = query.category {
        qb.push(" AND sp.service_category = ");
        qb.push_bind(category.as_str());
    }
    if let Some(location) = &query.location {
        qb.push(" AND sp.service_area @> ");
        qb.push_bind(vec![location.clone()]);
    }
    if query.available_only {
        qb.push(" AND sp.is_available = TRUE");
    }
    if let Some(term) = &query.search {
        qb.push(" AND (sp.about ILIKE ");
        qb.push_bind(format!("%{term}%"));
        qb.push(" OR ");
        qb.push_bind(term.clone());
        qb.push(" = ANY(sp.specific_services))");
    }
}

fn push_directory_order(qb: &mut QueryBuilder<Postgres>, sort: Option<SortKey>) {
    match sort {
        Some(SortKey::Rating) => {
            qb.push(" ORDER BY sp.rating_avg DESC");
        }
        Some(SortKey::Newest) => {
            qb.push(" ORDER BY sp.created_at DESC");
        }
        Some(SortKey::PriceLow) => {
            qb.push(" ORDER BY sp.price_min ASC");
        }
        // Unknown sort key: no explicit order.
        None => {}
    }
}

//=========================================================================================
// `StoreService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StoreService for PgStore {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        profile: NewProfile,
    ) -> PortResult<Profile> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let sql = format!(
            "INSERT INTO profiles \
             (id, full_name, phone, whatsapp_number, village, block, district, role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {PROFILE_SELECT}"
        );
        let record = sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&profile.full_name)
            .bind(&profile.phone)
            .bind(&profile.whatsapp_number)
            .bind(&profile.village)
            .bind(&profile.block)
            .bind(&profile.district)
            .bind(profile.role.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?;

        sqlx::query(
            "INSERT INTO auth_credentials (user_id, email, password_hash) VALUES ($1, $2, $3)",
        )
        .bind(record.id)
        .bind(email)
        .bind(password_hash)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;
        record.to_domain()
    }

    async fn get_profile(&self, user_id: Uuid) -> PortResult<Profile> {
        let sql = format!("SELECT {PROFILE_SELECT} FROM profiles WHERE id = $1");
        let record = sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| PortError::NotFound(format!("Profile {user_id} not found")))?;
        record.to_domain()
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<Credentials> {
        let row: Option<(Uuid, String, String)> = sqlx::query_as(
            "SELECT user_id, email, password_hash FROM auth_credentials WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        let (user_id, email, password_hash) =
            row.ok_or_else(|| PortError::NotFound(format!("No account for {email}")))?;
        Ok(Credentials {
            user_id,
            email,
            password_hash,
        })
    }

    async fn profile_id_by_phone(&self, phone: &str) -> PortResult<Option<Uuid>> {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM profiles WHERE phone = $1")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(row.map(|(id,)| id))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;
        row.map(|(id,)| id).ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn search_providers(
        &self,
        query: &DirectoryQuery,
    ) -> PortResult<(Vec<ProviderListing>, u64)> {
        let mut count_qb = QueryBuilder::new(
            "SELECT COUNT(*) FROM service_providers sp \
             JOIN profiles pr ON pr.id = sp.user_id WHERE 1=1",
        );
        push_directory_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;

        let mut qb = QueryBuilder::new(format!(
            "SELECT {PROVIDER_SELECT}, {OWNER_SELECT} FROM service_providers sp \
             JOIN profiles pr ON pr.id = sp.user_id WHERE 1=1"
        ));
        push_directory_filters(&mut qb, query);
        push_directory_order(&mut qb, query.sort);
        qb.push(" LIMIT ");
        qb.push_bind(query.limit() as i64);
        qb.push(" OFFSET ");
        qb.push_bind(query.offset() as i64);

        let records: Vec<ListingRecord> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;

        let listings = records
            .into_iter()
            .map(ListingRecord::to_domain)
            .collect::<PortResult<Vec<_>>>()?;
        Ok((listings, total.max(0) as u64))
    }

    async fn create_provider(
        &self,
        owner_id: Uuid,
        new: NewProvider,
    ) -> PortResult<ServiceProvider> {
        let sql = format!(
            "INSERT INTO service_providers AS sp \
             (id, user_id, service_category, specific_services, experience_years, price_min, \
              price_max, service_area, about, profile_photo_url, work_photos, aadhaar_number, \
              is_available) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {PROVIDER_SELECT}"
        );
        let record = sqlx::query_as::<_, ProviderRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(new.service_category.as_str())
            .bind(&new.specific_services)
            .bind(new.experience_years)
            .bind(new.price_min)
            .bind(new.price_max)
            .bind(&new.service_area)
            .bind(&new.about)
            .bind(&new.profile_photo_url)
            .bind(&new.work_photos)
            .bind(&new.aadhaar_number)
            .bind(new.is_available)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;
        record.to_domain()
    }

    async fn get_provider(&self, id: Uuid) -> PortResult<ServiceProvider> {
        let sql =
            format!("SELECT {PROVIDER_SELECT} FROM service_providers sp WHERE sp.id = $1");
        let record = sqlx::query_as::<_, ProviderRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| PortError::NotFound(format!("Provider {id} not found")))?;
        record.to_domain()
    }

    async fn get_provider_by_owner(&self, user_id: Uuid) -> PortResult<Option<ServiceProvider>> {
        let sql =
            format!("SELECT {PROVIDER_SELECT} FROM service_providers sp WHERE sp.user_id = $1");
        let record = sqlx::query_as::<_, ProviderRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        record.map(ProviderRecord::to_domain).transpose()
    }

    async fn get_provider_detail(&self, id: Uuid) -> PortResult<ProviderDetail> {
        let sql = format!(
            "SELECT {PROVIDER_SELECT}, {OWNER_SELECT} FROM service_providers sp \
             JOIN profiles pr ON pr.id = sp.user_id WHERE sp.id = $1"
        );
        let record = sqlx::query_as::<_, ListingRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| PortError::NotFound(format!("Provider {id} not found")))?;

        let listing = record.to_domain()?;
        let reviews = self.reviews_for_provider(id).await?;
        Ok(ProviderDetail {
            provider: listing.provider,
            profile: listing.profile,
            reviews,
        })
    }

    async fn increment_view_count(&self, id: Uuid) -> PortResult<()> {
        // Single in-place update: the store serializes concurrent increments.
        let result =
            sqlx::query("UPDATE service_providers SET view_count = view_count + 1 WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Provider {id} not found")));
        }
        Ok(())
    }

    async fn update_provider(
        &self,
        id: Uuid,
        patch: ProviderPatch,
    ) -> PortResult<ServiceProvider> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE service_providers AS sp SET updated_at = now()");
        if let Some(v) = patch.service_category {
            qb.push(", service_category = ");
            qb.push_bind(v.as_str());
        }
        if let Some(v) = patch.specific_services {
            qb.push(", specific_services = ");
            qb.push_bind(v);
        }
        if let Some(v) = patch.experience_years {
            qb.push(", experience_years = ");
            qb.push_bind(v);
        }
        if let Some(v) = patch.price_min {
            qb.push(", price_min = ");
            qb.push_bind(v);
        }
        if let Some(v) = patch.price_max {
            qb.push(", price_max = ");
            qb.push_bind(v);
        }
        if let Some(v) = patch.service_area {
            qb.push(", service_area = ");
            qb.push_bind(v);
        }
        if let Some(v) = patch.about {
            qb.push(", about = ");
            qb.push_bind(v);
        }
        if let Some(v) = patch.profile_photo_url {
            qb.push(", profile_photo_url = ");
            qb.push_bind(v);
        }
        if let Some(v) = patch.work_photos {
            qb.push(", work_photos = ");
            qb.push_bind(v);
        }
        if let Some(v) = patch.is_available {
            qb.push(", is_available = ");
            qb.push_bind(v);
        }
        qb.push(" WHERE sp.id = ");
        qb.push_bind(id);
        qb.push(format!(" RETURNING {PROVIDER_SELECT}"));

        let record: ListingProviderOnly = qb
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| PortError::NotFound(format!("Provider {id} not found")))?;
        record.0.to_domain()
    }

    async fn record_contact(&self, new: NewContact) -> PortResult<Contact> {
        let sql = format!(
            "INSERT INTO contacts AS c \
             (id, customer_id, provider_id, service_type, message, contact_method, status) \
             VALUES ($1, $2, $3, $4, $5, $6, 'new') \
             RETURNING {CONTACT_SELECT}"
        );
        let record = sqlx::query_as::<_, ContactRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(new.customer_id)
            .bind(new.provider_id)
            .bind(&new.service_type)
            .bind(&new.message)
            .bind(new.contact_method.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;
        record.to_domain()
    }

    async fn leads_for_provider(&self, provider_id: Uuid) -> PortResult<Vec<Lead>> {
        let sql = format!(
            "SELECT {CONTACT_SELECT}, pr.id AS customer_profile_id, \
             pr.full_name AS customer_full_name, pr.phone AS customer_phone, \
             pr.whatsapp_number AS customer_whatsapp_number, pr.village AS customer_village, \
             pr.block AS customer_block, pr.district AS customer_district \
             FROM contacts c JOIN profiles pr ON pr.id = c.customer_id \
             WHERE c.provider_id = $1 ORDER BY c.created_at DESC"
        );
        let records: Vec<LeadRecord> = sqlx::query_as(&sql)
            .bind(provider_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        records.into_iter().map(LeadRecord::to_domain).collect()
    }

    async fn outreach_for_customer(&self, customer_id: Uuid) -> PortResult<Vec<Outreach>> {
        let sql = format!(
            "SELECT {CONTACT_SELECT}, sp.service_category AS provider_category, \
             pr.full_name AS provider_name, pr.phone AS provider_phone \
             FROM contacts c \
             JOIN service_providers sp ON sp.id = c.provider_id \
             JOIN profiles pr ON pr.id = sp.user_id \
             WHERE c.customer_id = $1 ORDER BY c.created_at DESC"
        );
        let records: Vec<OutreachRecord> = sqlx::query_as(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        records.into_iter().map(OutreachRecord::to_domain).collect()
    }

    async fn create_review(&self, new: NewReview) -> PortResult<Review> {
        // Insert and aggregate recompute commit together, so concurrent
        // writers can never leave rating_avg/rating_count behind the rows.
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        // Lock the provider row before anything else. Under READ COMMITTED a
        // racing writer's aggregate UPDATE would otherwise take its snapshot
        // before the other transaction commits and overwrite the aggregate
        // with a stale recompute; with the lock held first, the recompute
        // statement's snapshot includes every committed review.
        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM service_providers WHERE id = $1 FOR UPDATE")
                .bind(new.provider_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_db_err)?;
        if locked.is_none() {
            return Err(PortError::NotFound(format!(
                "Provider {} not found",
                new.provider_id
            )));
        }

        let record = sqlx::query_as::<_, ReviewRecord>(
            "INSERT INTO reviews (id, provider_id, customer_id, lead_id, rating, comment) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, provider_id, customer_id, lead_id, rating, comment, created_at, \
                       updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(new.provider_id)
        .bind(new.customer_id)
        .bind(new.lead_id)
        .bind(new.rating)
        .bind(&new.comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;

        sqlx::query(
            "UPDATE service_providers SET rating_avg = agg.avg_rating, rating_count = agg.n \
             FROM (SELECT COALESCE(AVG(rating), 0)::double precision AS avg_rating, \
                          COUNT(*) AS n \
                   FROM reviews WHERE provider_id = $1) AS agg \
             WHERE id = $1",
        )
        .bind(new.provider_id)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;
        Ok(record.to_domain())
    }

    async fn reviews_for_provider(&self, provider_id: Uuid) -> PortResult<Vec<ReviewWithAuthor>> {
        let records: Vec<ReviewWithAuthorRecord> = sqlx::query_as(
            "SELECT r.id, r.provider_id, r.customer_id, r.lead_id, r.rating, r.comment, \
                    r.created_at, r.updated_at, pr.full_name AS author_name \
             FROM reviews r JOIN profiles pr ON pr.id = r.customer_id \
             WHERE r.provider_id = $1 ORDER BY r.created_at DESC",
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(records
            .into_iter()
            .map(|r| ReviewWithAuthor {
                review: r.review.to_domain(),
                author_name: r.author_name,
            })
            .collect())
    }

    async fn save_provider(&self, customer_id: Uuid, provider_id: Uuid) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO saved_providers (customer_id, provider_id) VALUES ($1, $2) \
             ON CONFLICT (customer_id, provider_id) DO NOTHING",
        )
        .bind(customer_id)
        .bind(provider_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn remove_saved_provider(&self, customer_id: Uuid, provider_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM saved_providers WHERE customer_id = $1 AND provider_id = $2")
            .bind(customer_id)
            .bind(provider_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn saved_provider_ids(&self, customer_id: Uuid) -> PortResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT provider_id FROM saved_providers WHERE customer_id = $1 \
             ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn providers_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<ProviderListing>> {
        let sql = format!(
            "SELECT {PROVIDER_SELECT}, {OWNER_SELECT} FROM service_providers sp \
             JOIN profiles pr ON pr.id = sp.user_id WHERE sp.id = ANY($1)"
        );
        let records: Vec<ListingRecord> = sqlx::query_as(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        records.into_iter().map(ListingRecord::to_domain).collect()
    }
}

/// Wrapper so `build_query_as` can target a provider row without the owner
/// join columns.
struct ListingProviderOnly(ProviderRecord);

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for ListingProviderOnly {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(ListingProviderOnly(ProviderRecord::from_row(row)?))
    }
}
