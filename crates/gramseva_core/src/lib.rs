pub mod catalog;
pub mod directory;
pub mod domain;
pub mod ports;
pub mod validation;

pub use catalog::ServiceCategory;
pub use directory::{DirectoryQuery, Pagination, SortKey, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
pub use domain::{
    Contact, ContactMethod, ContactStatus, Credentials, Lead, NewContact, NewProfile, NewProvider,
    NewReview, Outreach, OutreachProvider, Profile, ProviderDetail, ProviderListing, ProviderPatch,
    PublicProfile, Review, ReviewWithAuthor, ServiceAreaInput, ServiceProvider, UserRole,
};
pub use ports::{ObjectStorageService, PortError, PortResult, StoreService, StoredObject};
