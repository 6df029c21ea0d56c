//! Shared application state for the web layer.

use std::sync::Arc;

use crate::config::Config;
use gramseva_core::ports::{ObjectStorageService, StoreService};

/// Holds the injected service ports and configuration. Handlers receive it
/// as `State<Arc<AppState>>`.
pub struct AppState {
    pub store: Arc<dyn StoreService>,
    pub storage: Arc<dyn ObjectStorageService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn StoreService>,
        storage: Arc<dyn ObjectStorageService>,
        config: Config,
    ) -> Self {
        Self {
            store,
            storage,
            config: Arc::new(config),
        }
    }
}
