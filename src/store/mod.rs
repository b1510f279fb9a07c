pub mod memory;
pub mod records;
pub mod remote;
pub mod traits;

pub use memory::{MemoryFavoriteRepository, MemoryPropertyRepository, MemorySavedSearchRepository};
pub use remote::RemoteStore;
pub use traits::{FavoriteRepository, PropertyRepository, SavedSearchRepository};

use crate::config::{AppConfig, DataSource};
use crate::error::Result;
use std::sync::Arc;

/// The three data-access collaborators, sharing one backing store
#[derive(Clone)]
pub struct Repositories {
    pub properties: Arc<dyn PropertyRepository>,
    pub favorites: Arc<dyn FavoriteRepository>,
    pub saved_searches: Arc<dyn SavedSearchRepository>,
}

impl Repositories {
    /// In-memory repositories over the bundled sample catalog
    pub fn sample() -> Result<Self> {
        Ok(Self {
            properties: Arc::new(MemoryPropertyRepository::sample()?),
            favorites: Arc::new(MemoryFavoriteRepository::new()),
            saved_searches: Arc::new(MemorySavedSearchRepository::new()),
        })
    }

    pub fn connect(config: &AppConfig) -> Result<Self> {
        match &config.data_source {
            DataSource::Mock => Self::sample(),
            DataSource::Remote { base_url } => {
                let store = Arc::new(RemoteStore::new(base_url.clone(), config.http_timeout)?);
                Ok(Self {
                    properties: store.clone(),
                    favorites: store.clone(),
                    saved_searches: store,
                })
            }
        }
    }
}
