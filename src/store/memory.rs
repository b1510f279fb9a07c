use crate::browse::filter::{matches_query, normalize};
use crate::error::{CoreError, Result};
use crate::models::{
    Favorite, FavoriteId, NewFavorite, NewSavedSearch, Property, PropertyId, SavedSearch,
    SavedSearchId,
};
use crate::store::records::PropertyRecord;
use crate::store::traits::{FavoriteRepository, PropertyRepository, SavedSearchRepository};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const SAMPLE_CATALOG: &str = include_str!("../../data/sample_properties.json");

/// In-memory listing catalog
pub struct MemoryPropertyRepository {
    properties: Vec<Property>,
}

impl MemoryPropertyRepository {
    pub fn new(properties: Vec<Property>) -> Self {
        Self { properties }
    }

    /// Catalog bundled with the crate
    pub fn sample() -> Result<Self> {
        Self::from_json(SAMPLE_CATALOG)
    }

    /// Load a catalog in either record convention
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<PropertyRecord> = serde_json::from_str(json)?;
        let properties = records
            .into_iter()
            .map(Property::try_from)
            .collect::<Result<Vec<_>>>()?;

        info!("📋 Loaded {} properties into the in-memory catalog", properties.len());
        Ok(Self::new(properties))
    }
}

#[async_trait]
impl PropertyRepository for MemoryPropertyRepository {
    async fn get_all(&self) -> Result<Vec<Property>> {
        Ok(self.properties.clone())
    }

    async fn get_by_id(&self, id: &PropertyId) -> Result<Option<Property>> {
        Ok(self.properties.iter().find(|p| &p.id == id).cloned())
    }

    async fn search(&self, query: &str) -> Result<Vec<Property>> {
        let query = normalize(query);
        if query.is_empty() {
            return Ok(self.properties.clone());
        }
        Ok(self
            .properties
            .iter()
            .filter(|p| matches_query(p, &query))
            .cloned()
            .collect())
    }

    fn source_name(&self) -> &'static str {
        "memory"
    }
}

/// In-memory favorites, newest first
#[derive(Default)]
pub struct MemoryFavoriteRepository {
    favorites: Mutex<Vec<Favorite>>,
    next_id: AtomicU64,
}

impl MemoryFavoriteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FavoriteRepository for MemoryFavoriteRepository {
    async fn get_all(&self) -> Result<Vec<Favorite>> {
        Ok(self.favorites.lock().await.clone())
    }

    async fn create(&self, favorite: NewFavorite) -> Result<Favorite> {
        let mut favorites = self.favorites.lock().await;
        if favorites.iter().any(|f| f.property_id == favorite.property_id) {
            return Err(CoreError::InvariantViolation(format!(
                "property {} is already a favorite",
                favorite.property_id
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let created = favorite.with_id(FavoriteId::from(id.to_string()));
        favorites.insert(0, created.clone());
        debug!("Stored favorite {} for property {}", created.id, created.property_id);
        Ok(created)
    }

    async fn delete(&self, id: &FavoriteId) -> Result<bool> {
        let mut favorites = self.favorites.lock().await;
        match favorites.iter().position(|f| &f.id == id) {
            Some(index) => {
                favorites.remove(index);
                Ok(true)
            }
            None => {
                warn!("Favorite {} not found", id);
                Ok(false)
            }
        }
    }
}

/// In-memory saved searches, newest first
#[derive(Default)]
pub struct MemorySavedSearchRepository {
    searches: Mutex<Vec<SavedSearch>>,
    next_id: AtomicU64,
}

impl MemorySavedSearchRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SavedSearchRepository for MemorySavedSearchRepository {
    async fn get_all(&self) -> Result<Vec<SavedSearch>> {
        Ok(self.searches.lock().await.clone())
    }

    async fn create(&self, search: NewSavedSearch) -> Result<SavedSearch> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let created = search.with_id(SavedSearchId::from(id.to_string()));
        self.searches.lock().await.insert(0, created.clone());
        Ok(created)
    }

    async fn delete(&self, id: &SavedSearchId) -> Result<bool> {
        let mut searches = self.searches.lock().await;
        match searches.iter().position(|s| &s.id == id) {
            Some(index) => {
                searches.remove(index);
                Ok(true)
            }
            None => {
                warn!("Saved search {} not found", id);
                Ok(false)
            }
        }
    }
}
