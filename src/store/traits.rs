use crate::error::Result;
use crate::models::{
    Favorite, FavoriteId, NewFavorite, NewSavedSearch, Property, PropertyId, SavedSearch,
    SavedSearchId,
};
use async_trait::async_trait;

/// Read access to the listing catalog
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Property>>;

    async fn get_by_id(&self, id: &PropertyId) -> Result<Option<Property>>;

    /// Store-side free-text search. Browse filters client-side instead.
    async fn search(&self, query: &str) -> Result<Vec<Property>>;

    /// Get the name of the backing store
    fn source_name(&self) -> &'static str;
}

#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Favorite>>;

    /// Persist a favorite, returning it with its assigned id
    async fn create(&self, favorite: NewFavorite) -> Result<Favorite>;

    /// `Ok(false)` when nothing with that id exists
    async fn delete(&self, id: &FavoriteId) -> Result<bool>;
}

#[async_trait]
pub trait SavedSearchRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<SavedSearch>>;

    async fn create(&self, search: NewSavedSearch) -> Result<SavedSearch>;

    /// `Ok(false)` when nothing with that id exists
    async fn delete(&self, id: &SavedSearchId) -> Result<bool>;
}
