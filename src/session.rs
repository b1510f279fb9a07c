//! Caller-side state for the Browse, Favorites and Saved Searches views.
//!
//! Sessions own the in-memory collections, hand them to the pure functions in
//! [`crate::browse`], execute the resulting operations against the
//! repositories and report every outcome to a [`Notifier`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::browse::favorites::{self, FavoriteListing, FavoriteOp, FavoriteSort};
use crate::browse::filter::filter_properties;
use crate::browse::saved_search::{self, BrowseParams};
use crate::error::{CoreError, Result};
use crate::models::{
    Favorite, FavoriteId, FilterSet, NewFavorite, Property, PropertyId, SavedSearch, SavedSearchId,
};
use crate::store::{FavoriteRepository, PropertyRepository, Repositories, SavedSearchRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    FavoriteAdded,
    FavoriteRemoved,
    FavoritesCleared,
    SavedSearchCreated,
    SavedSearchDeleted,
}

/// Outcome of a user action, for the notification layer to phrase
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    /// Display name of the affected entity
    pub subject: String,
    /// Failure reason, `None` on success
    pub error: Option<String>,
}

impl Notice {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Reports notices as log events
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        match &notice.error {
            None => info!("✅ {:?}: {}", notice.kind, notice.subject),
            Some(error) => warn!("❌ {:?} failed for {}: {}", notice.kind, notice.subject, error),
        }
    }
}

fn report<T>(notifier: &dyn Notifier, kind: NoticeKind, subject: String, result: &Result<T>) {
    notifier.notify(&Notice {
        kind,
        subject,
        error: result.as_ref().err().map(ToString::to_string),
    });
}

/// Handle for one property-collection fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// What a completed favorite toggle did
#[derive(Debug, Clone, PartialEq)]
pub enum FavoriteChange {
    Added(Favorite),
    Removed(Favorite),
}

pub struct BrowseSession {
    properties_repo: Arc<dyn PropertyRepository>,
    favorites_repo: Arc<dyn FavoriteRepository>,
    notifier: Arc<dyn Notifier>,
    properties: Vec<Property>,
    favorites: Vec<Favorite>,
    /// `false` until a favorites fetch succeeds; toggling is refused until then
    favorites_loaded: bool,
    query: String,
    filters: FilterSet,
    latest_load: u64,
}

impl BrowseSession {
    pub fn new(repos: &Repositories, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            properties_repo: repos.properties.clone(),
            favorites_repo: repos.favorites.clone(),
            notifier,
            properties: Vec::new(),
            favorites: Vec::new(),
            favorites_loaded: false,
            query: String::new(),
            filters: FilterSet::default(),
            latest_load: 0,
        }
    }

    /// Apply the query and filters carried by navigation
    pub fn apply_params(&mut self, params: BrowseParams) {
        self.query = params.query;
        self.filters = params.filters;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterSet {
        &mut self.filters
    }

    /// Reset every criterion and the free-text query
    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.query.clear();
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn favorites(&self) -> &[Favorite] {
        &self.favorites
    }

    /// Start a property fetch; only the most recent ticket is honoured
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_load += 1;
        LoadTicket(self.latest_load)
    }

    /// Install a fetch result. Returns `Ok(false)` when a newer fetch has
    /// superseded this one and the result was discarded.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Property>>,
    ) -> Result<bool> {
        if ticket.0 != self.latest_load {
            debug!(
                "Discarding stale property load {:?} (latest {})",
                ticket, self.latest_load
            );
            return Ok(false);
        }
        let properties = result?;
        info!(
            "Loaded {} properties from {}",
            properties.len(),
            self.properties_repo.source_name()
        );
        self.properties = properties;
        Ok(true)
    }

    /// Fetch properties and favorites concurrently.
    ///
    /// A favorites failure is logged, empties the favorites and marks them
    /// unknown until the next successful load; a properties failure is
    /// returned so the caller can offer a retry.
    pub async fn load(&mut self) -> Result<()> {
        let ticket = self.begin_load();
        let properties_repo = self.properties_repo.clone();
        let favorites_repo = self.favorites_repo.clone();

        let (properties, favorites) =
            tokio::join!(properties_repo.get_all(), favorites_repo.get_all());

        match favorites {
            Ok(favorites) => {
                self.favorites = favorites;
                self.favorites_loaded = true;
            }
            Err(e) => {
                warn!("Error loading favorites: {}", e);
                self.favorites.clear();
                self.favorites_loaded = false;
            }
        }
        self.complete_load(ticket, properties)?;
        Ok(())
    }

    /// The listings shown on Browse
    pub fn visible(&self) -> Vec<Property> {
        filter_properties(&self.properties, &self.query, &self.filters)
    }

    pub fn is_favorite(&self, property_id: &PropertyId) -> bool {
        favorites::is_favorite(property_id, &self.favorites)
    }

    /// Flip the favorite state of a property.
    ///
    /// The in-memory favorites change only after the store confirms. Fails
    /// with `Transport` while the favorites could not be loaded, since the
    /// local state cannot tell a create from a delete.
    pub async fn toggle_favorite(&mut self, property_id: &PropertyId) -> Result<FavoriteChange> {
        let subject = self.subject(property_id);
        let (kind, result) = match favorites::toggle(property_id, &self.favorites) {
            FavoriteOp::Create(new_favorite) => (
                NoticeKind::FavoriteAdded,
                self.add_favorite(new_favorite).await,
            ),
            FavoriteOp::Delete(favorite_id) => (
                NoticeKind::FavoriteRemoved,
                self.remove_favorite(&favorite_id).await,
            ),
        };

        report(self.notifier.as_ref(), kind, subject, &result);
        result
    }

    fn ensure_favorites_loaded(&self) -> Result<()> {
        if self.favorites_loaded {
            Ok(())
        } else {
            Err(CoreError::Transport(
                "favorites are not loaded; reload before changing them".to_string(),
            ))
        }
    }

    async fn add_favorite(&mut self, new_favorite: NewFavorite) -> Result<FavoriteChange> {
        self.ensure_favorites_loaded()?;
        let created = self.favorites_repo.create(new_favorite).await?;
        favorites::apply_created(&mut self.favorites, created.clone())?;
        Ok(FavoriteChange::Added(created))
    }

    async fn remove_favorite(&mut self, favorite_id: &FavoriteId) -> Result<FavoriteChange> {
        self.ensure_favorites_loaded()?;
        if !self.favorites_repo.delete(favorite_id).await? {
            return Err(CoreError::InvariantViolation(format!(
                "favorite {} was already removed",
                favorite_id
            )));
        }
        let removed = favorites::apply_deleted(&mut self.favorites, favorite_id)?;
        Ok(FavoriteChange::Removed(removed))
    }

    /// Delete every favorite. Stops at the first failure; favorites deleted
    /// before it are gone from both the store and the session.
    pub async fn clear_favorites(&mut self) -> Result<usize> {
        let result = self.delete_all_favorites().await;
        let subject = match &result {
            Ok(count) => format!("{} favorites", count),
            Err(_) => "favorites".to_string(),
        };
        report(self.notifier.as_ref(), NoticeKind::FavoritesCleared, subject, &result);
        result
    }

    async fn delete_all_favorites(&mut self) -> Result<usize> {
        self.ensure_favorites_loaded()?;
        let ids: Vec<_> = self.favorites.iter().map(|f| f.id.clone()).collect();
        for id in &ids {
            self.remove_favorite(id).await?;
        }
        Ok(ids.len())
    }

    /// The Favorites page view
    pub fn favorite_listings(&self, sort: FavoriteSort) -> Vec<FavoriteListing> {
        favorites::favorite_listings(&self.favorites, &self.properties, sort)
    }

    fn subject(&self, property_id: &PropertyId) -> String {
        self.properties
            .iter()
            .find(|p| &p.id == property_id)
            .map(|p| p.title.clone())
            .unwrap_or_else(|| format!("property {}", property_id))
    }
}

pub struct SavedSearchBook {
    repo: Arc<dyn SavedSearchRepository>,
    notifier: Arc<dyn Notifier>,
    searches: Vec<SavedSearch>,
}

impl SavedSearchBook {
    pub fn new(repos: &Repositories, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repo: repos.saved_searches.clone(),
            notifier,
            searches: Vec::new(),
        }
    }

    pub async fn load(&mut self) -> Result<()> {
        self.searches = self.repo.get_all().await?;
        debug!("Loaded {} saved searches", self.searches.len());
        Ok(())
    }

    pub fn searches(&self) -> &[SavedSearch] {
        &self.searches
    }

    /// Validate and persist a named filter set; newest is listed first
    pub async fn create(&mut self, name: &str, filters: FilterSet) -> Result<SavedSearch> {
        let result = match saved_search::new_saved_search(name, filters) {
            Ok(new_search) => self.repo.create(new_search).await,
            Err(e) => Err(e),
        };
        if let Ok(created) = &result {
            self.searches.insert(0, created.clone());
        }

        let subject = name.trim().to_string();
        report(self.notifier.as_ref(), NoticeKind::SavedSearchCreated, subject, &result);
        result
    }

    pub async fn delete(&mut self, id: &SavedSearchId) -> Result<()> {
        let subject = self
            .find(id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("saved search {}", id));

        let result = match self.repo.delete(id).await {
            Ok(true) => {
                self.searches.retain(|s| &s.id != id);
                Ok(())
            }
            Ok(false) => Err(CoreError::not_found("saved search", id)),
            Err(e) => Err(e),
        };

        report(self.notifier.as_ref(), NoticeKind::SavedSearchDeleted, subject, &result);
        result
    }

    /// Browse path that replays a saved search
    pub fn run(&self, id: &SavedSearchId) -> Result<String> {
        self.find(id)
            .map(|s| saved_search::browse_path(&s.filters))
            .ok_or_else(|| CoreError::not_found("saved search", id))
    }

    fn find(&self, id: &SavedSearchId) -> Option<&SavedSearch> {
        self.searches.iter().find(|s| &s.id == id)
    }
}
