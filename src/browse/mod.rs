//! Pure derived-view logic behind the Browse, Favorites and Saved Searches
//! pages. Nothing here performs I/O.

pub mod favorites;
pub mod filter;
pub mod saved_search;

pub use favorites::{
    favorite_listings, is_favorite, toggle, FavoriteListing, FavoriteOp, FavoriteSort,
};
pub use filter::{featured, filter_properties};
pub use saved_search::{browse_path, from_query_string, to_query_string, to_summary, BrowseParams};
