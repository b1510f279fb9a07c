pub mod filters;

pub use filters::FilterSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(PropertyId);
string_id!(FavoriteId);
string_id!(SavedSearchId);

/// Kind of dwelling a listing offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    House,
    Apartment,
    Condo,
    Townhouse,
    Loft,
}

impl PropertyType {
    pub const ALL: [PropertyType; 5] = [
        PropertyType::House,
        PropertyType::Apartment,
        PropertyType::Condo,
        PropertyType::Townhouse,
        PropertyType::Loft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::House => "House",
            PropertyType::Apartment => "Apartment",
            PropertyType::Condo => "Condo",
            PropertyType::Townhouse => "Townhouse",
            PropertyType::Loft => "Loft",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = CoreError;

    /// Exact, case-sensitive match against the enumeration
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("unknown property type '{}'", s)))
    }
}

/// Listing status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Pending,
    Sold,
    #[serde(other)]
    Other,
}

impl From<&str> for ListingStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" => ListingStatus::Active,
            "pending" => ListingStatus::Pending,
            "sold" => ListingStatus::Sold,
            _ => ListingStatus::Other,
        }
    }
}

/// Map position of a listing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Core property data model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: PropertyId,
    pub title: String,
    /// Whole dollars
    pub price: i64,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub property_type: PropertyType,
    pub bedrooms: u32,
    /// Half steps allowed
    pub bathrooms: f32,
    pub square_feet: u32,
    pub year_built: i32,
    pub description: String,
    pub features: Vec<String>,
    pub images: Vec<String>,
    pub coordinates: Option<Coordinates>,
    pub listing_date: DateTime<Utc>,
    pub status: ListingStatus,
}

impl Property {
    /// Primary thumbnail
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// A favorited listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: FavoriteId,
    pub property_id: PropertyId,
    pub added_at: DateTime<Utc>,
}

/// A favorite that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFavorite {
    pub property_id: PropertyId,
    pub added_at: DateTime<Utc>,
}

impl NewFavorite {
    /// Attach the identifier assigned by the store
    pub fn with_id(self, id: FavoriteId) -> Favorite {
        Favorite {
            id,
            property_id: self.property_id,
            added_at: self.added_at,
        }
    }
}

/// A named, persisted filter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
    pub id: SavedSearchId,
    pub name: String,
    pub filters: FilterSet,
    pub created_at: DateTime<Utc>,
}

/// A validated saved search that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSavedSearch {
    pub name: String,
    pub filters: FilterSet,
    pub created_at: DateTime<Utc>,
}

impl NewSavedSearch {
    pub fn with_id(self, id: SavedSearchId) -> SavedSearch {
        SavedSearch {
            id,
            name: self.name,
            filters: self.filters,
            created_at: self.created_at,
        }
    }
}
