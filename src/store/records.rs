//! Record shapes exchanged with data stores.
//!
//! Stores use one of two field conventions for the same data: camelCase with
//! `id` (the bundled mock catalog) or snake_case with `Id` (the remote record
//! API). Both deserialize into the records below and are converted to the
//! canonical models before anything else sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, Result};
use crate::models::{
    Coordinates, Favorite, FilterSet, ListingStatus, NewFavorite, NewSavedSearch, Property,
    PropertyType, SavedSearch,
};

/// Identifier as stores send it: a string or an integer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Int(i64),
    Text(String),
}

impl RawId {
    pub fn into_string(self) -> String {
        match self {
            RawId::Int(id) => id.to_string(),
            RawId::Text(id) => id.trim().to_string(),
        }
    }
}

/// A list sent either as an array or as one comma-joined string
fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrJoined {
        List(Vec<String>),
        Joined(String),
    }

    let items = match Option::<ListOrJoined>::deserialize(deserializer)? {
        Some(ListOrJoined::List(items)) => items,
        Some(ListOrJoined::Joined(joined)) => joined.split(',').map(String::from).collect(),
        None => Vec::new(),
    };

    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyRecord {
    #[serde(alias = "Id")]
    pub id: RawId,
    #[serde(default)]
    pub title: String,
    pub price: i64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, alias = "zipCode")]
    pub zip_code: Option<String>,
    #[serde(alias = "propertyType")]
    pub property_type: String,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: f32,
    #[serde(default, alias = "squareFeet")]
    pub square_feet: u32,
    #[serde(default, alias = "yearBuilt")]
    pub year_built: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub features: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub images: Vec<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default, alias = "coordinatesLat")]
    pub coordinates_lat: Option<f64>,
    #[serde(default, alias = "coordinatesLng")]
    pub coordinates_lng: Option<f64>,
    #[serde(default, alias = "listingDate")]
    pub listing_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TryFrom<PropertyRecord> for Property {
    type Error = CoreError;

    fn try_from(record: PropertyRecord) -> Result<Self> {
        let property_type: PropertyType = record.property_type.trim().parse()?;
        if record.price < 0 {
            return Err(CoreError::Validation(format!(
                "negative price {} on property {:?}",
                record.price, record.id
            )));
        }
        if record.bathrooms < 0.0 {
            return Err(CoreError::Validation(format!(
                "negative bathrooms {} on property {:?}",
                record.bathrooms, record.id
            )));
        }

        let flat = match (record.coordinates_lat, record.coordinates_lng) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        };
        let coordinates = record.coordinates.or(flat);

        Ok(Property {
            id: record.id.into_string().into(),
            title: record.title,
            price: record.price,
            address: record.address,
            city: record.city,
            state: record.state,
            zip_code: record.zip_code.unwrap_or_default(),
            property_type,
            bedrooms: record.bedrooms,
            bathrooms: record.bathrooms,
            square_feet: record.square_feet,
            year_built: record.year_built.unwrap_or_default(),
            description: record.description.unwrap_or_default(),
            features: record.features,
            images: record.images,
            coordinates,
            listing_date: record.listing_date.unwrap_or_default(),
            status: record
                .status
                .as_deref()
                .map(ListingStatus::from)
                .unwrap_or(ListingStatus::Active),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteRecord {
    #[serde(alias = "Id")]
    pub id: RawId,
    #[serde(alias = "propertyId")]
    pub property_id: RawId,
    #[serde(default, alias = "addedAt")]
    pub added_at: Option<DateTime<Utc>>,
}

impl From<FavoriteRecord> for Favorite {
    fn from(record: FavoriteRecord) -> Self {
        Favorite {
            id: record.id.into_string().into(),
            property_id: record.property_id.into_string().into(),
            added_at: record.added_at.unwrap_or_default(),
        }
    }
}

/// Outbound favorite in the remote convention
#[derive(Debug, Serialize)]
pub struct NewFavoriteRecord<'a> {
    pub property_id: &'a str,
    pub added_at: DateTime<Utc>,
}

impl<'a> From<&'a NewFavorite> for NewFavoriteRecord<'a> {
    fn from(favorite: &'a NewFavorite) -> Self {
        NewFavoriteRecord {
            property_id: favorite.property_id.as_str(),
            added_at: favorite.added_at,
        }
    }
}

/// Filters stored inline or as an encoded JSON text column
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FiltersField {
    Inline(FilterSet),
    Encoded(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavedSearchRecord {
    #[serde(alias = "Id")]
    pub id: RawId,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default)]
    pub filters: Option<FiltersField>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TryFrom<SavedSearchRecord> for SavedSearch {
    type Error = CoreError;

    fn try_from(record: SavedSearchRecord) -> Result<Self> {
        let filters = match record.filters {
            Some(FiltersField::Inline(filters)) => filters,
            Some(FiltersField::Encoded(text)) if text.trim().is_empty() => FilterSet::default(),
            Some(FiltersField::Encoded(text)) => serde_json::from_str(&text)?,
            None => FilterSet::default(),
        };

        Ok(SavedSearch {
            id: record.id.into_string().into(),
            name: record.name,
            filters,
            created_at: record.created_at.unwrap_or_default(),
        })
    }
}

/// Outbound saved search in the remote convention
#[derive(Debug, Serialize)]
pub struct NewSavedSearchRecord<'a> {
    pub name: &'a str,
    /// Encoded JSON, the remote column is plain text
    pub filters: String,
    pub created_at: DateTime<Utc>,
}

impl<'a> TryFrom<&'a NewSavedSearch> for NewSavedSearchRecord<'a> {
    type Error = CoreError;

    fn try_from(search: &'a NewSavedSearch) -> Result<Self> {
        Ok(NewSavedSearchRecord {
            name: &search.name,
            filters: serde_json::to_string(&search.filters)?,
            created_at: search.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyId;
    use serde_json::json;

    #[test]
    fn test_property_from_mock_convention() {
        let record: PropertyRecord = serde_json::from_value(json!({
            "id": "1",
            "title": "Sunny Loft",
            "price": 250000,
            "address": "12 Congress Ave",
            "city": "Austin",
            "state": "TX",
            "zipCode": "78701",
            "propertyType": "Loft",
            "bedrooms": 1,
            "bathrooms": 1,
            "squareFeet": 700,
            "yearBuilt": 2015,
            "features": ["Rooftop", "Gym"],
            "images": ["https://img.example.com/1.jpg"],
            "coordinates": { "lat": 30.27, "lng": -97.74 },
            "listingDate": "2024-03-01T12:00:00Z",
            "status": "active"
        }))
        .unwrap();

        let property = Property::try_from(record).unwrap();
        assert_eq!(property.id, PropertyId::from(1));
        assert_eq!(property.property_type, PropertyType::Loft);
        assert_eq!(property.square_feet, 700);
        assert_eq!(property.coordinates, Some(Coordinates { lat: 30.27, lng: -97.74 }));
        assert_eq!(property.primary_image(), Some("https://img.example.com/1.jpg"));
    }

    #[test]
    fn test_property_from_remote_convention() {
        let record: PropertyRecord = serde_json::from_value(json!({
            "Id": 2,
            "Name": "Family House",
            "title": "Family House",
            "price": 450000,
            "address": "9 Oak St",
            "city": "Austin",
            "state": "TX",
            "zip_code": "78702",
            "property_type": "House",
            "bedrooms": 4,
            "bathrooms": 2.5,
            "square_feet": 2400,
            "features": "Garage, Pool,",
            "images": "https://img.example.com/2a.jpg,https://img.example.com/2b.jpg",
            "coordinates_lat": 30.26,
            "coordinates_lng": -97.72,
            "status": "Pending"
        }))
        .unwrap();

        let property = Property::try_from(record).unwrap();
        assert_eq!(property.id, PropertyId::from("2"));
        assert_eq!(property.features, vec!["Garage", "Pool"]);
        assert_eq!(property.images.len(), 2);
        assert_eq!(property.coordinates, Some(Coordinates { lat: 30.26, lng: -97.72 }));
        assert_eq!(property.status, ListingStatus::Pending);
    }

    #[test]
    fn test_unknown_property_type_is_rejected() {
        let record: PropertyRecord = serde_json::from_value(json!({
            "id": 3,
            "price": 100,
            "propertyType": "Castle"
        }))
        .unwrap();
        assert!(matches!(Property::try_from(record), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_favorite_conventions_agree() {
        let mock: FavoriteRecord = serde_json::from_value(json!({
            "id": "17",
            "propertyId": "2",
            "addedAt": "2024-05-01T09:00:00Z"
        }))
        .unwrap();
        let remote: FavoriteRecord = serde_json::from_value(json!({
            "Id": 17,
            "property_id": 2,
            "added_at": "2024-05-01T09:00:00Z"
        }))
        .unwrap();
        assert_eq!(Favorite::from(mock), Favorite::from(remote));
    }

    #[test]
    fn test_saved_search_with_encoded_filters() {
        let record: SavedSearchRecord = serde_json::from_value(json!({
            "Id": 5,
            "Name": "Austin lofts",
            "filters": "{\"location\":\"Austin\",\"propertyTypes\":[\"Loft\"]}",
            "created_at": "2024-05-01T09:00:00Z"
        }))
        .unwrap();
        let search = SavedSearch::try_from(record).unwrap();
        assert_eq!(search.filters.location, "Austin");
        assert_eq!(search.filters.property_types, vec!["Loft"]);
    }

    #[test]
    fn test_saved_search_with_inline_filters() {
        let record: SavedSearchRecord = serde_json::from_value(json!({
            "id": "5",
            "name": "Cheap",
            "filters": { "priceMax": "200000" },
            "createdAt": "2024-05-01T09:00:00Z"
        }))
        .unwrap();
        let search = SavedSearch::try_from(record).unwrap();
        assert_eq!(search.filters.price_max, "200000");
    }
}
