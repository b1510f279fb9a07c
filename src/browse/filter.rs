//! Client-side filtering for the Browse page.
//!
//! Every criterion is an independent predicate and a property must pass all of
//! them. The output keeps the input order and never fails: unset or
//! unparseable criteria simply do not constrain anything.

use crate::models::{FilterSet, Property};
use tracing::debug;

/// Derive the visible listings from the full collection.
pub fn filter_properties(
    properties: &[Property],
    query: &str,
    filters: &FilterSet,
) -> Vec<Property> {
    let query = normalize(query);
    let location = normalize(&filters.location);

    let price_min = filters.price_min_value();
    let price_max = filters.price_max_value();
    let bedrooms_min = filters.bedrooms_min_value();
    let bathrooms_min = filters.bathrooms_min_value();
    let square_feet_min = filters.square_feet_min_value();

    let filtered: Vec<Property> = properties
        .iter()
        .filter(|p| query.is_empty() || matches_query(p, &query))
        .filter(|p| price_min.map_or(true, |min| p.price as f64 >= min))
        .filter(|p| price_max.map_or(true, |max| p.price as f64 <= max))
        .filter(|p| {
            filters.property_types.is_empty()
                || filters
                    .property_types
                    .iter()
                    .any(|t| t == p.property_type.as_str())
        })
        .filter(|p| bedrooms_min.map_or(true, |min| f64::from(p.bedrooms) >= min))
        .filter(|p| bathrooms_min.map_or(true, |min| f64::from(p.bathrooms) >= min))
        .filter(|p| square_feet_min.map_or(true, |min| f64::from(p.square_feet) >= min))
        .filter(|p| location.is_empty() || matches_location(p, &location))
        .cloned()
        .collect();

    debug!(
        "Filtered {} properties down to {}",
        properties.len(),
        filtered.len()
    );

    filtered
}

/// Case-insensitive substring match of an already-normalized query against
/// title, address, city, state and property type.
pub fn matches_query(property: &Property, query: &str) -> bool {
    [
        property.title.as_str(),
        property.address.as_str(),
        property.city.as_str(),
        property.state.as_str(),
        property.property_type.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(query))
}

fn matches_location(property: &Property, location: &str) -> bool {
    [
        property.city.as_str(),
        property.state.as_str(),
        property.address.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(location))
}

/// Trim and lower-case free text before matching
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// The first `count` listings, in catalog order
pub fn featured(properties: &[Property], count: usize) -> &[Property] {
    &properties[..count.min(properties.len())]
}
