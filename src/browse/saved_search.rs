//! Saved-search encoding.
//!
//! A [`FilterSet`] travels to the Browse page as a flat query string and is
//! shown to the user as a one-line summary. Only criteria that are set are
//! encoded, so "absent" and "empty" never get confused on the way back.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use url::form_urlencoded;

use crate::error::{CoreError, Result};
use crate::models::filters::numeric;
use crate::models::{FilterSet, NewSavedSearch};

pub const PRICE_MIN: &str = "priceMin";
pub const PRICE_MAX: &str = "priceMax";
pub const PROPERTY_TYPES: &str = "propertyTypes";
pub const BEDROOMS_MIN: &str = "bedroomsMin";
pub const BATHROOMS_MIN: &str = "bathroomsMin";
pub const SQUARE_FEET_MIN: &str = "squareFeetMin";
pub const LOCATION: &str = "location";
/// Free-text query parameter read by the Browse page
pub const SEARCH: &str = "search";

pub const NO_FILTERS: &str = "No filters applied";
const SEPARATOR: &str = " • ";

/// Encode the criteria that are set as `key=value` pairs
pub fn to_query_string(filters: &FilterSet) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    append_filters(&mut serializer, filters);
    serializer.finish()
}

fn append_filters(serializer: &mut form_urlencoded::Serializer<'_, String>, filters: &FilterSet) {
    let scalar = |key, value: &String| (!value.is_empty()).then(|| (key, value.clone()));
    let pairs = [
        scalar(PRICE_MIN, &filters.price_min),
        scalar(PRICE_MAX, &filters.price_max),
        (!filters.property_types.is_empty())
            .then(|| (PROPERTY_TYPES, filters.property_types.join(","))),
        scalar(BEDROOMS_MIN, &filters.bedrooms_min),
        scalar(BATHROOMS_MIN, &filters.bathrooms_min),
        scalar(SQUARE_FEET_MIN, &filters.square_feet_min),
        scalar(LOCATION, &filters.location),
    ];

    for (key, value) in pairs.into_iter().flatten() {
        serializer.append_pair(key, &value);
    }
}

/// Decode the filter criteria from a query string; missing keys stay unset
pub fn from_query_string(query_string: &str) -> FilterSet {
    BrowseParams::from_query_string(query_string).filters
}

/// Navigation target for running a saved search
pub fn browse_path(filters: &FilterSet) -> String {
    let query_string = to_query_string(filters);
    if query_string.is_empty() {
        "/browse".to_string()
    } else {
        format!("/browse?{}", query_string)
    }
}

/// Initial Browse state read from navigation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseParams {
    pub query: String,
    pub filters: FilterSet,
}

impl BrowseParams {
    /// A repeated key keeps its first value
    pub fn from_query_string(query_string: &str) -> Self {
        let query_string = query_string.strip_prefix('?').unwrap_or(query_string);
        let mut params = BrowseParams::default();
        let mut seen = HashSet::new();

        for (key, value) in form_urlencoded::parse(query_string.as_bytes()) {
            if !seen.insert(key.clone()) {
                continue;
            }
            let value = value.into_owned();
            match &*key {
                SEARCH => params.query = value,
                PRICE_MIN => params.filters.price_min = value,
                PRICE_MAX => params.filters.price_max = value,
                PROPERTY_TYPES => {
                    params.filters.property_types = value
                        .split(',')
                        .filter(|t| !t.is_empty())
                        .map(String::from)
                        .collect();
                }
                BEDROOMS_MIN => params.filters.bedrooms_min = value,
                BATHROOMS_MIN => params.filters.bathrooms_min = value,
                SQUARE_FEET_MIN => params.filters.square_feet_min = value,
                LOCATION => params.filters.location = value,
                _ => {}
            }
        }

        params
    }

    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if !self.query.is_empty() {
            serializer.append_pair(SEARCH, &self.query);
        }
        append_filters(&mut serializer, &self.filters);
        serializer.finish()
    }
}

/// Human-readable one-line description of the criteria
pub fn to_summary(filters: &FilterSet) -> String {
    let mut parts = Vec::new();

    if !filters.location.is_empty() {
        parts.push(format!("Location: {}", filters.location));
    }
    if !filters.price_min.is_empty() || !filters.price_max.is_empty() {
        let min = dollars(&filters.price_min);
        let max = dollars(&filters.price_max);
        let range = format!("{} - {}", min, max);
        parts.push(format!("Price: {}", range.trim_start()));
    }
    if !filters.property_types.is_empty() {
        parts.push(format!("Type: {}", filters.property_types.join(", ")));
    }
    if !filters.bedrooms_min.is_empty() {
        parts.push(format!("{}+ beds", filters.bedrooms_min));
    }
    if !filters.bathrooms_min.is_empty() {
        parts.push(format!("{}+ baths", filters.bathrooms_min));
    }
    if !filters.square_feet_min.is_empty() {
        parts.push(format!("{}+ sq ft", grouped(&filters.square_feet_min)));
    }

    if parts.is_empty() {
        NO_FILTERS.to_string()
    } else {
        parts.join(SEPARATOR)
    }
}

fn dollars(raw: &str) -> String {
    if raw.is_empty() {
        String::new()
    } else {
        format!("${}", grouped(raw))
    }
}

/// Locale-style grouping of a numeric string; non-numeric input is kept as typed
fn grouped(raw: &str) -> String {
    match numeric(raw) {
        Some(value) => group_thousands(value),
        None => raw.trim().to_string(),
    }
}

/// `1234567.5` -> `1,234,567.5`, at most three fraction digits
pub fn group_thousands(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let text = format!("{}", rounded.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut out = String::with_capacity(text.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*digit);
    }
    if let Some(frac_part) = frac_part {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Whole-dollar price for display, e.g. `$450,000`
pub fn format_price(price: i64) -> String {
    if price < 0 {
        format!("-${}", group_thousands(price.unsigned_abs() as f64))
    } else {
        format!("${}", group_thousands(price as f64))
    }
}

/// Validate a saved search before it is persisted
pub fn new_saved_search(name: &str, filters: FilterSet) -> Result<NewSavedSearch> {
    new_saved_search_at(name, filters, Utc::now())
}

pub fn new_saved_search_at(
    name: &str,
    filters: FilterSet,
    now: DateTime<Utc>,
) -> Result<NewSavedSearch> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("a saved search needs a name".to_string()));
    }

    Ok(NewSavedSearch {
        name: name.to_string(),
        filters,
        created_at: now,
    })
}
