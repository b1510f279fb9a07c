use serde::{Deserialize, Serialize};

/// Structured criteria for narrowing the property collection.
///
/// Numeric criteria are kept as the strings the user typed. An empty string
/// (or an empty type list) means "no constraint", never zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSet {
    /// Minimum price (whole dollars)
    pub price_min: String,
    /// Maximum price (whole dollars)
    pub price_max: String,
    /// Accepted property types, matched exactly against the enumeration
    pub property_types: Vec<String>,
    /// Minimum number of bedrooms
    pub bedrooms_min: String,
    /// Minimum number of bathrooms
    pub bathrooms_min: String,
    /// Minimum size in square feet
    pub square_feet_min: String,
    /// City, state or address fragment
    pub location: String,
}

impl FilterSet {
    /// True when no criterion is set
    pub fn is_empty(&self) -> bool {
        self.price_min.is_empty()
            && self.price_max.is_empty()
            && self.property_types.is_empty()
            && self.bedrooms_min.is_empty()
            && self.bathrooms_min.is_empty()
            && self.square_feet_min.is_empty()
            && self.location.is_empty()
    }

    /// Add the type if absent, remove it if present
    pub fn toggle_property_type(&mut self, property_type: &str) {
        if let Some(pos) = self.property_types.iter().position(|t| t == property_type) {
            self.property_types.remove(pos);
        } else {
            self.property_types.push(property_type.to_string());
        }
    }

    pub fn clear(&mut self) {
        *self = FilterSet::default();
    }

    pub(crate) fn price_min_value(&self) -> Option<f64> {
        numeric(&self.price_min)
    }

    pub(crate) fn price_max_value(&self) -> Option<f64> {
        numeric(&self.price_max)
    }

    pub(crate) fn bedrooms_min_value(&self) -> Option<f64> {
        numeric(&self.bedrooms_min)
    }

    pub(crate) fn bathrooms_min_value(&self) -> Option<f64> {
        numeric(&self.bathrooms_min)
    }

    pub(crate) fn square_feet_min_value(&self) -> Option<f64> {
        numeric(&self.square_feet_min)
    }
}

/// Parse a numeric criterion; blank or non-numeric input counts as unset
pub(crate) fn numeric(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(FilterSet::default().is_empty());
    }

    #[test]
    fn test_toggle_property_type() {
        let mut filters = FilterSet::default();
        filters.toggle_property_type("House");
        filters.toggle_property_type("Loft");
        assert_eq!(filters.property_types, vec!["House", "Loft"]);

        filters.toggle_property_type("House");
        assert_eq!(filters.property_types, vec!["Loft"]);
    }

    #[test]
    fn test_numeric_treats_garbage_as_unset() {
        assert_eq!(numeric(""), None);
        assert_eq!(numeric("   "), None);
        assert_eq!(numeric("abc"), None);
        assert_eq!(numeric("NaN"), None);
        assert_eq!(numeric(" 2.5 "), Some(2.5));
    }

    #[test]
    fn test_deserialize_missing_fields_as_unset() {
        let filters: FilterSet = serde_json::from_str(r#"{"location":"Austin"}"#).unwrap();
        assert_eq!(filters.location, "Austin");
        assert!(filters.price_min.is_empty());
        assert!(filters.property_types.is_empty());
    }
}
