//! Favorite reconciliation.
//!
//! The reconciler only decides what should happen to a favorite; executing the
//! decision against a store is the caller's job. Once the store has accepted
//! the change, [`apply_created`] and [`apply_deleted`] update the caller's
//! in-memory collection without a refetch.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

use crate::error::{CoreError, Result};
use crate::models::{Favorite, FavoriteId, NewFavorite, Property, PropertyId};

/// What a favorite toggle should do
#[derive(Debug, Clone, PartialEq)]
pub enum FavoriteOp {
    Create(NewFavorite),
    Delete(FavoriteId),
}

pub fn find_favorite<'a>(
    property_id: &PropertyId,
    favorites: &'a [Favorite],
) -> Option<&'a Favorite> {
    favorites.iter().find(|f| &f.property_id == property_id)
}

pub fn is_favorite(property_id: &PropertyId, favorites: &[Favorite]) -> bool {
    find_favorite(property_id, favorites).is_some()
}

/// Decide how to invert the favorite state of a property
pub fn toggle(property_id: &PropertyId, favorites: &[Favorite]) -> FavoriteOp {
    toggle_at(property_id, favorites, Utc::now())
}

pub fn toggle_at(
    property_id: &PropertyId,
    favorites: &[Favorite],
    now: DateTime<Utc>,
) -> FavoriteOp {
    match find_favorite(property_id, favorites) {
        Some(favorite) => FavoriteOp::Delete(favorite.id.clone()),
        None => FavoriteOp::Create(NewFavorite {
            property_id: property_id.clone(),
            added_at: now,
        }),
    }
}

/// Append a favorite the store has just created.
///
/// Refuses a second favorite for the same property.
pub fn apply_created(favorites: &mut Vec<Favorite>, created: Favorite) -> Result<()> {
    if let Some(existing) = find_favorite(&created.property_id, favorites) {
        return Err(CoreError::InvariantViolation(format!(
            "property {} is already favorited as {}",
            created.property_id, existing.id
        )));
    }
    favorites.push(created);
    Ok(())
}

/// Remove a favorite the store has just deleted.
///
/// Leaves the collection untouched when the favorite is already gone.
pub fn apply_deleted(favorites: &mut Vec<Favorite>, favorite_id: &FavoriteId) -> Result<Favorite> {
    let index = favorites
        .iter()
        .position(|f| &f.id == favorite_id)
        .ok_or_else(|| {
            CoreError::InvariantViolation(format!("favorite {} no longer exists", favorite_id))
        })?;
    Ok(favorites.remove(index))
}

/// Ordering for the Favorites page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FavoriteSort {
    /// Most recently added first
    #[default]
    Newest,
    Oldest,
    PriceHigh,
    PriceLow,
}

/// A favorited property joined with its favorite record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteListing {
    pub property: Property,
    pub favorite_id: FavoriteId,
    pub added_at: DateTime<Utc>,
}

/// Join favorites to their properties and sort them.
///
/// Favorites pointing at properties that no longer exist are dropped. Ties keep
/// the order of the favorites collection.
pub fn favorite_listings(
    favorites: &[Favorite],
    properties: &[Property],
    sort: FavoriteSort,
) -> Vec<FavoriteListing> {
    let mut listings: Vec<FavoriteListing> = favorites
        .iter()
        .filter_map(|favorite| {
            properties
                .iter()
                .find(|p| p.id == favorite.property_id)
                .map(|property| FavoriteListing {
                    property: property.clone(),
                    favorite_id: favorite.id.clone(),
                    added_at: favorite.added_at,
                })
        })
        .collect();

    listings.sort_by(|a, b| compare(a, b, sort));
    listings
}

fn compare(a: &FavoriteListing, b: &FavoriteListing, sort: FavoriteSort) -> Ordering {
    match sort {
        FavoriteSort::Newest => b.added_at.cmp(&a.added_at),
        FavoriteSort::Oldest => a.added_at.cmp(&b.added_at),
        FavoriteSort::PriceHigh => b.property.price.cmp(&a.property.price),
        FavoriteSort::PriceLow => a.property.price.cmp(&b.property.price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browse::filter::tests::{austin_pair, listing};
    use crate::models::PropertyType;
    use chrono::TimeZone;

    fn favorite(id: &str, property_id: i64, day: u32) -> Favorite {
        Favorite {
            id: FavoriteId::from(id),
            property_id: PropertyId::from(property_id),
            added_at: Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_is_favorite() {
        let favorites = vec![favorite("a", 1, 1)];
        assert!(is_favorite(&PropertyId::from("1"), &favorites));
        assert!(!is_favorite(&PropertyId::from(2), &favorites));
    }

    #[test]
    fn test_toggle_symmetry() {
        let property_id = PropertyId::from(2);
        let mut favorites = vec![favorite("a", 1, 1)];
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let new_favorite = match toggle_at(&property_id, &favorites, now) {
            FavoriteOp::Create(new_favorite) => new_favorite,
            other => panic!("expected create, got {:?}", other),
        };
        assert_eq!(new_favorite.property_id, property_id);
        assert_eq!(new_favorite.added_at, now);

        apply_created(&mut favorites, new_favorite.with_id(FavoriteId::from("b"))).unwrap();

        assert_eq!(
            toggle(&property_id, &favorites),
            FavoriteOp::Delete(FavoriteId::from("b"))
        );
    }

    #[test]
    fn test_apply_created_rejects_duplicate() {
        let mut favorites = vec![favorite("a", 1, 1)];
        let result = apply_created(&mut favorites, favorite("b", 1, 2));
        assert!(matches!(result, Err(CoreError::InvariantViolation(_))));
        assert_eq!(favorites.len(), 1);
    }

    #[test]
    fn test_apply_deleted_missing_is_reported() {
        let mut favorites = vec![favorite("a", 1, 1)];
        let result = apply_deleted(&mut favorites, &FavoriteId::from("zzz"));
        assert!(matches!(result, Err(CoreError::InvariantViolation(_))));
        assert_eq!(favorites, vec![favorite("a", 1, 1)]);

        let removed = apply_deleted(&mut favorites, &FavoriteId::from("a")).unwrap();
        assert_eq!(removed.property_id, PropertyId::from(1));
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_favorite_listings_sorting() {
        let mut properties = austin_pair();
        properties.push(listing(
            3,
            "Downtown Condo",
            "Dallas",
            PropertyType::Condo,
            320_000,
            2,
            2.0,
            1100,
        ));
        let favorites = vec![favorite("a", 1, 3), favorite("b", 2, 1), favorite("c", 3, 2)];

        let order = |sort| -> Vec<String> {
            favorite_listings(&favorites, &properties, sort)
                .into_iter()
                .map(|l| l.favorite_id.to_string())
                .collect()
        };

        assert_eq!(order(FavoriteSort::Newest), vec!["a", "c", "b"]);
        assert_eq!(order(FavoriteSort::Oldest), vec!["b", "c", "a"]);
        assert_eq!(order(FavoriteSort::PriceHigh), vec!["b", "c", "a"]);
        assert_eq!(order(FavoriteSort::PriceLow), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_favorite_listings_drops_orphans() {
        let favorites = vec![favorite("a", 1, 1), favorite("ghost", 99, 2)];
        let listings = favorite_listings(&favorites, &austin_pair(), FavoriteSort::Newest);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].property.title, "Sunny Loft");
    }
}
