use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

use foody_core::dialog::validation::{is_supported_cuisine, SUPPORTED_CUISINES};
use foody_db::fixtures::MIN_RESTAURANTS_PER_CUISINE;

type SeedContractTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
    ($left:expr, $right:expr, $($arg:tt)*) => {
        if $left != $right {
            return Err(format!($($arg)*));
        }
    };
}

#[derive(Debug, Deserialize)]
struct SeedRestaurantContract {
    business_id: String,
    name: String,
    address: String,
    cuisine: String,
    rating: Option<String>,
    reviews: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SeedContract {
    dataset_version: String,
    location: String,
    restaurants: Vec<SeedRestaurantContract>,
}

fn load_contract() -> SeedContractTestResult<SeedContract> {
    serde_json::from_str(include_str!("../../../config/fixtures/manhattan_restaurants.json"))
        .map_err(|error| format!("seed fixture JSON must parse: {error}"))
}

#[test]
fn seed_fixture_restaurants_are_well_formed() -> SeedContractTestResult {
    let contract = load_contract()?;
    let mut ids_seen = HashSet::new();

    require_eq!(contract.dataset_version, "manhattan-2026-10");
    require_eq!(contract.location, "Manhattan");
    require!(!contract.restaurants.is_empty());

    for restaurant in &contract.restaurants {
        require!(
            ids_seen.insert(restaurant.business_id.clone()),
            "duplicate business id: {}",
            restaurant.business_id
        );
        require!(!restaurant.name.trim().is_empty(), "{} has no name", restaurant.business_id);
        require!(
            restaurant.address.contains("New York, NY"),
            "{} should have a Manhattan address, got {}",
            restaurant.business_id,
            restaurant.address
        );
        require!(
            is_supported_cuisine(&restaurant.cuisine),
            "{} has unsupported cuisine {}",
            restaurant.business_id,
            restaurant.cuisine
        );
        require!(
            restaurant
                .business_id
                .starts_with(&format!("mnh-{}-", restaurant.cuisine.to_ascii_lowercase())),
            "business id {} should carry its cuisine",
            restaurant.business_id
        );

        if let Some(rating) = &restaurant.rating {
            let value: f64 = rating
                .parse()
                .map_err(|_| format!("rating {rating} for {} is not numeric", restaurant.business_id))?;
            require!(
                (1.0..=5.0).contains(&value),
                "rating {} out of range for {}",
                rating,
                restaurant.business_id
            );
        }
        if let Some(reviews) = restaurant.reviews {
            require!(reviews > 0, "{} should have reviews when counted", restaurant.business_id);
        }
    }

    Ok(())
}

#[test]
fn seed_fixture_covers_every_supported_cuisine() -> SeedContractTestResult {
    let contract = load_contract()?;
    let mut per_cuisine: BTreeMap<String, usize> = BTreeMap::new();
    for restaurant in &contract.restaurants {
        *per_cuisine.entry(restaurant.cuisine.to_ascii_lowercase()).or_default() += 1;
    }

    for cuisine in SUPPORTED_CUISINES {
        let seeded = per_cuisine.get(cuisine).copied().unwrap_or_default();
        require!(
            seeded >= MIN_RESTAURANTS_PER_CUISINE,
            "cuisine {} has {} seeded restaurants, expected at least {}",
            cuisine,
            seeded,
            MIN_RESTAURANTS_PER_CUISINE
        );
    }
    require_eq!(per_cuisine.len(), SUPPORTED_CUISINES.len());

    Ok(())
}
