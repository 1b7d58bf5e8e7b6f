use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::Deserialize;

use foody_core::dialog::validation::SUPPORTED_CUISINES;
use foody_core::domain::restaurant::{BusinessId, Restaurant};

use crate::connection::DbPool;
use crate::repositories::{RepositoryError, SqlRestaurantCatalog};

/// Smallest number of restaurants seeded per cuisine, so every supported
/// cuisine can fill a full suggestion email.
pub const MIN_RESTAURANTS_PER_CUISINE: usize = 5;

/// Deterministic Manhattan restaurant catalog used for local runs and tests.
///
/// Entries are keyed by stable business ids (`mnh-<cuisine>-NNN`), so loading
/// twice leaves the catalog unchanged.
pub struct RestaurantSeedDataset;

impl RestaurantSeedDataset {
    /// JSON fixture content for the seeded catalog.
    pub const JSON: &str = include_str!("../../../config/fixtures/manhattan_restaurants.json");

    pub fn restaurants() -> Result<Vec<Restaurant>, RepositoryError> {
        Ok(parse_fixture()?.restaurants.into_iter().map(SeedRestaurant::into_restaurant).collect())
    }

    pub fn dataset_version() -> Result<String, RepositoryError> {
        Ok(parse_fixture()?.dataset_version)
    }

    /// Load the seed catalog into the database.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let fixture = parse_fixture()?;
        let catalog = SqlRestaurantCatalog::new(pool.clone());

        let mut cuisines: BTreeMap<String, usize> = BTreeMap::new();
        let mut restaurants_seeded = 0;
        for seed in fixture.restaurants {
            let restaurant = seed.into_restaurant();
            catalog.upsert(&restaurant).await?;
            *cuisines.entry(restaurant.cuisine).or_default() += 1;
            restaurants_seeded += 1;
        }

        tracing::info!(
            event_name = "db.seed.loaded",
            dataset_version = %fixture.dataset_version,
            restaurants_seeded,
            "restaurant seed catalog loaded"
        );

        Ok(SeedResult {
            dataset_version: fixture.dataset_version,
            location: fixture.location,
            restaurants_seeded,
            cuisines: cuisines.into_iter().collect(),
        })
    }

    /// Verify that every seeded restaurant is present and unchanged.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let expected = Self::restaurants()?;
        let ids = expected.iter().map(|restaurant| restaurant.business_id.clone()).collect::<Vec<_>>();
        let found = SqlRestaurantCatalog::new(pool.clone()).find_many(&ids).await?;

        let mut checks = vec![
            ("restaurants-present", found.len() == expected.len()),
            ("restaurants-match-fixture", found == expected),
        ];

        for cuisine in SUPPORTED_CUISINES {
            let seeded = found
                .iter()
                .filter(|restaurant| restaurant.cuisine.eq_ignore_ascii_case(cuisine))
                .count();
            checks.push((cuisine, seeded >= MIN_RESTAURANTS_PER_CUISINE));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Remove the seeded restaurants, leaving any other catalog rows in place.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let ids = Self::restaurants()?
            .into_iter()
            .map(|restaurant| restaurant.business_id.0)
            .collect::<Vec<_>>();

        let mut tx = pool.begin().await?;
        for id in &ids {
            sqlx::query("DELETE FROM restaurants WHERE business_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SeedFixture {
    dataset_version: String,
    location: String,
    restaurants: Vec<SeedRestaurant>,
}

#[derive(Debug, Deserialize)]
struct SeedRestaurant {
    business_id: String,
    name: String,
    address: String,
    cuisine: String,
    rating: Option<Decimal>,
    reviews: Option<u32>,
}

impl SeedRestaurant {
    fn into_restaurant(self) -> Restaurant {
        Restaurant {
            business_id: BusinessId(self.business_id),
            name: self.name,
            address: self.address,
            cuisine: self.cuisine,
            rating: self.rating,
            reviews: self.reviews,
        }
    }
}

fn parse_fixture() -> Result<SeedFixture, RepositoryError> {
    let fixture: SeedFixture = serde_json::from_str(RestaurantSeedDataset::JSON)
        .map_err(|error| RepositoryError::Decode(format!("invalid seed fixture: {error}")))?;

    let mut seen = HashSet::new();
    for restaurant in &fixture.restaurants {
        if !seen.insert(restaurant.business_id.as_str()) {
            return Err(RepositoryError::Decode(format!(
                "duplicate business id `{}` in seed fixture",
                restaurant.business_id
            )));
        }
    }

    Ok(fixture)
}

#[derive(Debug)]
pub struct SeedResult {
    pub dataset_version: String,
    pub location: String,
    pub restaurants_seeded: usize,
    pub cuisines: Vec<(String, usize)>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
