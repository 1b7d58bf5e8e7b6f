use std::collections::HashMap;
use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};

use foody_core::domain::restaurant::{BusinessId, Restaurant};
use foody_core::errors::ApplicationError;
use foody_core::ports::RestaurantCatalog;

use super::{format_timestamp, parse_u32, RepositoryError};
use crate::DbPool;

/// Ids bound per `IN (...)` lookup.
const BATCH_GET_CHUNK: usize = 100;

pub struct SqlRestaurantCatalog {
    pool: DbPool,
}

impl SqlRestaurantCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Returns the known restaurants in the order their ids were given.
    pub async fn find_many(&self, ids: &[BusinessId]) -> Result<Vec<Restaurant>, RepositoryError> {
        let mut found = HashMap::with_capacity(ids.len());

        for chunk in ids.chunks(BATCH_GET_CHUNK) {
            let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
                "SELECT business_id, name, address, cuisine, rating, reviews
                 FROM restaurants
                 WHERE business_id IN (",
            );
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(id.0.as_str());
            }
            separated.push_unseparated(")");

            for row in builder.build().fetch_all(&self.pool).await? {
                let restaurant = restaurant_from_row(row)?;
                found.insert(restaurant.business_id.clone(), restaurant);
            }
        }

        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }

    pub async fn upsert(&self, restaurant: &Restaurant) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO restaurants (
                business_id,
                name,
                address,
                cuisine,
                rating,
                reviews,
                inserted_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(business_id) DO UPDATE SET
                name = excluded.name,
                address = excluded.address,
                cuisine = excluded.cuisine,
                rating = excluded.rating,
                reviews = excluded.reviews",
        )
        .bind(&restaurant.business_id.0)
        .bind(&restaurant.name)
        .bind(&restaurant.address)
        .bind(&restaurant.cuisine)
        .bind(restaurant.rating.map(|rating| rating.to_string()))
        .bind(restaurant.reviews.map(i64::from))
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM restaurants").fetch_one(&self.pool).await?;
        u64::try_from(count)
            .map_err(|_| RepositoryError::Decode(format!("negative restaurant count {count}")))
    }

    pub async fn count_by_cuisine(&self) -> Result<Vec<(String, u64)>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT cuisine, COUNT(*) AS count
             FROM restaurants
             GROUP BY cuisine
             ORDER BY cuisine ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<(String, u64), RepositoryError> {
                let count: i64 = row.try_get("count")?;
                Ok((row.try_get("cuisine")?, u64::from(parse_u32("count", count)?)))
            })
            .collect()
    }
}

fn restaurant_from_row(row: SqliteRow) -> Result<Restaurant, RepositoryError> {
    let rating = row
        .try_get::<Option<String>, _>("rating")?
        .map(|raw| {
            Decimal::from_str(&raw)
                .map_err(|error| RepositoryError::Decode(format!("invalid rating `{raw}`: {error}")))
        })
        .transpose()?;
    let reviews = row
        .try_get::<Option<i64>, _>("reviews")?
        .map(|value| parse_u32("reviews", value))
        .transpose()?;

    Ok(Restaurant {
        business_id: BusinessId(row.try_get("business_id")?),
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        cuisine: row.try_get("cuisine")?,
        rating,
        reviews,
    })
}

#[async_trait::async_trait]
impl RestaurantCatalog for SqlRestaurantCatalog {
    async fn batch_get(&self, ids: &[BusinessId]) -> Result<Vec<Restaurant>, ApplicationError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.find_many(ids).await?)
    }
}
