use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

use foody_core::domain::restaurant::SuggestionRecord;
use foody_core::errors::ApplicationError;
use foody_core::ports::SuggestionHistory;

use super::{format_timestamp, RepositoryError};
use crate::DbPool;

/// Last suggestions emailed to each user, one row per user.
pub struct SqlSuggestionHistory {
    pool: DbPool,
}

impl SqlSuggestionHistory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, user_id: &str) -> Result<Option<SuggestionRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT user_id, dining_details_json, restaurants_json
             FROM past_restaurant_suggestions
             WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(record_from_row).transpose()
    }

    pub async fn upsert(&self, record: &SuggestionRecord) -> Result<(), RepositoryError> {
        let dining_details = serde_json::to_string(&record.dining_details)
            .map_err(|error| RepositoryError::Decode(format!("encode dining details: {error}")))?;
        let restaurants = serde_json::to_string(&record.restaurants)
            .map_err(|error| RepositoryError::Decode(format!("encode restaurants: {error}")))?;

        sqlx::query(
            "INSERT INTO past_restaurant_suggestions (
                user_id,
                dining_details_json,
                restaurants_json,
                updated_at
             ) VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                dining_details_json = excluded.dining_details_json,
                restaurants_json = excluded.restaurants_json,
                updated_at = excluded.updated_at",
        )
        .bind(&record.user_id)
        .bind(dining_details)
        .bind(restaurants)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn record_from_row(row: SqliteRow) -> Result<SuggestionRecord, RepositoryError> {
    let user_id: String = row.try_get("user_id")?;
    let dining_details_raw: String = row.try_get("dining_details_json")?;
    let restaurants_raw: String = row.try_get("restaurants_json")?;

    let dining_details = serde_json::from_str(&dining_details_raw).map_err(|error| {
        RepositoryError::Decode(format!("invalid dining details for `{user_id}`: {error}"))
    })?;
    let restaurants = serde_json::from_str(&restaurants_raw).map_err(|error| {
        RepositoryError::Decode(format!("invalid restaurants for `{user_id}`: {error}"))
    })?;

    Ok(SuggestionRecord { user_id, dining_details, restaurants })
}

#[async_trait::async_trait]
impl SuggestionHistory for SqlSuggestionHistory {
    async fn find_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<SuggestionRecord>, ApplicationError> {
        Ok(self.find(user_id).await?)
    }

    async fn save(&self, record: SuggestionRecord) -> Result<(), ApplicationError> {
        Ok(self.upsert(&record).await?)
    }
}
