use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use foody_core::errors::ApplicationError;

pub mod catalog;
pub mod history;
pub mod memory;
pub mod queue;

pub use catalog::SqlRestaurantCatalog;
pub use history::SqlSuggestionHistory;
pub use memory::{InMemoryRestaurantCatalog, InMemorySuggestionHistory, InMemorySuggestionQueue};
pub use queue::{QueueStats, SqlSuggestionQueue};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        ApplicationError::Persistence(error.to_string())
    }
}

/// Fixed-width UTC form so stored timestamps compare correctly as text.
pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

pub(crate) fn parse_u32(column: &str, value: i64) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| {
        RepositoryError::Decode(format!(
            "invalid value for `{column}` (expected non-negative u32): {value}"
        ))
    })
}
