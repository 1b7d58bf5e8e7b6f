//! SQLite-backed message queue with receipt handles and visibility timeouts.
//!
//! A received message stays in the table, hidden until `visible_at`. Each
//! receive issues a fresh receipt handle, so a delete only succeeds for the
//! consumer that currently holds the message. Messages received
//! `max_receive_count` times without being deleted are dead-lettered in place.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use tracing::warn;
use uuid::Uuid;

use foody_core::domain::dining::DiningRequest;
use foody_core::errors::ApplicationError;
use foody_core::ports::{QueueConsumer, QueuedMessage, SuggestionQueue};

use super::{format_timestamp, parse_timestamp, parse_u32, RepositoryError};
use crate::DbPool;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub visible: u64,
    pub in_flight: u64,
    pub dead_lettered: u64,
    pub oldest_visible_at: Option<DateTime<Utc>>,
}

pub struct SqlSuggestionQueue {
    pool: DbPool,
    max_receive_count: u32,
}

impl SqlSuggestionQueue {
    pub fn new(pool: DbPool, max_receive_count: u32) -> Self {
        Self { pool, max_receive_count: max_receive_count.max(1) }
    }

    pub async fn enqueue_body(&self, body: &str) -> Result<String, RepositoryError> {
        self.enqueue_body_at(body, Utc::now()).await
    }

    async fn enqueue_body_at(
        &self,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<String, RepositoryError> {
        let message_id = Uuid::new_v4().to_string();
        let now = format_timestamp(now);

        sqlx::query(
            "INSERT INTO suggestion_queue (
                message_id,
                body,
                receipt_handle,
                receive_count,
                visible_at,
                created_at,
                dead_lettered_at
             ) VALUES (?, ?, NULL, 0, ?, ?, NULL)",
        )
        .bind(&message_id)
        .bind(body)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(message_id)
    }

    pub async fn receive_at(
        &self,
        max_messages: u32,
        visibility_timeout_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<QueuedMessage>, RepositoryError> {
        let now_text = format_timestamp(now);
        let hidden_until = format_timestamp(now + visibility_duration(visibility_timeout_secs));
        let mut tx = self.pool.begin().await?;

        let dead_lettered = sqlx::query(
            "UPDATE suggestion_queue
             SET dead_lettered_at = ?, receipt_handle = NULL
             WHERE dead_lettered_at IS NULL
               AND visible_at <= ?
               AND receive_count >= ?",
        )
        .bind(&now_text)
        .bind(&now_text)
        .bind(i64::from(self.max_receive_count))
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if dead_lettered > 0 {
            warn!(
                event_name = "queue.message.dead_lettered",
                count = dead_lettered,
                max_receive_count = self.max_receive_count,
                "messages exceeded their receive budget"
            );
        }

        let candidates: Vec<String> = sqlx::query(
            "SELECT message_id
             FROM suggestion_queue
             WHERE dead_lettered_at IS NULL AND visible_at <= ?
             ORDER BY created_at ASC, message_id ASC
             LIMIT ?",
        )
        .bind(&now_text)
        .bind(i64::from(max_messages.max(1)))
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|row| row.try_get::<String, _>("message_id"))
        .collect::<Result<_, _>>()?;

        let mut messages = Vec::with_capacity(candidates.len());
        for message_id in candidates {
            let receipt_handle = Uuid::new_v4().to_string();
            let row = sqlx::query(
                "UPDATE suggestion_queue
                 SET receipt_handle = ?, receive_count = receive_count + 1, visible_at = ?
                 WHERE message_id = ?
                 RETURNING body, receive_count",
            )
            .bind(&receipt_handle)
            .bind(&hidden_until)
            .bind(&message_id)
            .fetch_one(&mut *tx)
            .await?;

            messages.push(QueuedMessage {
                message_id,
                receipt_handle,
                body: row.try_get("body")?,
                receive_count: parse_u32("receive_count", row.try_get("receive_count")?)?,
            });
        }

        tx.commit().await?;
        Ok(messages)
    }

    pub async fn delete_claimed(&self, receipt_handle: &str) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query(
            "DELETE FROM suggestion_queue
             WHERE receipt_handle = ? AND dead_lettered_at IS NULL",
        )
        .bind(receipt_handle)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted > 0)
    }

    pub async fn stats(&self) -> Result<QueueStats, RepositoryError> {
        self.stats_at(Utc::now()).await
    }

    pub async fn stats_at(&self, now: DateTime<Utc>) -> Result<QueueStats, RepositoryError> {
        let now = format_timestamp(now);
        let row = sqlx::query(
            "SELECT
                COALESCE(SUM(CASE WHEN dead_lettered_at IS NULL AND visible_at <= ? THEN 1 ELSE 0 END), 0) AS visible,
                COALESCE(SUM(CASE WHEN dead_lettered_at IS NULL AND visible_at > ? THEN 1 ELSE 0 END), 0) AS in_flight,
                COALESCE(SUM(CASE WHEN dead_lettered_at IS NOT NULL THEN 1 ELSE 0 END), 0) AS dead_lettered,
                MIN(CASE WHEN dead_lettered_at IS NULL AND visible_at <= ? THEN created_at END) AS oldest_visible_at
             FROM suggestion_queue",
        )
        .bind(&now)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        Ok(QueueStats {
            visible: parse_count("visible", row.try_get("visible")?)?,
            in_flight: parse_count("in_flight", row.try_get("in_flight")?)?,
            dead_lettered: parse_count("dead_lettered", row.try_get("dead_lettered")?)?,
            oldest_visible_at: row
                .try_get::<Option<String>, _>("oldest_visible_at")?
                .map(|value| parse_timestamp("oldest_visible_at", value))
                .transpose()?,
        })
    }

    /// Makes dead-lettered messages deliverable again with a fresh budget.
    pub async fn redrive_dead_letters(&self) -> Result<u64, RepositoryError> {
        let now = format_timestamp(Utc::now());
        let redriven = sqlx::query(
            "UPDATE suggestion_queue
             SET dead_lettered_at = NULL, receive_count = 0, visible_at = ?
             WHERE dead_lettered_at IS NOT NULL",
        )
        .bind(&now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(redriven)
    }
}

fn visibility_duration(visibility_timeout_secs: u64) -> Duration {
    Duration::seconds(i64::try_from(visibility_timeout_secs).unwrap_or(i64::MAX / 1_000))
}

fn parse_count(column: &str, value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value).map_err(|_| {
        RepositoryError::Decode(format!("invalid value for `{column}` (expected count): {value}"))
    })
}

#[async_trait::async_trait]
impl SuggestionQueue for SqlSuggestionQueue {
    async fn send(&self, request: &DiningRequest) -> Result<String, ApplicationError> {
        let body = serde_json::to_string(request)
            .map_err(|error| ApplicationError::Integration(format!("encode request: {error}")))?;
        Ok(self.enqueue_body(&body).await?)
    }
}

#[async_trait::async_trait]
impl QueueConsumer for SqlSuggestionQueue {
    async fn receive(
        &self,
        max_messages: u32,
        visibility_timeout_secs: u64,
    ) -> Result<Vec<QueuedMessage>, ApplicationError> {
        Ok(self.receive_at(max_messages, visibility_timeout_secs, Utc::now()).await?)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<bool, ApplicationError> {
        Ok(self.delete_claimed(receipt_handle).await?)
    }
}
