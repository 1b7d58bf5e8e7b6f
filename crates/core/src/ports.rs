//! Collaborator seams of the concierge and the suggestion worker.
//!
//! Every port reports failures as `ApplicationError` so callers can decide
//! between a user-facing apology, a redelivery, or propagation.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::dining::DiningRequest;
use crate::domain::restaurant::{BusinessId, Restaurant, SuggestionRecord};
use crate::errors::ApplicationError;

#[async_trait]
pub trait SuggestionQueue: Send + Sync {
    /// Enqueues the request and returns the queue's message id.
    async fn send(&self, request: &DiningRequest) -> Result<String, ApplicationError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
    pub receive_count: u32,
}

#[async_trait]
pub trait QueueConsumer: Send + Sync {
    /// Claims up to `max_messages` visible messages and hides them for
    /// `visibility_timeout_secs`.
    async fn receive(
        &self,
        max_messages: u32,
        visibility_timeout_secs: u64,
    ) -> Result<Vec<QueuedMessage>, ApplicationError>;

    /// Returns `false` when the receipt handle no longer identifies a claim.
    async fn delete(&self, receipt_handle: &str) -> Result<bool, ApplicationError>;
}

#[async_trait]
pub trait SuggestionHistory: Send + Sync {
    async fn find_for_user(&self, user_id: &str)
        -> Result<Option<SuggestionRecord>, ApplicationError>;

    /// Replaces any previous record of the same user.
    async fn save(&self, record: SuggestionRecord) -> Result<(), ApplicationError>;
}

#[async_trait]
pub trait SuggestionMailer: Send + Sync {
    async fn send_suggestions(
        &self,
        request: &DiningRequest,
        restaurants: &[Restaurant],
    ) -> Result<(), ApplicationError>;
}

#[async_trait]
pub trait RestaurantSearch: Send + Sync {
    async fn find_business_ids(&self, cuisine: &str) -> Result<Vec<BusinessId>, ApplicationError>;
}

#[async_trait]
pub trait RestaurantCatalog: Send + Sync {
    /// Unknown ids are skipped rather than reported.
    async fn batch_get(&self, ids: &[BusinessId]) -> Result<Vec<Restaurant>, ApplicationError>;
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Calendar date in the process time zone (set `TZ` for the served city).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
