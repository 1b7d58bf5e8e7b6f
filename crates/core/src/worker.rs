//! Queue-draining side of the concierge: turns queued dining requests into
//! emailed restaurant suggestions.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::dining::DiningRequest;
use crate::domain::restaurant::{BusinessId, Restaurant, SuggestionRecord};
use crate::errors::ApplicationError;
use crate::ports::{
    QueueConsumer, QueuedMessage, RestaurantCatalog, RestaurantSearch, SuggestionHistory,
    SuggestionMailer,
};

pub const DEFAULT_SUGGESTION_COUNT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerSettings {
    pub max_messages: u32,
    pub visibility_timeout_secs: u64,
    pub suggestion_count: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            max_messages: 10,
            visibility_timeout_secs: 40,
            suggestion_count: DEFAULT_SUGGESTION_COUNT,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub received: usize,
    pub delivered: usize,
    pub no_matches: usize,
    pub dropped: usize,
    pub retained: usize,
    pub delete_failures: usize,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.received == 0
    }
}

#[derive(Debug, Error)]
pub enum MessageError {
    /// The body can never be processed; the message is removed.
    #[error("malformed message body: {0}")]
    Malformed(String),
    /// A collaborator failed; the message stays queued for redelivery.
    #[error("transient failure: {0}")]
    Transient(#[from] ApplicationError),
}

#[derive(Clone, Debug, PartialEq)]
enum Outcome {
    Delivered(usize),
    NoMatches,
}

pub struct SuggestionWorker {
    queue: Arc<dyn QueueConsumer>,
    search: Arc<dyn RestaurantSearch>,
    catalog: Arc<dyn RestaurantCatalog>,
    mailer: Arc<dyn SuggestionMailer>,
    history: Arc<dyn SuggestionHistory>,
    settings: WorkerSettings,
}

impl SuggestionWorker {
    pub fn new(
        queue: Arc<dyn QueueConsumer>,
        search: Arc<dyn RestaurantSearch>,
        catalog: Arc<dyn RestaurantCatalog>,
        mailer: Arc<dyn SuggestionMailer>,
        history: Arc<dyn SuggestionHistory>,
        settings: WorkerSettings,
    ) -> Self {
        Self { queue, search, catalog, mailer, history, settings }
    }

    pub fn settings(&self) -> WorkerSettings {
        self.settings
    }

    /// Receives one batch and processes its messages one at a time.
    ///
    /// Only a failed `receive` is an error; per-message failures are counted
    /// in the report and never abort the rest of the batch.
    pub async fn process_batch(&self) -> Result<BatchReport, ApplicationError> {
        let messages = self
            .queue
            .receive(self.settings.max_messages, self.settings.visibility_timeout_secs)
            .await?;

        let mut report = BatchReport { received: messages.len(), ..BatchReport::default() };
        for message in &messages {
            let delete = match self.process_message(message).await {
                Ok(Outcome::Delivered(count)) => {
                    info!(
                        event_name = "worker.message.delivered",
                        message_id = %message.message_id,
                        suggestions = count,
                        "suggestions emailed"
                    );
                    report.delivered += 1;
                    true
                }
                Ok(Outcome::NoMatches) => {
                    info!(
                        event_name = "worker.message.no_matches",
                        message_id = %message.message_id,
                        "no restaurants matched the request"
                    );
                    report.no_matches += 1;
                    true
                }
                Err(MessageError::Malformed(reason)) => {
                    warn!(
                        event_name = "worker.message.dropped",
                        message_id = %message.message_id,
                        reason = %reason,
                        "dropping undecodable message"
                    );
                    report.dropped += 1;
                    true
                }
                Err(MessageError::Transient(error)) => {
                    warn!(
                        event_name = "worker.message.retained",
                        message_id = %message.message_id,
                        receive_count = message.receive_count,
                        error = %error,
                        "leaving message for redelivery"
                    );
                    report.retained += 1;
                    false
                }
            };

            if delete {
                self.delete(message, &mut report).await;
            }
        }

        Ok(report)
    }

    async fn process_message(&self, message: &QueuedMessage) -> Result<Outcome, MessageError> {
        let request: DiningRequest = serde_json::from_str(&message.body)
            .map_err(|error| MessageError::Malformed(error.to_string()))?;

        let business_ids = self.search.find_business_ids(&request.cuisine).await?;
        let picked =
            pick_suggestions(&business_ids, self.settings.suggestion_count, &mut rand::thread_rng());
        if picked.is_empty() {
            return Ok(Outcome::NoMatches);
        }

        let restaurants = self.catalog.batch_get(&picked).await?;
        if restaurants.is_empty() {
            return Ok(Outcome::NoMatches);
        }

        self.mailer.send_suggestions(&request, &restaurants).await?;
        let delivered = restaurants.len();
        self.remember(request, restaurants, &message.message_id).await;
        Ok(Outcome::Delivered(delivered))
    }

    async fn remember(&self, request: DiningRequest, restaurants: Vec<Restaurant>, message_id: &str) {
        let user_id = request.user_id.clone();
        if let Err(error) = self.history.save(SuggestionRecord::new(request, restaurants)).await {
            error!(
                event_name = "worker.history.save_failed",
                message_id = %message_id,
                user_id = %user_id,
                error = %error,
                "suggestions were emailed but could not be remembered"
            );
        }
    }

    async fn delete(&self, message: &QueuedMessage, report: &mut BatchReport) {
        match self.queue.delete(&message.receipt_handle).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    event_name = "worker.message.delete_stale",
                    message_id = %message.message_id,
                    "receipt handle expired before delete"
                );
                report.delete_failures += 1;
            }
            Err(error) => {
                error!(
                    event_name = "worker.message.delete_failed",
                    message_id = %message.message_id,
                    error = %error,
                    "failed to delete processed message"
                );
                report.delete_failures += 1;
            }
        }
    }
}

/// Uniform sample of up to `count` distinct ids.
pub fn pick_suggestions<R: Rng + ?Sized>(
    business_ids: &[BusinessId],
    count: usize,
    rng: &mut R,
) -> Vec<BusinessId> {
    business_ids.choose_multiple(rng, count).cloned().collect()
}
