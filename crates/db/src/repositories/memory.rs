use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use foody_core::domain::dining::DiningRequest;
use foody_core::domain::restaurant::{BusinessId, Restaurant, SuggestionRecord};
use foody_core::errors::ApplicationError;
use foody_core::ports::{
    QueueConsumer, QueuedMessage, RestaurantCatalog, SuggestionHistory, SuggestionQueue,
};

struct StoredMessage {
    message_id: String,
    body: String,
    receipt_handle: Option<String>,
    receive_count: u32,
    visible_at: Instant,
}

/// Process-local queue with the same visibility and receipt semantics as the
/// SQLite queue, minus dead-lettering.
#[derive(Default)]
pub struct InMemorySuggestionQueue {
    messages: RwLock<Vec<StoredMessage>>,
}

impl InMemorySuggestionQueue {
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    pub async fn bodies(&self) -> Vec<String> {
        self.messages.read().await.iter().map(|message| message.body.clone()).collect()
    }
}

#[async_trait::async_trait]
impl SuggestionQueue for InMemorySuggestionQueue {
    async fn send(&self, request: &DiningRequest) -> Result<String, ApplicationError> {
        let body = serde_json::to_string(request)
            .map_err(|error| ApplicationError::Integration(format!("encode request: {error}")))?;
        let message_id = Uuid::new_v4().to_string();

        let mut messages = self.messages.write().await;
        messages.push(StoredMessage {
            message_id: message_id.clone(),
            body,
            receipt_handle: None,
            receive_count: 0,
            visible_at: Instant::now(),
        });
        Ok(message_id)
    }
}

#[async_trait::async_trait]
impl QueueConsumer for InMemorySuggestionQueue {
    async fn receive(
        &self,
        max_messages: u32,
        visibility_timeout_secs: u64,
    ) -> Result<Vec<QueuedMessage>, ApplicationError> {
        let now = Instant::now();
        let hidden_until = now + Duration::from_secs(visibility_timeout_secs);
        let mut messages = self.messages.write().await;

        let received = messages
            .iter_mut()
            .filter(|message| message.visible_at <= now)
            .take(max_messages.max(1) as usize)
            .map(|message| {
                let receipt_handle = Uuid::new_v4().to_string();
                message.receipt_handle = Some(receipt_handle.clone());
                message.receive_count += 1;
                message.visible_at = hidden_until;
                QueuedMessage {
                    message_id: message.message_id.clone(),
                    receipt_handle,
                    body: message.body.clone(),
                    receive_count: message.receive_count,
                }
            })
            .collect();
        Ok(received)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<bool, ApplicationError> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|message| message.receipt_handle.as_deref() != Some(receipt_handle));
        Ok(messages.len() < before)
    }
}

#[derive(Default)]
pub struct InMemorySuggestionHistory {
    records: RwLock<HashMap<String, SuggestionRecord>>,
}

#[async_trait::async_trait]
impl SuggestionHistory for InMemorySuggestionHistory {
    async fn find_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<SuggestionRecord>, ApplicationError> {
        let records = self.records.read().await;
        Ok(records.get(user_id).cloned())
    }

    async fn save(&self, record: SuggestionRecord) -> Result<(), ApplicationError> {
        let mut records = self.records.write().await;
        records.insert(record.user_id.clone(), record);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRestaurantCatalog {
    restaurants: RwLock<HashMap<BusinessId, Restaurant>>,
}

impl InMemoryRestaurantCatalog {
    pub async fn insert(&self, restaurant: Restaurant) {
        let mut restaurants = self.restaurants.write().await;
        restaurants.insert(restaurant.business_id.clone(), restaurant);
    }
}

#[async_trait::async_trait]
impl RestaurantCatalog for InMemoryRestaurantCatalog {
    async fn batch_get(&self, ids: &[BusinessId]) -> Result<Vec<Restaurant>, ApplicationError> {
        let restaurants = self.restaurants.read().await;
        Ok(ids.iter().filter_map(|id| restaurants.get(id).cloned()).collect())
    }
}
