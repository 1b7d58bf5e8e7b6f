use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;

use crate::dialog::lex::LexEvent;
use crate::domain::dining::DiningRequest;
use crate::domain::restaurant::{BusinessId, Restaurant, SuggestionRecord};
use crate::errors::ApplicationError;
use crate::ports::{
    QueueConsumer, QueuedMessage, RestaurantCatalog, RestaurantSearch, SuggestionHistory,
    SuggestionMailer, SuggestionQueue,
};

pub fn dining_event(invocation_source: &str, slots: &[(&str, &str)]) -> LexEvent {
    let slots: serde_json::Map<String, serde_json::Value> = slots
        .iter()
        .map(|(name, value)| {
            (
                (*name).to_owned(),
                json!({ "value": { "originalValue": value, "interpretedValue": value } }),
            )
        })
        .collect();

    serde_json::from_value(json!({
        "sessionId": "session-42",
        "invocationSource": invocation_source,
        "bot": { "name": "DiningConcierge" },
        "sessionState": {
            "intent": { "name": "DiningSuggestionsIntent", "slots": slots, "state": "InProgress" },
            "sessionAttributes": {}
        }
    }))
    .expect("dining event fixture should decode")
}

pub fn valid_dining_slots() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Location", "Manhattan"),
        ("Cuisine", "Mexican"),
        ("DiningDate", "2099-01-01"),
        ("DiningTime", "19:00"),
        ("NumberOfPeople", "4"),
        ("Email", "a@b.com"),
    ]
}

pub fn dining_request(user_id: &str) -> DiningRequest {
    serde_json::from_value(json!({
        "ReservationType": "Dining",
        "Location": "Manhattan",
        "Cuisine": "Mexican",
        "DiningDate": "2099-01-01",
        "DiningTime": "19:00",
        "NumberOfPeople": 4,
        "Email": "a@b.com",
        "user_id": user_id
    }))
    .expect("dining request fixture should decode")
}

pub fn restaurant(id: &str, name: &str) -> Restaurant {
    Restaurant {
        business_id: BusinessId(id.to_owned()),
        name: name.to_owned(),
        address: format!("{} Broadway, New York, NY 10012", id.len() * 100),
        cuisine: "Mexican".to_owned(),
        rating: Some(Decimal::new(45, 1)),
        reviews: Some(312),
    }
}

#[derive(Default)]
pub struct RecordingQueue {
    pub sent: Mutex<Vec<DiningRequest>>,
    pub fail: bool,
}

impl RecordingQueue {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn sent(&self) -> Vec<DiningRequest> {
        self.sent.lock().expect("queue lock").clone()
    }
}

#[async_trait]
impl SuggestionQueue for RecordingQueue {
    async fn send(&self, request: &DiningRequest) -> Result<String, ApplicationError> {
        if self.fail {
            return Err(ApplicationError::Integration("queue unavailable".to_owned()));
        }
        let mut sent = self.sent.lock().expect("queue lock");
        sent.push(request.clone());
        Ok(format!("msg-{}", sent.len()))
    }
}

#[derive(Default)]
pub struct InMemoryHistory {
    pub records: Mutex<HashMap<String, SuggestionRecord>>,
    pub fail: bool,
}

impl InMemoryHistory {
    pub fn with_record(record: SuggestionRecord) -> Self {
        let history = Self::default();
        history.records.lock().expect("history lock").insert(record.user_id.clone(), record);
        history
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn get(&self, user_id: &str) -> Option<SuggestionRecord> {
        self.records.lock().expect("history lock").get(user_id).cloned()
    }
}

#[async_trait]
impl SuggestionHistory for InMemoryHistory {
    async fn find_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<SuggestionRecord>, ApplicationError> {
        if self.fail {
            return Err(ApplicationError::Persistence("history table unavailable".to_owned()));
        }
        Ok(self.get(user_id))
    }

    async fn save(&self, record: SuggestionRecord) -> Result<(), ApplicationError> {
        if self.fail {
            return Err(ApplicationError::Persistence("history table unavailable".to_owned()));
        }
        self.records.lock().expect("history lock").insert(record.user_id.clone(), record);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(DiningRequest, Vec<Restaurant>)>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn sent(&self) -> Vec<(DiningRequest, Vec<Restaurant>)> {
        self.sent.lock().expect("mailer lock").clone()
    }
}

#[async_trait]
impl SuggestionMailer for RecordingMailer {
    async fn send_suggestions(
        &self,
        request: &DiningRequest,
        restaurants: &[Restaurant],
    ) -> Result<(), ApplicationError> {
        if self.fail {
            return Err(ApplicationError::Integration("mail api rejected request".to_owned()));
        }
        self.sent.lock().expect("mailer lock").push((request.clone(), restaurants.to_vec()));
        Ok(())
    }
}

/// Hands out a fixed batch once and records deletions.
#[derive(Default)]
pub struct ScriptedQueue {
    pub pending: Mutex<Vec<QueuedMessage>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_deletes: bool,
}

impl ScriptedQueue {
    pub fn with_bodies(bodies: &[String]) -> Self {
        let pending = bodies
            .iter()
            .enumerate()
            .map(|(index, body)| QueuedMessage {
                message_id: format!("msg-{index}"),
                receipt_handle: format!("rh-{index}"),
                body: body.clone(),
                receive_count: 1,
            })
            .collect();
        Self { pending: Mutex::new(pending), ..Self::default() }
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().expect("queue lock").clone()
    }
}

#[async_trait]
impl QueueConsumer for ScriptedQueue {
    async fn receive(
        &self,
        max_messages: u32,
        _visibility_timeout_secs: u64,
    ) -> Result<Vec<QueuedMessage>, ApplicationError> {
        let mut pending = self.pending.lock().expect("queue lock");
        let take = pending.len().min(max_messages as usize);
        Ok(pending.drain(..take).collect())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<bool, ApplicationError> {
        if self.fail_deletes {
            return Err(ApplicationError::Integration("delete rejected".to_owned()));
        }
        self.deleted.lock().expect("queue lock").push(receipt_handle.to_owned());
        Ok(true)
    }
}

#[derive(Default)]
pub struct StaticSearch {
    pub by_cuisine: HashMap<String, Vec<BusinessId>>,
    pub fail: bool,
}

impl StaticSearch {
    pub fn with(cuisine: &str, ids: &[&str]) -> Self {
        let mut by_cuisine = HashMap::new();
        by_cuisine.insert(
            cuisine.to_ascii_lowercase(),
            ids.iter().map(|id| BusinessId((*id).to_owned())).collect(),
        );
        Self { by_cuisine, fail: false }
    }
}

#[async_trait]
impl RestaurantSearch for StaticSearch {
    async fn find_business_ids(&self, cuisine: &str) -> Result<Vec<BusinessId>, ApplicationError> {
        if self.fail {
            return Err(ApplicationError::Integration("search cluster unreachable".to_owned()));
        }
        Ok(self.by_cuisine.get(&cuisine.to_ascii_lowercase()).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct StaticCatalog {
    pub restaurants: Vec<Restaurant>,
    pub fail: bool,
}

#[async_trait]
impl RestaurantCatalog for StaticCatalog {
    async fn batch_get(&self, ids: &[BusinessId]) -> Result<Vec<Restaurant>, ApplicationError> {
        if self.fail {
            return Err(ApplicationError::Persistence("catalog unavailable".to_owned()));
        }
        Ok(self
            .restaurants
            .iter()
            .filter(|restaurant| ids.contains(&restaurant.business_id))
            .cloned()
            .collect())
    }
}
