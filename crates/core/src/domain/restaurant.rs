use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::dining::DiningRequest;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusinessId(pub String);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub business_id: BusinessId,
    pub name: String,
    pub address: String,
    pub cuisine: String,
    #[serde(default)]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub reviews: Option<u32>,
}

/// Last batch of suggestions delivered to a user, kept so a returning user
/// can ask for it again.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRecord {
    pub user_id: String,
    pub dining_details: DiningRequest,
    pub restaurants: Vec<Restaurant>,
}

impl SuggestionRecord {
    pub fn new(dining_details: DiningRequest, restaurants: Vec<Restaurant>) -> Self {
        Self { user_id: dining_details.user_id.clone(), dining_details, restaurants }
    }
}

/// Canonical spelling of a cuisine as stored in the search index and shown
/// in emails: first letter upper case, the rest lower case.
pub fn capitalize_cuisine(cuisine: &str) -> String {
    let trimmed = cuisine.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
