use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::dialog::lex::Intent;

/// Slots collected by the dining suggestions intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotName {
    Location,
    Cuisine,
    DiningDate,
    DiningTime,
    NumberOfPeople,
    Email,
}

impl SlotName {
    /// Elicitation order used when a slot is still missing at fulfillment.
    pub const ALL: [SlotName; 6] = [
        SlotName::Location,
        SlotName::Cuisine,
        SlotName::DiningDate,
        SlotName::DiningTime,
        SlotName::NumberOfPeople,
        SlotName::Email,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Location => "Location",
            Self::Cuisine => "Cuisine",
            Self::DiningDate => "DiningDate",
            Self::DiningTime => "DiningTime",
            Self::NumberOfPeople => "NumberOfPeople",
            Self::Email => "Email",
        }
    }

    /// Re-prompt used when the slot is absent at fulfillment time.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Location => "Which city or area are you looking to dine in?",
            Self::Cuisine => "What cuisine would you like to try?",
            Self::DiningDate => "Which date would you like the reservation for?",
            Self::DiningTime => "What time would you like to dine?",
            Self::NumberOfPeople => "How many people are in your party?",
            Self::Email => "What email address should I send the suggestions to?",
        }
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed snapshot of the dining slots of one turn.
///
/// Every field is `None` until the NLU layer has interpreted a value for it.
/// `number_of_people` is also `None` when the interpreted value is not an
/// integer, which defers to the NLU engine to keep eliciting it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiningSlots {
    pub location: Option<String>,
    pub cuisine: Option<String>,
    pub dining_date: Option<String>,
    pub dining_time: Option<String>,
    pub number_of_people: Option<i64>,
    pub email: Option<String>,
}

impl DiningSlots {
    pub fn from_intent(intent: &Intent) -> Self {
        let text = |slot: SlotName| intent.interpreted_value(slot).map(str::to_owned);

        Self {
            location: text(SlotName::Location),
            cuisine: text(SlotName::Cuisine),
            dining_date: text(SlotName::DiningDate),
            dining_time: text(SlotName::DiningTime),
            number_of_people: intent
                .interpreted_value(SlotName::NumberOfPeople)
                .and_then(|value| value.trim().parse::<i64>().ok()),
            email: text(SlotName::Email),
        }
    }

    pub fn missing(&self) -> Vec<SlotName> {
        SlotName::ALL.into_iter().filter(|slot| !self.is_present(*slot)).collect()
    }

    fn is_present(&self, slot: SlotName) -> bool {
        match slot {
            SlotName::Location => self.location.is_some(),
            SlotName::Cuisine => self.cuisine.is_some(),
            SlotName::DiningDate => self.dining_date.is_some(),
            SlotName::DiningTime => self.dining_time.is_some(),
            SlotName::NumberOfPeople => self.number_of_people.is_some(),
            SlotName::Email => self.email.is_some(),
        }
    }
}

pub const DINING_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DINING_TIME_FORMAT: &str = "%H:%M";

pub fn parse_dining_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DINING_DATE_FORMAT).ok()
}

/// Accepts the 24h values the NLU engine resolves (`19:00`, `19:00:00`) as well
/// as 12h input typed by hand (`7:00 PM`).
pub fn parse_dining_time(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    let upper = trimmed.to_ascii_uppercase();
    ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"]
        .iter()
        .find_map(|format| {
            let candidate = if format.contains("%p") { upper.as_str() } else { trimmed };
            NaiveTime::parse_from_str(candidate, format).ok()
        })
}
