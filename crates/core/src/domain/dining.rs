use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::slots::{
    parse_dining_date, parse_dining_time, DiningSlots, SlotName, DINING_TIME_FORMAT,
};
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationType {
    #[default]
    Dining,
}

/// Unit of work handed to the suggestion worker through the queue.
///
/// The field names on the wire are the ones the worker and the stored
/// suggestion records have always used, so they are spelled out explicitly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiningRequest {
    #[serde(default)]
    pub reservation_type: ReservationType,
    pub location: String,
    pub cuisine: String,
    pub dining_date: NaiveDate,
    pub dining_time: String,
    pub number_of_people: u8,
    pub email: String,
    #[serde(rename = "user_id")]
    pub user_id: String,
}

impl DiningRequest {
    /// Assembles the request from slots that already passed validation.
    ///
    /// Fails with `MissingSlots` when any slot is absent; a value that does
    /// not parse is reported the same way since it cannot have been validated.
    pub fn from_validated_slots(
        slots: &DiningSlots,
        user_id: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let missing = slots.missing();
        if !missing.is_empty() {
            return Err(DomainError::MissingSlots { missing });
        }

        let unparsed = |slot: SlotName| DomainError::MissingSlots { missing: vec![slot] };

        let dining_date = slots
            .dining_date
            .as_deref()
            .and_then(parse_dining_date)
            .ok_or_else(|| unparsed(SlotName::DiningDate))?;
        let dining_time = slots
            .dining_time
            .as_deref()
            .and_then(parse_dining_time)
            .ok_or_else(|| unparsed(SlotName::DiningTime))?;
        let number_of_people = slots
            .number_of_people
            .and_then(|value| u8::try_from(value).ok())
            .ok_or_else(|| unparsed(SlotName::NumberOfPeople))?;

        Ok(Self {
            reservation_type: ReservationType::Dining,
            location: slots.location.clone().unwrap_or_default(),
            cuisine: slots.cuisine.clone().unwrap_or_default(),
            dining_date,
            dining_time: dining_time.format(DINING_TIME_FORMAT).to_string(),
            number_of_people,
            email: slots.email.clone().unwrap_or_default(),
            user_id: user_id.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::domain::dining::DiningRequest;
    use crate::domain::slots::{DiningSlots, SlotName};
    use crate::errors::DomainError;

    fn complete_slots() -> DiningSlots {
        DiningSlots {
            location: Some("Manhattan".to_owned()),
            cuisine: Some("Mexican".to_owned()),
            dining_date: Some("2099-01-01".to_owned()),
            dining_time: Some("7:30 PM".to_owned()),
            number_of_people: Some(4),
            email: Some("a@b.com".to_owned()),
        }
    }

    #[test]
    fn serializes_with_queue_field_names() {
        let request = DiningRequest::from_validated_slots(&complete_slots(), "session-42")
            .expect("complete slots should build a request");

        let payload = serde_json::to_value(&request).expect("request should serialize");

        assert_eq!(
            payload,
            json!({
                "ReservationType": "Dining",
                "Location": "Manhattan",
                "Cuisine": "Mexican",
                "DiningDate": "2099-01-01",
                "DiningTime": "19:30",
                "NumberOfPeople": 4,
                "Email": "a@b.com",
                "user_id": "session-42"
            })
        );
    }

    #[test]
    fn accepts_payloads_without_reservation_type() {
        let request: DiningRequest = serde_json::from_value(json!({
            "Location": "Manhattan",
            "Cuisine": "thai",
            "DiningDate": "2099-03-04",
            "DiningTime": "12:00",
            "NumberOfPeople": 2,
            "Email": "guest@example.com",
            "user_id": "u-1"
        }))
        .expect("legacy payload should decode");

        assert_eq!(request.cuisine, "thai");
        assert_eq!(request.number_of_people, 2);
    }

    #[test]
    fn missing_slots_are_reported_in_elicitation_order() {
        let slots = DiningSlots { email: None, cuisine: None, ..complete_slots() };

        let error = DiningRequest::from_validated_slots(&slots, "session-1")
            .expect_err("incomplete slots must not build a request");

        assert_eq!(
            error,
            DomainError::MissingSlots { missing: vec![SlotName::Cuisine, SlotName::Email] }
        );
    }
}
