use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::dialog::lex::Message;
use crate::domain::slots::{parse_dining_date, parse_dining_time, DiningSlots, SlotName};

pub const SUPPORTED_CUISINES: [&str; 7] =
    ["thai", "indian", "french", "italian", "mexican", "chinese", "japanese"];

pub const DEFAULT_LOCATION: &str = "Manhattan";

pub const MIN_PARTY_SIZE: i64 = 1;
pub const MAX_PARTY_SIZE: i64 = 100;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotViolation {
    pub slot: SlotName,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(SlotViolation),
}

impl ValidationResult {
    fn invalid(slot: SlotName, message: impl Into<String>) -> Self {
        Self::Invalid(SlotViolation { slot, message: message.into() })
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn violated_slot(&self) -> Option<SlotName> {
        match self {
            Self::Valid => None,
            Self::Invalid(violation) => Some(violation.slot),
        }
    }

    pub fn message(&self) -> Option<Message> {
        match self {
            Self::Valid => None,
            Self::Invalid(violation) => Some(Message::plain_text(violation.message.clone())),
        }
    }
}

/// Static validity rules for the dining slots.
///
/// Slots are checked in a fixed order (location, date, time, party size,
/// cuisine, email) and the first violation wins. Absent slots never violate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotValidator {
    supported_locations: Vec<String>,
}

impl Default for SlotValidator {
    fn default() -> Self {
        Self { supported_locations: vec![DEFAULT_LOCATION.to_owned()] }
    }
}

impl SlotValidator {
    /// Falls back to the default city when `supported_locations` is empty.
    pub fn new(supported_locations: Vec<String>) -> Self {
        let supported_locations: Vec<String> = supported_locations
            .into_iter()
            .map(|location| location.trim().to_owned())
            .filter(|location| !location.is_empty())
            .collect();

        if supported_locations.is_empty() {
            return Self::default();
        }
        Self { supported_locations }
    }

    pub fn supported_locations(&self) -> &[String] {
        &self.supported_locations
    }

    pub fn validate(&self, slots: &DiningSlots, today: NaiveDate) -> ValidationResult {
        if let Some(location) = slots.location.as_deref() {
            if !self.is_supported_location(location) {
                return ValidationResult::invalid(
                    SlotName::Location,
                    format!(
                        "We currently do not support {location} as a valid destination. \
                         {featured} is the hottest spot we serve. \
                         Could you please enter your preferred location?",
                        featured = self.supported_locations[0]
                    ),
                );
            }
        }

        if let Some(raw) = slots.dining_date.as_deref() {
            let Some(date) = parse_dining_date(raw) else {
                return ValidationResult::invalid(
                    SlotName::DiningDate,
                    "I did not understand your date. When would you like to make reservation?",
                );
            };
            if date <= today {
                return ValidationResult::invalid(
                    SlotName::DiningDate,
                    "Reservations must be scheduled at least one day in advance. \
                     Can you try a different date?",
                );
            }
        }

        if let Some(raw) = slots.dining_time.as_deref() {
            if parse_dining_time(raw).is_none() {
                return ValidationResult::invalid(
                    SlotName::DiningTime,
                    "I did not get your time. When would you like to make reservation?",
                );
            }
        }

        if let Some(party_size) = slots.number_of_people {
            if !(MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&party_size) {
                return ValidationResult::invalid(
                    SlotName::NumberOfPeople,
                    "You can make a reservation for from 1 to 100 person. \
                     How many number of people would you like to make reservation for?",
                );
            }
        }

        if let Some(cuisine) = slots.cuisine.as_deref() {
            if !is_supported_cuisine(cuisine) {
                return ValidationResult::invalid(
                    SlotName::Cuisine,
                    "Cuisine Type seems to be inaccurate. Would you like to try cuisine from \
                     Thai, Indian, French, Italian, Mexican, Chinese or Japanese?",
                );
            }
        }

        if let Some(email) = slots.email.as_deref() {
            if !is_valid_email(email) {
                return ValidationResult::invalid(
                    SlotName::Email,
                    "Provided Email is inaccurate. Please check the email and try again.",
                );
            }
        }

        ValidationResult::Valid
    }

    fn is_supported_location(&self, location: &str) -> bool {
        let location = location.trim();
        self.supported_locations.iter().any(|supported| supported.eq_ignore_ascii_case(location))
    }
}

pub fn is_supported_cuisine(cuisine: &str) -> bool {
    let cuisine = cuisine.trim();
    SUPPORTED_CUISINES.iter().any(|supported| supported.eq_ignore_ascii_case(cuisine))
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX
        .get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"))
        .is_match(email)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::dialog::validation::{SlotValidator, ValidationResult, SUPPORTED_CUISINES};
    use crate::domain::slots::{DiningSlots, SlotName};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date")
    }

    fn valid_slots() -> DiningSlots {
        DiningSlots {
            location: Some("Manhattan".to_owned()),
            cuisine: Some("Mexican".to_owned()),
            dining_date: Some("2099-01-01".to_owned()),
            dining_time: Some("19:00".to_owned()),
            number_of_people: Some(4),
            email: Some("a@b.com".to_owned()),
        }
    }

    fn violated(slots: &DiningSlots) -> Option<SlotName> {
        SlotValidator::default().validate(slots, today()).violated_slot()
    }

    #[test]
    fn complete_valid_slots_pass_without_message() {
        let result = SlotValidator::default().validate(&valid_slots(), today());

        assert_eq!(result, ValidationResult::Valid);
        assert!(result.is_valid());
        assert_eq!(result.message(), None);
    }

    #[test]
    fn empty_slots_are_not_violations() {
        assert!(SlotValidator::default().validate(&DiningSlots::default(), today()).is_valid());
    }

    #[test]
    fn location_is_case_insensitive_member_of_supported_set() {
        for location in ["manhattan", "MANHATTAN", "mAnHaTtAn", " Manhattan "] {
            let slots = DiningSlots { location: Some(location.to_owned()), ..valid_slots() };
            assert_eq!(violated(&slots), None, "{location} should be accepted");
        }

        let slots = DiningSlots { location: Some("Brooklyn".to_owned()), ..valid_slots() };
        let result = SlotValidator::default().validate(&slots, today());
        assert_eq!(result.violated_slot(), Some(SlotName::Location));
        let message = result.message().expect("violation carries a message").content;
        assert!(message.contains("Brooklyn"));
        assert!(message.contains("Manhattan is the hottest spot"));
    }

    #[test]
    fn configured_locations_replace_default_city() {
        let validator = SlotValidator::new(vec!["Brooklyn".to_owned(), "Queens".to_owned()]);
        let slots = DiningSlots { location: Some("queens".to_owned()), ..valid_slots() };
        assert!(validator.validate(&slots, today()).is_valid());

        let slots = DiningSlots { location: Some("Manhattan".to_owned()), ..valid_slots() };
        assert_eq!(validator.validate(&slots, today()).violated_slot(), Some(SlotName::Location));

        assert_eq!(validator.supported_locations(), ["Brooklyn".to_owned(), "Queens".to_owned()]);
        assert_eq!(SlotValidator::new(vec![" ".to_owned()]), SlotValidator::default());
    }

    #[test]
    fn dates_on_or_before_today_are_rejected() {
        for date in ["2026-10-18", "2026-10-17", "1999-12-31"] {
            let slots = DiningSlots { dining_date: Some(date.to_owned()), ..valid_slots() };
            let result = SlotValidator::default().validate(&slots, today());
            assert_eq!(result.violated_slot(), Some(SlotName::DiningDate), "{date}");
            assert!(result
                .message()
                .expect("message")
                .content
                .starts_with("Reservations must be scheduled at least one day in advance"));
        }

        let tomorrow = DiningSlots { dining_date: Some("2026-10-19".to_owned()), ..valid_slots() };
        assert_eq!(violated(&tomorrow), None);
    }

    #[test]
    fn unparseable_date_gets_its_own_message() {
        let slots = DiningSlots { dining_date: Some("someday".to_owned()), ..valid_slots() };
        let result = SlotValidator::default().validate(&slots, today());

        assert_eq!(result.violated_slot(), Some(SlotName::DiningDate));
        assert!(result.message().expect("message").content.starts_with("I did not understand"));
    }

    #[test]
    fn time_must_parse_but_has_no_range_restriction() {
        for time in ["00:00", "23:59", "06:15"] {
            let slots = DiningSlots { dining_time: Some(time.to_owned()), ..valid_slots() };
            assert_eq!(violated(&slots), None, "{time}");
        }

        let slots = DiningSlots { dining_time: Some("late".to_owned()), ..valid_slots() };
        assert_eq!(violated(&slots), Some(SlotName::DiningTime));
    }

    #[test]
    fn party_size_bounds_are_inclusive() {
        for size in [1, 2, 50, 100] {
            let slots = DiningSlots { number_of_people: Some(size), ..valid_slots() };
            assert_eq!(violated(&slots), None, "{size}");
        }
        for size in [-3, 0, 101, 500] {
            let slots = DiningSlots { number_of_people: Some(size), ..valid_slots() };
            assert_eq!(violated(&slots), Some(SlotName::NumberOfPeople), "{size}");
        }
    }

    #[test]
    fn cuisine_must_be_in_enumeration() {
        for cuisine in SUPPORTED_CUISINES {
            let slots =
                DiningSlots { cuisine: Some(cuisine.to_ascii_uppercase()), ..valid_slots() };
            assert_eq!(violated(&slots), None, "{cuisine}");
        }
        for cuisine in ["korean", "thai food", ""] {
            let slots = DiningSlots { cuisine: Some(cuisine.to_owned()), ..valid_slots() };
            assert_eq!(violated(&slots), Some(SlotName::Cuisine), "{cuisine}");
        }
    }

    #[test]
    fn email_must_match_address_pattern() {
        for email in ["a@b.com", "first.last+tag@mail.example.org"] {
            let slots = DiningSlots { email: Some(email.to_owned()), ..valid_slots() };
            assert_eq!(violated(&slots), None, "{email}");
        }
        for email in ["ab.com", "a@bcom", "a@b.c", "a b@c.com"] {
            let slots = DiningSlots { email: Some(email.to_owned()), ..valid_slots() };
            assert_eq!(violated(&slots), Some(SlotName::Email), "{email}");
        }
    }

    #[test]
    fn first_violation_in_check_order_wins() {
        let slots = DiningSlots {
            location: Some("Paris".to_owned()),
            dining_date: Some("2000-01-01".to_owned()),
            email: Some("nope".to_owned()),
            ..valid_slots()
        };
        assert_eq!(violated(&slots), Some(SlotName::Location));

        let slots = DiningSlots {
            number_of_people: Some(0),
            cuisine: Some("korean".to_owned()),
            ..valid_slots()
        };
        assert_eq!(violated(&slots), Some(SlotName::NumberOfPeople));
    }
}
