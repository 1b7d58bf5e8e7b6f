use serde::{Deserialize, Serialize};

use crate::dialog::lex::InvocationSource;

pub const DINING_SUGGESTIONS_INTENT: &str = "DiningSuggestionsIntent";
pub const GREETING_INTENT: &str = "GreetingIntent";
pub const THANK_YOU_INTENT: &str = "ThankYouIntent";

/// Session attribute holding the cached past suggestions between the
/// greeting's confirmation prompt and the user's answer.
pub const RESTAURANTS_ATTRIBUTE: &str = "restaurants_list";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentKind {
    CollectSlots,
    Fulfill,
    Greet,
    ThankYou,
    Unsupported(String),
}

impl IntentKind {
    pub fn classify(intent_name: &str, invocation_source: InvocationSource) -> Self {
        match (intent_name, invocation_source) {
            (DINING_SUGGESTIONS_INTENT, InvocationSource::DialogCodeHook) => Self::CollectSlots,
            (DINING_SUGGESTIONS_INTENT, InvocationSource::FulfillmentCodeHook) => Self::Fulfill,
            (GREETING_INTENT, _) => Self::Greet,
            (THANK_YOU_INTENT, _) => Self::ThankYou,
            (other, _) => Self::Unsupported(other.to_owned()),
        }
    }
}
