//! Wire model of the conversational engine's code-hook contract.
//!
//! Only the fields the concierge reads or writes are typed; everything else is
//! carried through `extra` so a session state round-trips unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::slots::SlotName;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationSource {
    DialogCodeHook,
    FulfillmentCodeHook,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexEvent {
    pub session_id: String,
    pub invocation_source: InvocationSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot: Option<Bot>,
    pub session_state: SessionState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interpretations: Vec<Interpretation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LexEvent {
    pub fn intent_name(&self) -> Option<&str> {
        self.session_state.intent.as_ref().map(|intent| intent.name.as_str())
    }

    /// Confirmation answer of the current turn: the top interpretation wins,
    /// the session intent is the fallback.
    pub fn confirmation_state(&self) -> Option<ConfirmationState> {
        self.interpretations
            .first()
            .and_then(|interpretation| interpretation.intent.confirmation_state)
            .or_else(|| {
                self.session_state.intent.as_ref().and_then(|intent| intent.confirmation_state)
            })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialog_action: Option<DialogAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub session_attributes: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub slots: BTreeMap<String, Option<Slot>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<IntentState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_state: Option<ConfirmationState>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Intent {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: BTreeMap::new(),
            state: None,
            confirmation_state: None,
            extra: Map::new(),
        }
    }

    /// Interpreted value of a slot, `None` when the slot is unset at any level.
    pub fn interpreted_value(&self, slot: SlotName) -> Option<&str> {
        self.slots
            .get(slot.as_str())?
            .as_ref()?
            .value
            .as_ref()?
            .interpreted_value
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<SlotValue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreted_value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolved_values: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    pub intent: Intent,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentState {
    Failed,
    Fulfilled,
    InProgress,
    ReadyForFulfillment,
    Waiting,
    FulfillmentInProgress,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationState {
    Confirmed,
    Denied,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogActionType {
    ElicitSlot,
    ConfirmIntent,
    Delegate,
    Close,
    ElicitIntent,
}

impl DialogActionType {
    /// Whether the conversation turn ends with this directive.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Close)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogAction {
    #[serde(rename = "type")]
    pub action_type: DialogActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_to_elicit: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    PlainText,
    CustomPayload,
    ImageResponseCard,
    #[serde(rename = "SSML")]
    Ssml,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub content_type: ContentType,
    pub content: String,
}

impl Message {
    pub fn plain_text(content: impl Into<String>) -> Self {
        Self { content_type: ContentType::PlainText, content: content.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexResponse {
    pub session_state: SessionState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

impl LexResponse {
    pub fn dialog_action_type(&self) -> Option<DialogActionType> {
        self.session_state.dialog_action.as_ref().map(|action| action.action_type)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::dialog::lex::{ConfirmationState, InvocationSource, LexEvent};
    use crate::domain::slots::SlotName;

    fn event() -> serde_json::Value {
        json!({
            "sessionId": "908027408981943",
            "invocationSource": "DialogCodeHook",
            "inputTranscript": "yes",
            "bot": { "name": "DiningConcierge", "id": "BOT1", "localeId": "en_US" },
            "sessionState": {
                "activeContexts": [],
                "sessionAttributes": { "restaurants_list": "{}" },
                "intent": {
                    "name": "GreetingIntent",
                    "slots": {},
                    "state": "InProgress",
                    "confirmationState": "None"
                }
            },
            "interpretations": [
                { "intent": { "name": "GreetingIntent", "slots": {}, "confirmationState": "Confirmed" }, "nluConfidence": 0.93 }
            ],
            "responseContentType": "text/plain; charset=utf-8"
        })
    }

    #[test]
    fn decodes_code_hook_event_and_keeps_unknown_fields() {
        let raw = event();
        let parsed: LexEvent = serde_json::from_value(raw.clone()).expect("event should decode");

        assert_eq!(parsed.invocation_source, InvocationSource::DialogCodeHook);
        assert_eq!(parsed.intent_name(), Some("GreetingIntent"));
        assert!(parsed.session_state.extra.contains_key("activeContexts"));
        assert!(parsed.extra.contains_key("responseContentType"));

        let encoded = serde_json::to_value(&parsed).expect("event should encode");
        assert_eq!(encoded["sessionState"]["activeContexts"], json!([]));
        assert_eq!(encoded["interpretations"][0]["nluConfidence"], json!(0.93));
    }

    #[test]
    fn interpretation_confirmation_takes_precedence() {
        let parsed: LexEvent = serde_json::from_value(event()).expect("event should decode");
        assert_eq!(parsed.confirmation_state(), Some(ConfirmationState::Confirmed));

        let mut without_interpretations = parsed.clone();
        without_interpretations.interpretations.clear();
        assert_eq!(without_interpretations.confirmation_state(), Some(ConfirmationState::None));
    }

    #[test]
    fn slot_accessor_treats_blank_and_missing_levels_as_absent() {
        let mut raw = event();
        raw["sessionState"]["intent"]["slots"] = json!({
            "Location": { "value": { "interpretedValue": "  " } },
            "Cuisine": { "shape": "Scalar" },
            "Email": null
        });
        let parsed: LexEvent = serde_json::from_value(raw).expect("event should decode");
        let intent = parsed.session_state.intent.expect("intent present");

        assert_eq!(intent.interpreted_value(SlotName::Location), None);
        assert_eq!(intent.interpreted_value(SlotName::Cuisine), None);
        assert_eq!(intent.interpreted_value(SlotName::Email), None);
        assert_eq!(intent.interpreted_value(SlotName::DiningDate), None);
    }
}
