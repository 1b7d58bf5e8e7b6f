//! Builders for the four directives the concierge hands back to the engine.
//!
//! Each builder takes the session state by value and returns the full
//! response envelope; nothing else is touched.

use crate::dialog::lex::{
    DialogAction, DialogActionType, Intent, IntentState, LexResponse, Message, SessionState,
};
use crate::domain::slots::SlotName;

pub fn elicit_slot(
    mut session_state: SessionState,
    slot_to_elicit: SlotName,
    message: Option<Message>,
) -> LexResponse {
    session_state.dialog_action = Some(DialogAction {
        action_type: DialogActionType::ElicitSlot,
        slot_to_elicit: Some(slot_to_elicit.as_str().to_owned()),
    });

    LexResponse { session_state, messages: message.into_iter().collect() }
}

pub fn confirm_intent(mut session_state: SessionState, message: Message) -> LexResponse {
    session_state.dialog_action =
        Some(DialogAction { action_type: DialogActionType::ConfirmIntent, slot_to_elicit: None });

    LexResponse { session_state, messages: vec![message] }
}

pub fn delegate(mut session_state: SessionState) -> LexResponse {
    session_state.dialog_action =
        Some(DialogAction { action_type: DialogActionType::Delegate, slot_to_elicit: None });

    LexResponse { session_state, messages: Vec::new() }
}

/// Ends the turn with a fresh session state that marks `intent_name` fulfilled.
pub fn close(intent_name: &str, message: Message) -> LexResponse {
    let mut intent = Intent::named(intent_name);
    intent.state = Some(IntentState::Fulfilled);

    let session_state = SessionState {
        dialog_action: Some(DialogAction {
            action_type: DialogActionType::Close,
            slot_to_elicit: None,
        }),
        intent: Some(intent),
        ..SessionState::default()
    };

    LexResponse { session_state, messages: vec![message] }
}
