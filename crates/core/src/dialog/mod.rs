pub mod lex;
pub mod response;
pub mod validation;

pub use lex::{
    ConfirmationState, ContentType, DialogAction, DialogActionType, Intent, IntentState,
    InvocationSource, LexEvent, LexResponse, Message, SessionState,
};
pub use response::{close, confirm_intent, delegate, elicit_slot};
pub use validation::{SlotValidator, SlotViolation, ValidationResult};
