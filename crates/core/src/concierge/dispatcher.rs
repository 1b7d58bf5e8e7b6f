use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::concierge::intents::{IntentKind, RESTAURANTS_ATTRIBUTE};
use crate::dialog::lex::{ConfirmationState, LexEvent, LexResponse, Message, SessionState};
use crate::dialog::response::{close, confirm_intent, delegate, elicit_slot};
use crate::dialog::validation::{SlotValidator, ValidationResult};
use crate::domain::dining::DiningRequest;
use crate::domain::restaurant::SuggestionRecord;
use crate::domain::slots::DiningSlots;
use crate::errors::DomainError;
use crate::ports::{Clock, SuggestionHistory, SuggestionMailer, SuggestionQueue};

pub const REQUEST_QUEUED_MESSAGE: &str =
    "You’re all set. Expect my suggestions shortly! Have a good day.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Sorry, we are facing some issues!";
pub const RESEND_CONFIRMED_MESSAGE: &str =
    "Great! You will receive suggestions on your email shortly!";
pub const RESEND_DENIED_MESSAGE: &str = "No problem! Tell me how can I assist you today?";
pub const GREETING_MESSAGE: &str = "Hi there! How can I help you today?";
pub const THANK_YOU_MESSAGE: &str = "You’re welcome! Have a nice day.";

/// Turns one code-hook event into the next dialog directive.
///
/// Collaborator failures never surface as errors: a failed enqueue becomes an
/// apology, a failed history lookup or mail send is logged. Only requests the
/// concierge cannot interpret at all are returned as `DomainError`.
pub struct IntentDispatcher {
    validator: SlotValidator,
    queue: Arc<dyn SuggestionQueue>,
    history: Arc<dyn SuggestionHistory>,
    mailer: Arc<dyn SuggestionMailer>,
    clock: Arc<dyn Clock>,
}

impl IntentDispatcher {
    pub fn new(
        validator: SlotValidator,
        queue: Arc<dyn SuggestionQueue>,
        history: Arc<dyn SuggestionHistory>,
        mailer: Arc<dyn SuggestionMailer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { validator, queue, history, mailer, clock }
    }

    pub async fn dispatch(&self, event: LexEvent) -> Result<LexResponse, DomainError> {
        let intent_name = event.intent_name().ok_or(DomainError::MissingIntent)?.to_owned();
        let kind = IntentKind::classify(&intent_name, event.invocation_source);
        debug!(
            event_name = "concierge.intent.classified",
            session_id = %event.session_id,
            intent = %intent_name,
            kind = ?kind,
            "classified code hook event"
        );

        let session_id = event.session_id.clone();
        let response = match kind {
            IntentKind::CollectSlots => self.collect_slots(event),
            IntentKind::Fulfill => self.fulfill(&intent_name, event).await,
            IntentKind::Greet => self.greet(&intent_name, event).await,
            IntentKind::ThankYou => close(&intent_name, Message::plain_text(THANK_YOU_MESSAGE)),
            IntentKind::Unsupported(name) => {
                warn!(
                    event_name = "concierge.intent.unsupported",
                    session_id = %session_id,
                    intent = %name,
                    "rejecting unsupported intent"
                );
                return Err(DomainError::UnsupportedIntent { name });
            }
        };

        info!(
            event_name = "concierge.intent.dispatched",
            session_id = %session_id,
            intent = %intent_name,
            dialog_action = ?response.dialog_action_type(),
            "dialog directive ready"
        );
        Ok(response)
    }

    fn collect_slots(&self, event: LexEvent) -> LexResponse {
        let slots = dining_slots(&event.session_state);
        match self.validator.validate(&slots, self.clock.today()) {
            ValidationResult::Valid => delegate(event.session_state),
            ValidationResult::Invalid(violation) => {
                debug!(
                    event_name = "concierge.slot.rejected",
                    session_id = %event.session_id,
                    slot = %violation.slot,
                    "re-eliciting invalid slot"
                );
                elicit_slot(
                    event.session_state,
                    violation.slot,
                    Some(Message::plain_text(violation.message)),
                )
            }
        }
    }

    async fn fulfill(&self, intent_name: &str, event: LexEvent) -> LexResponse {
        let slots = dining_slots(&event.session_state);
        if let ValidationResult::Invalid(violation) =
            self.validator.validate(&slots, self.clock.today())
        {
            return elicit_slot(
                event.session_state,
                violation.slot,
                Some(Message::plain_text(violation.message)),
            );
        }

        let request = match DiningRequest::from_validated_slots(&slots, event.session_id.as_str())
        {
            Ok(request) => request,
            Err(error) => {
                let slot = match &error {
                    DomainError::MissingSlots { missing } => missing.first().copied(),
                    _ => None,
                };
                warn!(
                    event_name = "concierge.fulfillment.incomplete",
                    session_id = %event.session_id,
                    error = %error,
                    "fulfillment requested before every slot was collected"
                );
                return match slot {
                    Some(slot) => elicit_slot(
                        event.session_state,
                        slot,
                        Some(Message::plain_text(slot.prompt())),
                    ),
                    None => close(intent_name, Message::plain_text(GENERIC_FAILURE_MESSAGE)),
                };
            }
        };

        match self.queue.send(&request).await {
            Ok(message_id) => {
                info!(
                    event_name = "concierge.request.queued",
                    session_id = %event.session_id,
                    message_id = %message_id,
                    cuisine = %request.cuisine,
                    "dining request queued for suggestions"
                );
                close(intent_name, Message::plain_text(REQUEST_QUEUED_MESSAGE))
            }
            Err(error) => {
                error!(
                    event_name = "concierge.request.queue_failed",
                    session_id = %event.session_id,
                    error = %error,
                    "failed to queue dining request"
                );
                close(intent_name, Message::plain_text(GENERIC_FAILURE_MESSAGE))
            }
        }
    }

    async fn greet(&self, intent_name: &str, event: LexEvent) -> LexResponse {
        match event.confirmation_state() {
            Some(ConfirmationState::Confirmed) => {
                self.resend_cached(intent_name, &event.session_id, &event.session_state).await
            }
            Some(ConfirmationState::Denied) => {
                close(intent_name, Message::plain_text(RESEND_DENIED_MESSAGE))
            }
            _ => self.offer_previous(intent_name, event).await,
        }
    }

    async fn resend_cached(
        &self,
        intent_name: &str,
        session_id: &str,
        session_state: &SessionState,
    ) -> LexResponse {
        let cached = session_state
            .session_attributes
            .get(RESTAURANTS_ATTRIBUTE)
            .map(|raw| serde_json::from_str::<SuggestionRecord>(raw));

        let record = match cached {
            Some(Ok(record)) => record,
            Some(Err(error)) => {
                warn!(
                    event_name = "concierge.greeting.cache_undecodable",
                    session_id = %session_id,
                    error = %error,
                    "cached suggestions could not be decoded"
                );
                return close(intent_name, Message::plain_text(GENERIC_FAILURE_MESSAGE));
            }
            None => {
                warn!(
                    event_name = "concierge.greeting.cache_missing",
                    session_id = %session_id,
                    "confirmation received without cached suggestions"
                );
                return close(intent_name, Message::plain_text(GENERIC_FAILURE_MESSAGE));
            }
        };

        if let Err(error) =
            self.mailer.send_suggestions(&record.dining_details, &record.restaurants).await
        {
            error!(
                event_name = "concierge.greeting.resend_failed",
                session_id = %session_id,
                error = %error,
                "failed to email cached suggestions"
            );
        }

        close(intent_name, Message::plain_text(RESEND_CONFIRMED_MESSAGE))
    }

    async fn offer_previous(&self, intent_name: &str, event: LexEvent) -> LexResponse {
        let record = match self.history.find_for_user(&event.session_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return close(intent_name, Message::plain_text(GREETING_MESSAGE)),
            Err(error) => {
                warn!(
                    event_name = "concierge.greeting.history_failed",
                    session_id = %event.session_id,
                    error = %error,
                    "past suggestion lookup failed"
                );
                return close(intent_name, Message::plain_text(GREETING_MESSAGE));
            }
        };

        let cached = match serde_json::to_string(&record) {
            Ok(cached) => cached,
            Err(error) => {
                warn!(
                    event_name = "concierge.greeting.cache_encode_failed",
                    session_id = %event.session_id,
                    error = %error,
                    "past suggestions could not be cached in session"
                );
                return close(intent_name, Message::plain_text(GREETING_MESSAGE));
            }
        };

        let prompt = format!(
            "You previously requested suggestions for {cuisine} in {location}, \
             do you want it over the email now?",
            cuisine = record.dining_details.cuisine,
            location = record.dining_details.location,
        );

        let mut session_state = event.session_state;
        session_state.session_attributes.insert(RESTAURANTS_ATTRIBUTE.to_owned(), cached);
        confirm_intent(session_state, Message::plain_text(prompt))
    }
}

fn dining_slots(session_state: &SessionState) -> DiningSlots {
    session_state.intent.as_ref().map(DiningSlots::from_intent).unwrap_or_default()
}
