pub mod concierge;
pub mod config;
pub mod dialog;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use concierge::{IntentDispatcher, IntentKind};
pub use dialog::{LexEvent, LexResponse, SlotValidator, ValidationResult};
pub use domain::dining::{DiningRequest, ReservationType};
pub use domain::restaurant::{BusinessId, Restaurant, SuggestionRecord};
pub use domain::slots::{DiningSlots, SlotName};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use ports::{
    Clock, FixedClock, QueueConsumer, QueuedMessage, RestaurantCatalog, RestaurantSearch,
    SuggestionHistory, SuggestionMailer, SuggestionQueue, SystemClock,
};
pub use worker::{BatchReport, SuggestionWorker, WorkerSettings};
