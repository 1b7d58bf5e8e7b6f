pub mod dispatcher;
pub mod intents;

pub use dispatcher::IntentDispatcher;
pub use intents::IntentKind;
