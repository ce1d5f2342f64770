pub mod core;
pub mod extract;
pub mod models;

pub use self::core::{Session, SessionBuilder, SessionState, TurnOutcome};
pub use extract::{ActionInvocation, ExtractError, Extraction, IntentExtractor};
pub use models::Transcript;
