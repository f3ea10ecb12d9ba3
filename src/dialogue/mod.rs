//! Multi-turn dialogue: per-user session, compose flow, inbox navigation and
//! the orchestrator that ties them to the classifier.

pub mod compose;
pub mod inbox;
pub mod orchestrator;
pub mod session;
pub mod types;

pub use compose::ComposeFlow;
pub use inbox::InboxNavigator;
pub use orchestrator::{Orchestrator, RECOGNIZER_UNAVAILABLE};
pub use session::{ComposeState, ComposeStep, DialogueSession, ReadCursor, SessionStore};
pub use types::TurnResult;
