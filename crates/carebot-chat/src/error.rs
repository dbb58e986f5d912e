//! Error types for the conversational core.

use carebot_core::error::CarebotError;

/// Request-level failures. Everything else is answered in-band.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat is disabled")]
    Disabled,
    #[error("no question provided")]
    EmptyQuestion,
    #[error("question exceeds maximum length of {0} characters")]
    QuestionTooLong(usize),
    #[error("session lock poisoned: {0}")]
    SessionLock(String),
    #[error("roster error: {0}")]
    Roster(String),
}

impl From<CarebotError> for ChatError {
    fn from(err: CarebotError) -> Self {
        ChatError::Roster(err.to_string())
    }
}
