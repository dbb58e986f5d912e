//! Conversational front-end for hospital branch, staff and schedule questions.
//!
//! Corrects spelling, resolves follow-up references from per-session memory,
//! classifies the question and dispatches it to a handler that answers from
//! the branch catalog and the practitioner roster.

pub mod catalog;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod parser;
pub mod roster;
pub mod spelling;
pub mod types;

pub use catalog::{Branch, BranchCatalog};
pub use context::{PronounResolver, SessionContext, SessionStore};
pub use dispatcher::IntentDispatcher;
pub use error::ChatError;
pub use orchestrator::ChatOrchestrator;
pub use parser::{IntentOracle, RuleOracle};
pub use roster::{PractitionerCache, RosterSnapshot};
pub use spelling::{DictionarySpellchecker, Spellchecker};
pub use types::{
    Answer, AnswerEnvelope, Classification, Entity, EntityKind, Intent, RawEntity, ResetOutcome,
    SessionSummary,
};
