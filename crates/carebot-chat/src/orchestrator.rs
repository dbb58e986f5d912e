//! Chat orchestrator: central coordinator wiring spelling correction, memory,
//! classification and dispatch.

use std::path::Path;
use std::sync::Arc;

use carebot_core::config::ChatConfig;
use carebot_core::types::{load_roster, PractitionerRecord};

use crate::catalog::BranchCatalog;
use crate::context::{PronounResolver, SessionContext, SessionStore};
use crate::dispatcher::IntentDispatcher;
use crate::error::ChatError;
use crate::parser::{IntentOracle, RuleOracle};
use crate::roster::PractitionerCache;
use crate::spelling::{DictionarySpellchecker, Spellchecker};
use crate::types::{Answer, ResetOutcome, SessionSummary};

/// Per-request pipeline over shared, process-wide state.
pub struct ChatOrchestrator {
    config: ChatConfig,
    catalog: Arc<BranchCatalog>,
    roster: Arc<PractitionerCache>,
    sessions: SessionStore,
    resolver: PronounResolver,
    oracle: Arc<dyn IntentOracle>,
    spellchecker: Arc<dyn Spellchecker>,
    dispatcher: IntentDispatcher,
}

impl ChatOrchestrator {
    /// Create an orchestrator using the rule-based oracle and the default
    /// dictionary spellchecker.
    pub fn new(
        config: ChatConfig,
        catalog: Arc<BranchCatalog>,
        roster: Arc<PractitionerCache>,
    ) -> Self {
        let oracle = Arc::new(RuleOracle::new(Arc::clone(&catalog), Arc::clone(&roster)));
        let spellchecker = Arc::new(
            DictionarySpellchecker::default().with_max_distance(config.spelling_max_distance),
        );
        let dispatcher = IntentDispatcher::new(Arc::clone(&catalog), Arc::clone(&roster));

        Self {
            config,
            catalog,
            roster,
            sessions: SessionStore::new(),
            resolver: PronounResolver,
            oracle,
            spellchecker,
            dispatcher,
        }
    }

    /// Replace the classification engine.
    pub fn with_oracle(mut self, oracle: Arc<dyn IntentOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    /// Replace the spelling corrector.
    pub fn with_spellchecker(mut self, spellchecker: Arc<dyn Spellchecker>) -> Self {
        self.spellchecker = spellchecker;
        self
    }

    /// Answer one question for `session_id`.
    ///
    /// Only a disabled chat, a blank question or an over-long question are
    /// rejected; every other outcome is an answer.
    pub fn handle_question(&self, session_id: &str, question: &str) -> Result<Answer, ChatError> {
        if !self.config.enabled {
            return Err(ChatError::Disabled);
        }
        if question.trim().is_empty() {
            return Err(ChatError::EmptyQuestion);
        }
        if question.chars().count() > self.config.max_question_length {
            return Err(ChatError::QuestionTooLong(self.config.max_question_length));
        }

        let corrected = self.spellchecker.correct_text(question);

        // Held for the whole cycle so requests on one session never interleave.
        let slot = self.sessions.get_or_create(session_id)?;
        let mut state = slot
            .lock()
            .map_err(|e| ChatError::SessionLock(e.to_string()))?;

        let resolved = self.resolver.resolve(&corrected, &state.context);
        let classification = self.oracle.classify(&resolved);
        let intent = classification.parsed_intent();
        let entities = classification.typed_entities();

        tracing::debug!(
            session_id,
            question,
            resolved = %resolved,
            intent = ?intent,
            entities = entities.len(),
            "Dispatching question"
        );

        let answer = self
            .dispatcher
            .dispatch(intent.as_ref(), &entities, &mut state.context);
        state.touch();
        Ok(answer)
    }

    /// Forget everything remembered for `session_id`.
    pub fn reset(&self, session_id: &str) -> Result<ResetOutcome, ChatError> {
        let existed = self.sessions.reset(session_id)?;
        tracing::info!(session_id, existed, "Session reset");
        Ok(ResetOutcome { success: true })
    }

    /// Copy of a session's memory, if the session exists.
    pub fn session_snapshot(&self, session_id: &str) -> Option<SessionContext> {
        self.sessions.context(session_id).ok().flatten()
    }

    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        self.sessions.list_sessions()
    }

    /// Swap in a freshly fetched roster. Returns the new generation.
    pub fn refresh_roster(&self, records: Vec<PractitionerRecord>) -> u64 {
        self.roster.replace(records)
    }

    /// Load a roster file and swap it in. On failure the current roster stays.
    pub fn reload_roster(&self, path: &Path) -> Result<u64, ChatError> {
        let records = load_roster(path)?;
        Ok(self.refresh_roster(records))
    }

    pub fn roster(&self) -> &Arc<PractitionerCache> {
        &self.roster
    }

    pub fn catalog(&self) -> &Arc<BranchCatalog> {
        &self.catalog
    }
}

// =============================================================================
// Tests
// =============================================================================
