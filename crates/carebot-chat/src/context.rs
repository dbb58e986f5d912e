//! Conversation memory.
//!
//! Holds per-session short-term memory and rewrites follow-up questions by
//! substituting anaphoric references with the last-known referent.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use chrono::{DateTime, Local, TimeZone};
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::types::{Entity, EntityKind, SessionSummary};

// =============================================================================
// SessionContext
// =============================================================================

/// Short-term memory for one conversation.
///
/// At most one of `doctor` / `doctors` is set; use [`set_doctor`] and
/// [`set_doctors`] to keep it that way.
///
/// [`set_doctor`]: SessionContext::set_doctor
/// [`set_doctors`]: SessionContext::set_doctors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub branch: Option<String>,
    pub doctor: Option<String>,
    pub doctors: Option<Vec<String>>,
    /// Lowercased.
    pub specialty: Option<String>,
    /// Lowercased weekday token.
    pub day: Option<String>,
}

impl SessionContext {
    pub fn is_empty(&self) -> bool {
        self.branch.is_none()
            && self.doctor.is_none()
            && self.doctors.is_none()
            && self.specialty.is_none()
            && self.day.is_none()
    }

    pub fn set_doctor(&mut self, name: impl Into<String>) {
        self.doctor = Some(name.into());
        self.doctors = None;
    }

    pub fn set_doctors(&mut self, names: Vec<String>) {
        self.doctors = Some(names);
        self.doctor = None;
    }

    /// Overwrite the field matching the entity's kind. Last write wins.
    pub fn apply_entity(&mut self, entity: &Entity) {
        let text = entity.source_text.clone();
        match entity.kind {
            EntityKind::Day => self.day = Some(text.to_lowercase()),
            EntityKind::Branch => self.branch = Some(text),
            EntityKind::Doctor => self.set_doctor(text),
            EntityKind::Specialty => self.specialty = Some(text.to_lowercase()),
        }
    }

    pub fn apply_entities(&mut self, entities: &[Entity]) {
        for entity in entities {
            self.apply_entity(entity);
        }
    }

    /// Remembered doctors, only when more than one.
    pub fn doctor_group(&self) -> Option<&[String]> {
        self.doctors.as_deref().filter(|names| names.len() > 1)
    }
}

// =============================================================================
// SessionStore
// =============================================================================

/// A live session: memory plus bookkeeping.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub context: SessionContext,
    pub created_at: i64,
    pub last_seen_at: i64,
    pub message_count: u64,
}

impl SessionState {
    fn new() -> Self {
        let now = Local::now().timestamp();
        Self {
            context: SessionContext::default(),
            created_at: now,
            last_seen_at: now,
            message_count: 0,
        }
    }

    /// Record one handled message.
    pub fn touch(&mut self) {
        self.last_seen_at = Local::now().timestamp();
        self.message_count += 1;
    }
}

/// Handle to one session. Locking it serializes requests for that session
/// only.
pub type SessionSlot = Arc<Mutex<SessionState>>;

/// Session identifier to memory mapping, alive for the whole process.
///
/// The map lock is held only to look up or insert a slot; each session has
/// its own mutex, so unrelated sessions never wait on each other.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionSlot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the slot for `session_id`, registering an empty one if needed.
    pub fn get_or_create(&self, session_id: &str) -> Result<SessionSlot, ChatError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::SessionLock(e.to_string()))?;
        let slot = sessions.entry(session_id.to_string()).or_insert_with(|| {
            tracing::debug!(session_id, "Session memory created");
            Arc::new(Mutex::new(SessionState::new()))
        });
        Ok(Arc::clone(slot))
    }

    /// Copy of a session's memory, if the session exists.
    pub fn context(&self, session_id: &str) -> Result<Option<SessionContext>, ChatError> {
        let slot = {
            let sessions = self
                .sessions
                .lock()
                .map_err(|e| ChatError::SessionLock(e.to_string()))?;
            match sessions.get(session_id) {
                Some(slot) => Arc::clone(slot),
                None => return Ok(None),
            }
        };
        let state = slot
            .lock()
            .map_err(|e| ChatError::SessionLock(e.to_string()))?;
        Ok(Some(state.context.clone()))
    }

    /// Write extracted entities into a session's memory.
    pub fn apply_entities(&self, session_id: &str, entities: &[Entity]) -> Result<(), ChatError> {
        let slot = self.get_or_create(session_id)?;
        let mut state = slot
            .lock()
            .map_err(|e| ChatError::SessionLock(e.to_string()))?;
        state.context.apply_entities(entities);
        Ok(())
    }

    /// Forget a session entirely. Returns whether it existed.
    pub fn reset(&self, session_id: &str) -> Result<bool, ChatError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::SessionLock(e.to_string()))?;
        Ok(sessions.remove(session_id).is_some())
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Summaries of all live sessions, ordered by identifier.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        // The map only ever gains or loses whole entries, so a poisoned
        // guard still describes every live session.
        let slots: Vec<(String, SessionSlot)> = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .collect();
        let mut summaries: Vec<SessionSummary> = slots
            .into_iter()
            .map(|(id, slot)| {
                let state = slot.lock().unwrap_or_else(PoisonError::into_inner);
                SessionSummary {
                    id,
                    created_at: format_epoch(state.created_at),
                    last_seen_at: format_epoch(state.last_seen_at),
                    message_count: state.message_count,
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }
}

/// Format epoch seconds as RFC 3339.
fn format_epoch(epoch: i64) -> String {
    Local
        .timestamp_opt(epoch, 0)
        .single()
        .map(|dt: DateTime<Local>| dt.to_rfc3339())
        .unwrap_or_else(|| epoch.to_string())
}

// =============================================================================
// PronounResolver
// =============================================================================

struct AnaphoraPatterns {
    branch: Regex,
    doctors: Regex,
    doctor: Regex,
    specialty: Regex,
    day: Regex,
}

static ANAPHORA: LazyLock<AnaphoraPatterns> = LazyLock::new(|| {
    let mk = |words: &str| -> Regex {
        Regex::new(&format!(r"(?i)\b(?:{})\b", words)).expect("Invalid anaphora regex")
    };

    AnaphoraPatterns {
        branch: mk("it|that branch|this branch|branch"),
        doctors: mk("they|them|those doctors|these doctors|doctors"),
        doctor: mk("him|her|that doctor|he|she|this doctor|doctor"),
        specialty: mk("that specialty|this specialty|specialist|specialty"),
        day: mk("that day|this day|day"),
    }
});

/// Rewrites anaphoric references using session memory.
///
/// Passes run in a fixed order (branch, doctor group, doctor, specialty,
/// day), each only when its memory field is set. Matching is whole-word and
/// case-insensitive.
#[derive(Debug, Default, Clone, Copy)]
pub struct PronounResolver;

impl PronounResolver {
    pub fn resolve(&self, text: &str, context: &SessionContext) -> String {
        let pats = &*ANAPHORA;
        let mut output = text.to_string();

        if let Some(ref branch) = context.branch {
            output = substitute(&pats.branch, &output, branch);
        }
        if let Some(names) = context.doctor_group() {
            output = substitute(&pats.doctors, &output, &names.join(", "));
        }
        if let Some(ref doctor) = context.doctor {
            output = substitute(&pats.doctor, &output, doctor);
        }
        if let Some(ref specialty) = context.specialty {
            output = substitute(&pats.specialty, &output, specialty);
        }
        if let Some(ref day) = context.day {
            output = substitute(&pats.day, &output, day);
        }

        if output != text {
            tracing::debug!(original = text, resolved = %output, "Resolved references");
        }
        output
    }
}

fn substitute(re: &Regex, text: &str, replacement: &str) -> String {
    re.replace_all(text, NoExpand(replacement)).into_owned()
}

// =============================================================================
// Tests
// =============================================================================
