//! Request/response types shared across the conversational core.

use serde::{Deserialize, Serialize};

// =============================================================================
// Entities
// =============================================================================

/// Kinds of entity the core consumes from the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Day,
    Branch,
    Doctor,
    Specialty,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Day,
        EntityKind::Branch,
        EntityKind::Doctor,
        EntityKind::Specialty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Day => "day",
            EntityKind::Branch => "branch",
            EntityKind::Doctor => "doctor",
            EntityKind::Specialty => "specialty",
        }
    }

    /// Map an oracle entity label to a kind. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == label)
    }
}

/// A typed entity extracted from an utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    /// Literal text of the utterance that matched.
    pub source_text: String,
}

impl Entity {
    pub fn new(kind: EntityKind, source_text: impl Into<String>) -> Self {
        Self {
            kind,
            source_text: source_text.into(),
        }
    }
}

/// An entity as reported by the oracle, before kind validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntity {
    pub kind: String,
    pub source_text: String,
}

/// Oracle output: an optional intent label plus extracted entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Option<String>,
    pub entities: Vec<RawEntity>,
}

impl Classification {
    /// Typed entities, in extraction order. Unknown kinds are dropped with a warning.
    pub fn typed_entities(&self) -> Vec<Entity> {
        self.entities
            .iter()
            .filter_map(|raw| match EntityKind::from_label(&raw.kind) {
                Some(kind) => Some(Entity::new(kind, raw.source_text.clone())),
                None => {
                    tracing::warn!(kind = %raw.kind, "Ignoring entity of unknown kind");
                    None
                }
            })
            .collect()
    }

    /// The parsed intent, if the label is one the dispatcher handles.
    pub fn parsed_intent(&self) -> Option<Intent> {
        self.intent.as_deref().and_then(Intent::from_label)
    }
}

// =============================================================================
// Intents
// =============================================================================

/// Intents the dispatcher knows how to answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Intent {
    BranchLocation,
    ListBranches,
    /// Department listing for the branch with the given slug.
    Services(String),
    EmergencyContact,
    ListDoctors,
    DoctorAvailability,
    DoctorByDay,
    DoctorBySpecialty,
}

impl Intent {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "branch.location" => Some(Intent::BranchLocation),
            "list.branches" => Some(Intent::ListBranches),
            "emergency.contact" => Some(Intent::EmergencyContact),
            "list.doctors" => Some(Intent::ListDoctors),
            "doctor.availability" => Some(Intent::DoctorAvailability),
            "doctor.by_day" => Some(Intent::DoctorByDay),
            "doctor.by_specialty" => Some(Intent::DoctorBySpecialty),
            other => other
                .strip_prefix("services.")
                .filter(|slug| !slug.is_empty())
                .map(|slug| Intent::Services(slug.to_string())),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Intent::BranchLocation => "branch.location".to_string(),
            Intent::ListBranches => "list.branches".to_string(),
            Intent::Services(slug) => format!("services.{}", slug),
            Intent::EmergencyContact => "emergency.contact".to_string(),
            Intent::ListDoctors => "list.doctors".to_string(),
            Intent::DoctorAvailability => "doctor.availability".to_string(),
            Intent::DoctorByDay => "doctor.by_day".to_string(),
            Intent::DoctorBySpecialty => "doctor.by_specialty".to_string(),
        }
    }
}

// =============================================================================
// Answers
// =============================================================================

/// Answer payload: a single sentence or an ordered list of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Lines(Vec<String>),
}

impl Answer {
    pub fn text(s: impl Into<String>) -> Self {
        Answer::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(s) => Some(s),
            Answer::Lines(_) => None,
        }
    }

    pub fn as_lines(&self) -> Option<&[String]> {
        match self {
            Answer::Text(_) => None,
            Answer::Lines(lines) => Some(lines),
        }
    }
}

/// JSON body returned to callers: `{"answer": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEnvelope {
    pub answer: Answer,
}

impl From<Answer> for AnswerEnvelope {
    fn from(answer: Answer) -> Self {
        Self { answer }
    }
}

/// Result of a session reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetOutcome {
    pub success: bool,
}

/// Bookkeeping view of one live session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: String,
    pub last_seen_at: String,
    pub message_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_labels() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_label(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::from_label("hospital"), None);
        assert_eq!(EntityKind::from_label("Day"), None);
    }

    #[test]
    fn test_intent_labels() {
        assert_eq!(Intent::from_label("doctor.by_day"), Some(Intent::DoctorByDay));
        assert_eq!(
            Intent::from_label("services.rwanda"),
            Some(Intent::Services("rwanda".to_string()))
        );
        assert_eq!(Intent::from_label("services."), None);
        assert_eq!(Intent::from_label("None"), None);
        assert_eq!(Intent::from_label(""), None);
        assert_eq!(Intent::Services("bulbula".into()).label(), "services.bulbula");
    }

    #[test]
    fn test_typed_entities_drop_unknown_kinds() {
        let classification = Classification {
            intent: None,
            entities: vec![
                RawEntity {
                    kind: "day".into(),
                    source_text: "Monday".into(),
                },
                RawEntity {
                    kind: "insurance".into(),
                    source_text: "gold plan".into(),
                },
            ],
        };
        let typed = classification.typed_entities();
        assert_eq!(typed, vec![Entity::new(EntityKind::Day, "Monday")]);
    }

    #[test]
    fn test_answer_serializes_untagged() {
        let text = AnswerEnvelope::from(Answer::text("hi"));
        assert_eq!(serde_json::to_string(&text).unwrap(), r#"{"answer":"hi"}"#);

        let lines = AnswerEnvelope::from(Answer::Lines(vec!["a".into(), "".into()]));
        assert_eq!(
            serde_json::to_string(&lines).unwrap(),
            r#"{"answer":["a",""]}"#
        );
    }

    #[test]
    fn test_reset_outcome_json() {
        let out = ResetOutcome { success: true };
        assert_eq!(serde_json::to_string(&out).unwrap(), r#"{"success":true}"#);
    }
}
