//! Intent classification and entity extraction.
//!
//! [`IntentOracle`] is the boundary the core depends on. [`RuleOracle`] is a
//! rule-based implementation: a gazetteer of known branches, days,
//! practitioners and specialties, plus regex intent patterns matched against
//! the utterance with recognised entities replaced by `%kind%` placeholders.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use carebot_core::types::DAY_NAMES;
use regex::Regex;

use crate::catalog::BranchCatalog;
use crate::roster::{PractitionerCache, RosterSnapshot};
use crate::types::{Classification, EntityKind, Intent, RawEntity};

/// Classifies an utterance into an intent label and extracted entities.
pub trait IntentOracle: Send + Sync {
    fn classify(&self, text: &str) -> Classification;
}

// =============================================================================
// Intent patterns (compiled once, reused across calls)
// =============================================================================

struct IntentPatterns {
    emergency: Vec<Regex>,
    list_branches: Vec<Regex>,
    services: Vec<Regex>,
    list_doctors: Vec<Regex>,
    by_day: Vec<Regex>,
    by_specialty: Vec<Regex>,
    availability: Vec<Regex>,
    location: Vec<Regex>,
}

static INTENT_PATTERNS: LazyLock<IntentPatterns> = LazyLock::new(|| {
    let mk = |pats: &[&str]| -> Vec<Regex> {
        pats.iter()
            .map(|p| Regex::new(p).expect("Invalid intent regex"))
            .collect()
    };

    IntentPatterns {
        emergency: mk(&[
            r"(?i)\bemergency\s+(?:number|numbers|contact|contacts|line|phone)\b",
            r"(?i)\bcontact\b.*\bemergency\b",
            r"(?i)\bcall\b.*\bemergency\b",
        ]),
        list_branches: mk(&[
            r"(?i)\b(?:which|what)\s+branches\b",
            r"(?i)\b(?:list|show)\s+(?:me\s+)?(?:all\s+|the\s+|your\s+)?branches\b",
            r"(?i)\bhow\s+many\s+branches\b",
        ]),
        services: mk(&[r"(?i)\b(?:services|departments)\b"]),
        list_doctors: mk(&[
            r"(?i)\blist\s+(?:all\s+|the\s+)?doctors\b",
            r"(?i)\blist\s+(?:all\s+|the\s+)?%doctor%(?:\s*,\s*%doctor%)*",
            r"(?i)\ball\s+(?:the\s+|your\s+)?doctors\b",
            r"(?i)\ball\s+(?:the\s+|your\s+)?%doctor%(?:\s*,\s*%doctor%)*",
        ]),
        by_day: mk(&[
            r"(?i)\bworking\s+on\b",
            r"(?i)\b(?:which|what)\s+doctors?\s+(?:are\s+|is\s+)?available\s+on\b",
            r"(?i)\bavailable\s+on\s+%day%",
            r"(?i)\bdoctors?\s+on\s+%day%",
        ]),
        by_specialty: mk(&[
            r"(?i)\bshow\s+(?:me\s+)?doctors\s+(?:for|in)\b",
            r"(?i)\bshow\s+(?:me\s+)?%doctor%(?:\s*,\s*%doctor%)*\s+(?:for|in)\s+%specialty%",
            r"(?i)\bwho\s+is\s+the\s+%specialty%",
            r"(?i)\bi\s+want\s+to\s+see\s+(?:a|an)\b",
            r"(?i)\bdoctors?\s+(?:for|in)\s+%specialty%",
            r"(?i)%doctor%(?:\s*,\s*%doctor%)+\s+(?:for|in)\s+%specialty%",
            r"(?i)%specialty%\s+(?:doctors?|specialists?)\b",
        ]),
        availability: mk(&[
            r"(?i)\bwhen\s+is\b.*\bavailable\b",
            r"(?i)\bavailability\b",
            r"(?i)\bwhat\s+(?:days?|%day%)\s+can\s+i\s+(?:visit|see)\b",
            r"(?i)\bschedule\s+(?:of|for)\b",
        ]),
        location: mk(&[
            r"(?i)\bwhere\s+is\b",
            r"(?i)\blocation\s+of\b",
            r"(?i)\bhow\s+(?:can|do)\s+i\s+find\b",
            r"(?i)\baddress\s+of\b",
            r"(?i)%branch%\s+location\b",
            r"(?i)\bbranch\s+location\b",
            r"(?i)\blocated\b",
        ]),
    }
});

fn any_match(pats: &[Regex], text: &str) -> bool {
    pats.iter().any(|re| re.is_match(text))
}

// =============================================================================
// Gazetteer
// =============================================================================

struct GazetteerEntry {
    kind: EntityKind,
    pattern: Regex,
    len: usize,
}

/// Known entity surface forms for one roster generation.
struct Gazetteer {
    generation: u64,
    /// Longest entries first.
    entries: Vec<GazetteerEntry>,
}

impl Gazetteer {
    fn build(catalog: &BranchCatalog, roster: &RosterSnapshot) -> Self {
        let mut seen: HashSet<(EntityKind, String)> = HashSet::new();
        let mut entries = Vec::new();
        let mut add = |kind: EntityKind, surface: &str| {
            let surface = surface.trim();
            if surface.is_empty() || !seen.insert((kind, surface.to_lowercase())) {
                return;
            }
            match surface_pattern(surface) {
                Ok(pattern) => entries.push(GazetteerEntry {
                    kind,
                    pattern,
                    len: surface.chars().count(),
                }),
                Err(e) => tracing::warn!(surface, error = %e, "Skipping gazetteer entry"),
            }
        };

        for branch in catalog.branches() {
            add(EntityKind::Branch, &branch.name);
        }
        for day in DAY_NAMES {
            add(EntityKind::Day, day);
        }
        for record in &roster.records {
            add(EntityKind::Doctor, record.stripped_name());
        }
        for record in &roster.records {
            if let Some(ref spec) = record.specialty {
                add(EntityKind::Specialty, &spec.to_lowercase());
            }
            add(EntityKind::Specialty, &record.department.to_lowercase());
        }

        entries.sort_by(|a, b| b.len.cmp(&a.len));
        tracing::debug!(
            generation = roster.generation,
            entries = entries.len(),
            "Gazetteer rebuilt"
        );
        Self {
            generation: roster.generation,
            entries,
        }
    }

    /// Non-overlapping matches as `(start, end, kind)`, in text order.
    fn scan(&self, text: &str) -> Vec<(usize, usize, EntityKind)> {
        let mut spans: Vec<(usize, usize, EntityKind)> = Vec::new();
        for entry in &self.entries {
            for m in entry.pattern.find_iter(text) {
                let overlaps = spans
                    .iter()
                    .any(|(s, e, _)| m.start() < *e && *s < m.end());
                if !overlaps {
                    spans.push((m.start(), m.end(), entry.kind));
                }
            }
        }
        spans.sort_by_key(|(start, _, _)| *start);
        spans
    }
}

/// Case-insensitive pattern for a surface form, anchored on word boundaries
/// where the surface itself starts or ends with a word character.
fn surface_pattern(surface: &str) -> Result<Regex, regex::Error> {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if surface.chars().next().is_some_and(is_word) { r"\b" } else { "" };
    let trail = if surface.chars().last().is_some_and(is_word) { r"\b" } else { "" };
    Regex::new(&format!("(?i){}{}{}", lead, regex::escape(surface), trail))
}

// =============================================================================
// RuleOracle
// =============================================================================

/// Rule-based [`IntentOracle`] over the branch catalog and practitioner roster.
///
/// The gazetteer is rebuilt lazily whenever the roster generation changes.
/// Rebuilds happen outside the lock; classifications only ever take it
/// briefly.
pub struct RuleOracle {
    catalog: Arc<BranchCatalog>,
    roster: Arc<PractitionerCache>,
    gazetteer: RwLock<Option<Arc<Gazetteer>>>,
}

impl RuleOracle {
    pub fn new(catalog: Arc<BranchCatalog>, roster: Arc<PractitionerCache>) -> Self {
        Self {
            catalog,
            roster,
            gazetteer: RwLock::new(None),
        }
    }

    fn gazetteer(&self) -> Arc<Gazetteer> {
        let snapshot = self.roster.snapshot();
        {
            let cached = self.gazetteer.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(g) = cached
                .as_ref()
                .filter(|g| g.generation == snapshot.generation)
            {
                return Arc::clone(g);
            }
        }

        let fresh = Arc::new(Gazetteer::build(&self.catalog, &snapshot));
        let mut cached = self.gazetteer.write().unwrap_or_else(PoisonError::into_inner);
        // A concurrent rebuild may already have stored a newer generation.
        if cached
            .as_ref()
            .map_or(true, |g| g.generation < fresh.generation)
        {
            *cached = Some(Arc::clone(&fresh));
        }
        fresh
    }

    /// Pick the intent for a templated utterance.
    fn match_intent(&self, text: &str, templated: &str, entities: &[RawEntity]) -> Option<Intent> {
        let pats = &*INTENT_PATTERNS;

        if any_match(&pats.emergency, templated) {
            return Some(Intent::EmergencyContact);
        }
        if any_match(&pats.list_branches, templated) {
            return Some(Intent::ListBranches);
        }
        if any_match(&pats.services, templated) {
            if let Some(slug) = self.services_slug(text, entities) {
                return Some(Intent::Services(slug));
            }
        }
        if any_match(&pats.list_doctors, templated) {
            return Some(Intent::ListDoctors);
        }
        if any_match(&pats.by_day, templated) {
            return Some(Intent::DoctorByDay);
        }
        if any_match(&pats.by_specialty, templated) {
            return Some(Intent::DoctorBySpecialty);
        }
        if any_match(&pats.availability, templated) {
            return Some(Intent::DoctorAvailability);
        }
        if any_match(&pats.location, templated) {
            return Some(Intent::BranchLocation);
        }
        None
    }

    /// Branch slug from a branch entity, else from a bare slug word ("rwanda").
    fn services_slug(&self, text: &str, entities: &[RawEntity]) -> Option<String> {
        let from_entity = entities
            .iter()
            .filter(|e| e.kind == EntityKind::Branch.as_str())
            .find_map(|e| self.catalog.normalize(&e.source_text))
            .map(|b| b.slug());
        if from_entity.is_some() {
            return from_entity;
        }

        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();
        self.catalog
            .branches()
            .iter()
            .map(|b| b.slug())
            .find(|slug| words.contains(slug))
    }
}

impl IntentOracle for RuleOracle {
    fn classify(&self, text: &str) -> Classification {
        let gazetteer = self.gazetteer();
        let spans = gazetteer.scan(text);

        let mut entities = Vec::with_capacity(spans.len());
        let mut templated = String::with_capacity(text.len());
        let mut cursor = 0;
        for (start, end, kind) in &spans {
            entities.push(RawEntity {
                kind: kind.as_str().to_string(),
                source_text: text[*start..*end].to_string(),
            });
            templated.push_str(&text[cursor..*start]);
            templated.push('%');
            templated.push_str(kind.as_str());
            templated.push('%');
            cursor = *end;
        }
        templated.push_str(&text[cursor..]);

        let intent = self.match_intent(text, &templated, &entities);
        tracing::debug!(
            text,
            templated = %templated,
            intent = ?intent,
            entities = entities.len(),
            "Utterance classified"
        );

        Classification {
            intent: intent.map(|i| i.label()),
            entities,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
