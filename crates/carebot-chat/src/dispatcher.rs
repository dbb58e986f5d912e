//! Intent dispatch: turns an intent, its entities and session memory into an
//! answer, updating memory along the way.

use std::sync::Arc;

use carebot_core::types::{day_name, day_title, parse_day, WEEK};

use crate::catalog::BranchCatalog;
use crate::context::SessionContext;
use crate::roster::PractitionerCache;
use crate::types::{Answer, Entity, EntityKind, Intent};

pub const FALLBACK: &str = "Sorry, I didn't understand. Can you rephrase?";
pub const ASK_BRANCH: &str = "Please specify a branch name.";
pub const ASK_DOCTOR: &str = "Please provide a doctor's name.";
pub const ASK_DAY: &str = "Please specify a valid day.";
pub const ASK_SPECIALTY: &str = "Please specify a specialty.";

/// First entity of `kind`, in extraction order.
fn entity_text(entities: &[Entity], kind: EntityKind) -> Option<&str> {
    entities
        .iter()
        .find(|e| e.kind == kind)
        .map(|e| e.source_text.as_str())
}

/// True when every doctor entity names a member of `group`, as happens once
/// a group reference has been expanded into the members' names.
fn names_only_group_members(entities: &[Entity], group: &[String]) -> bool {
    let mut doctors = entities
        .iter()
        .filter(|e| e.kind == EntityKind::Doctor)
        .peekable();
    doctors.peek().is_some()
        && doctors.all(|e| {
            group
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&e.source_text))
        })
}

/// Routes classified requests to their handlers.
pub struct IntentDispatcher {
    catalog: Arc<BranchCatalog>,
    roster: Arc<PractitionerCache>,
}

impl IntentDispatcher {
    pub fn new(catalog: Arc<BranchCatalog>, roster: Arc<PractitionerCache>) -> Self {
        Self { catalog, roster }
    }

    /// Run one full cycle: apply entities to memory, handle the intent,
    /// produce the answer.
    ///
    /// A slot value rejected during normalization is rolled back to what
    /// memory held before this request.
    pub fn dispatch(
        &self,
        intent: Option<&Intent>,
        entities: &[Entity],
        context: &mut SessionContext,
    ) -> Answer {
        let prior = context.clone();
        context.apply_entities(entities);
        if let Some(group) = prior.doctor_group() {
            if names_only_group_members(entities, group) {
                context.set_doctors(group.to_vec());
            }
        }

        let Some(intent) = intent else {
            return Answer::text(FALLBACK);
        };

        match intent {
            Intent::BranchLocation => self.branch_location(entities, context, &prior),
            Intent::ListBranches => Answer::Lines(self.catalog.branch_names()),
            Intent::Services(slug) => match self.catalog.by_slug(slug) {
                Some(branch) => Answer::Lines(branch.departments.clone()),
                None => Answer::text(FALLBACK),
            },
            Intent::EmergencyContact => Answer::Text(self.catalog.emergency_line()),
            Intent::ListDoctors => Answer::Lines(self.roster.snapshot().names()),
            Intent::DoctorAvailability => self.doctor_availability(entities, context, &prior),
            Intent::DoctorByDay => self.doctor_by_day(entities, context, &prior),
            Intent::DoctorBySpecialty => self.doctor_by_specialty(entities, context),
        }
    }

    fn branch_location(
        &self,
        entities: &[Entity],
        context: &mut SessionContext,
        prior: &SessionContext,
    ) -> Answer {
        let requested = entity_text(entities, EntityKind::Branch)
            .map(str::to_string)
            .or_else(|| context.branch.clone());
        let Some(requested) = requested else {
            return Answer::text(ASK_BRANCH);
        };

        match self.catalog.normalize(&requested) {
            Some(branch) => {
                context.branch = Some(branch.name.clone());
                Answer::Text(format!(
                    "Our {} is located {}.",
                    branch.name, branch.location
                ))
            }
            None => {
                context.branch = prior.branch.clone();
                Answer::Text(format!(
                    "Sorry, I don't have the location for \"{}\".",
                    requested
                ))
            }
        }
    }

    /// A remembered group outranks any single name from the group itself.
    /// Group members arrive here as doctor entities once references are
    /// resolved, so the group is read from memory as it stood before this
    /// request and kept afterwards. A doctor from outside the group replaces it.
    fn doctor_availability(
        &self,
        entities: &[Entity],
        context: &mut SessionContext,
        prior: &SessionContext,
    ) -> Answer {
        let group = prior.doctor_group().filter(|group| {
            entity_text(entities, EntityKind::Doctor).is_none()
                || names_only_group_members(entities, group)
        });
        let names: Vec<String> = if let Some(group) = group {
            context.set_doctors(group.to_vec());
            group.to_vec()
        } else if let Some(name) = entity_text(entities, EntityKind::Doctor) {
            vec![name.to_string()]
        } else if let Some(ref name) = context.doctor {
            vec![name.clone()]
        } else {
            vec![]
        };
        if names.is_empty() {
            return Answer::text(ASK_DOCTOR);
        }

        let roster = self.roster.snapshot();
        let mut lines = Vec::new();
        for name in &names {
            let Some(record) = roster.find_by_name(name) else {
                lines.push(format!("Doctor \"{}\" not found.", name));
                continue;
            };
            lines.push(format!("{} is available on:", record.name));
            for day in WEEK {
                let slot = record.day(day);
                if slot.available {
                    lines.push(format!("{}: {} - {}", day_title(day), slot.start, slot.end));
                }
            }
            lines.push(String::new());
        }
        Answer::Lines(lines)
    }

    fn doctor_by_day(
        &self,
        entities: &[Entity],
        context: &mut SessionContext,
        prior: &SessionContext,
    ) -> Answer {
        let token = entity_text(entities, EntityKind::Day)
            .map(str::to_lowercase)
            .or_else(|| context.day.clone());
        let Some(day) = token.as_deref().and_then(parse_day) else {
            context.day = prior.day.clone();
            return Answer::text(ASK_DAY);
        };
        context.day = Some(day_name(day).to_string());

        let available: Vec<String> = self
            .roster
            .snapshot()
            .available_on(day)
            .into_iter()
            .map(|r| r.label())
            .collect();
        if available.is_empty() {
            return Answer::Text(format!("No doctors available on {}.", day_title(day)));
        }
        Answer::Lines(available)
    }

    fn doctor_by_specialty(&self, entities: &[Entity], context: &mut SessionContext) -> Answer {
        let specialty = entity_text(entities, EntityKind::Specialty)
            .map(str::to_lowercase)
            .or_else(|| context.specialty.clone());
        let Some(specialty) = specialty else {
            return Answer::text(ASK_SPECIALTY);
        };

        let roster = self.roster.snapshot();
        let matches = roster.by_specialty(&specialty);
        if matches.is_empty() {
            return Answer::Text(format!("No doctors found for specialty: {}", specialty));
        }

        if let [only] = matches.as_slice() {
            context.set_doctor(only.stripped_name());
        } else {
            context.set_doctors(
                matches
                    .iter()
                    .map(|r| r.stripped_name().to_string())
                    .collect(),
            );
        }
        tracing::debug!(specialty = %specialty, matches = matches.len(), "Specialty resolved");

        Answer::Lines(matches.iter().map(|r| r.label()).collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
