//! In-memory practitioner cache.
//!
//! The roster is replaced wholesale by an external refresh. Readers hold an
//! `Arc` to an immutable snapshot, so a refresh never exposes a half-built
//! roster to an in-flight request.

use std::sync::{Arc, PoisonError, RwLock};

use carebot_core::types::PractitionerRecord;
use chrono::Weekday;

// =============================================================================
// RosterSnapshot
// =============================================================================

/// An immutable roster generation.
#[derive(Debug, Default)]
pub struct RosterSnapshot {
    /// Incremented on every replacement; 0 is the empty startup roster.
    pub generation: u64,
    pub records: Vec<PractitionerRecord>,
}

impl RosterSnapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Display names in roster order.
    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }

    /// First record whose display name contains `fragment`, case-insensitively.
    pub fn find_by_name(&self, fragment: &str) -> Option<&PractitionerRecord> {
        let needle = fragment.to_lowercase();
        self.records
            .iter()
            .find(|r| r.name.to_lowercase().contains(&needle))
    }

    pub fn available_on(&self, day: Weekday) -> Vec<&PractitionerRecord> {
        self.records
            .iter()
            .filter(|r| r.is_available_on(day))
            .collect()
    }

    /// Records whose specialty title or department contains `fragment`,
    /// case-insensitively.
    pub fn by_specialty(&self, fragment: &str) -> Vec<&PractitionerRecord> {
        let needle = fragment.to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                let spec = r.specialty.as_deref().unwrap_or_default().to_lowercase();
                let dept = r.department.to_lowercase();
                spec.contains(&needle) || dept.contains(&needle)
            })
            .collect()
    }
}

// =============================================================================
// PractitionerCache
// =============================================================================

/// Shared, atomically swapped practitioner roster.
#[derive(Debug, Default)]
pub struct PractitionerCache {
    current: RwLock<Arc<RosterSnapshot>>,
}

impl PractitionerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache already holding `records` as generation 1.
    pub fn with_records(records: Vec<PractitionerRecord>) -> Self {
        let cache = Self::new();
        cache.replace(records);
        cache
    }

    /// Current snapshot. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<RosterSnapshot> {
        // The guarded value is only ever swapped whole, so a poisoned lock
        // still holds a consistent snapshot.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Swap in a new roster and return its generation.
    pub fn replace(&self, records: Vec<PractitionerRecord>) -> u64 {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let generation = guard.generation + 1;
        let count = records.len();
        *guard = Arc::new(RosterSnapshot {
            generation,
            records,
        });
        tracing::info!(generation, practitioners = count, "Practitioner roster replaced");
        generation
    }

    pub fn generation(&self) -> u64 {
        self.snapshot().generation
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
