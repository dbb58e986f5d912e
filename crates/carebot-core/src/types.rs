//! Shared domain types: weekdays, practitioner records and the roster wire format.

use std::path::Path;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CarebotError, Result};

// =============================================================================
// Weekdays
// =============================================================================

/// The seven weekdays in roster order.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Lowercase day tokens accepted from users, in roster order.
pub const DAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Parse a full, case-insensitive weekday name.
///
/// Abbreviations such as "mon" are rejected.
pub fn parse_day(token: &str) -> Option<Weekday> {
    let lower = token.trim().to_lowercase();
    DAY_NAMES
        .iter()
        .position(|name| *name == lower)
        .map(|idx| WEEK[idx])
}

/// Lowercase token for a weekday.
pub fn day_name(day: Weekday) -> &'static str {
    DAY_NAMES[day.num_days_from_monday() as usize]
}

/// Capitalized display form of a weekday, e.g. "Monday".
pub fn day_title(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// =============================================================================
// PractitionerRecord
// =============================================================================

/// Availability of a practitioner on a single weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub available: bool,
    /// Start time, verbatim from the source.
    pub start: String,
    /// End time, verbatim from the source.
    pub end: String,
}

impl DaySchedule {
    pub fn available(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            available: true,
            start: start.into(),
            end: end.into(),
        }
    }
}

/// A practitioner as published by the roster source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PractitionerRecord {
    /// Display name, possibly with a parenthetical qualifier suffix.
    pub name: String,
    pub department: String,
    pub specialty: Option<String>,
    /// One entry per weekday, Monday first.
    pub schedule: [DaySchedule; 7],
}

impl PractitionerRecord {
    /// Create a record with no availability on any day.
    pub fn new(
        name: impl Into<String>,
        department: impl Into<String>,
        specialty: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            department: department.into(),
            specialty: specialty.map(str::to_string),
            schedule: Default::default(),
        }
    }

    /// Builder-style helper marking a day as available.
    pub fn with_day(mut self, day: Weekday, start: &str, end: &str) -> Self {
        self.schedule[day.num_days_from_monday() as usize] = DaySchedule::available(start, end);
        self
    }

    /// Display name without any `" (...)"` qualifier suffix.
    pub fn stripped_name(&self) -> &str {
        strip_qualifier(&self.name)
    }

    pub fn day(&self, day: Weekday) -> &DaySchedule {
        &self.schedule[day.num_days_from_monday() as usize]
    }

    pub fn is_available_on(&self, day: Weekday) -> bool {
        self.day(day).available
    }

    /// `"Name (Department)"` listing label.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.department)
    }
}

/// Text preceding the first literal `" ("` marker, or the whole name.
pub fn strip_qualifier(name: &str) -> &str {
    match name.find(" (") {
        Some(idx) => &name[..idx],
        None => name,
    }
}

// =============================================================================
// Roster wire format
// =============================================================================

/// Availability flag as published: `"1"`, `1` or `true` mean available.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireFlag {
    Text(String),
    Number(i64),
    Bool(bool),
}

impl WireFlag {
    fn is_set(&self) -> bool {
        match self {
            WireFlag::Text(s) => s.trim() == "1",
            WireFlag::Number(n) => *n == 1,
            WireFlag::Bool(b) => *b,
        }
    }
}

/// One roster entry exactly as the appointment service serves it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePractitioner {
    #[serde(default)]
    doctor_name: Option<String>,
    #[serde(default)]
    doctor_department: Option<String>,
    #[serde(default)]
    speciality_title: Option<String>,

    #[serde(default)]
    monday: Option<WireFlag>,
    #[serde(default)]
    tuesday: Option<WireFlag>,
    #[serde(default)]
    wednesday: Option<WireFlag>,
    #[serde(default)]
    thursday: Option<WireFlag>,
    #[serde(default)]
    friday: Option<WireFlag>,
    #[serde(default)]
    saturday: Option<WireFlag>,
    #[serde(default)]
    sunday: Option<WireFlag>,

    #[serde(default)]
    available_start_time_monday: Option<String>,
    #[serde(default)]
    available_end_time_monday: Option<String>,
    #[serde(default)]
    available_start_time_tuesday: Option<String>,
    #[serde(default)]
    available_end_time_tuesday: Option<String>,
    #[serde(default)]
    available_start_time_wednesday: Option<String>,
    #[serde(default)]
    available_end_time_wednesday: Option<String>,
    #[serde(default)]
    available_start_time_thursday: Option<String>,
    #[serde(default)]
    available_end_time_thursday: Option<String>,
    #[serde(default)]
    available_start_time_friday: Option<String>,
    #[serde(default)]
    available_end_time_friday: Option<String>,
    #[serde(default)]
    available_start_time_saturday: Option<String>,
    #[serde(default)]
    available_end_time_saturday: Option<String>,
    #[serde(default)]
    available_start_time_sunday: Option<String>,
    #[serde(default)]
    available_end_time_sunday: Option<String>,
}

fn wire_day(flag: Option<WireFlag>, start: Option<String>, end: Option<String>) -> DaySchedule {
    if flag.as_ref().is_some_and(WireFlag::is_set) {
        DaySchedule::available(start.unwrap_or_default(), end.unwrap_or_default())
    } else {
        DaySchedule::default()
    }
}

impl From<WirePractitioner> for PractitionerRecord {
    fn from(w: WirePractitioner) -> Self {
        let schedule = [
            wire_day(w.monday, w.available_start_time_monday, w.available_end_time_monday),
            wire_day(w.tuesday, w.available_start_time_tuesday, w.available_end_time_tuesday),
            wire_day(
                w.wednesday,
                w.available_start_time_wednesday,
                w.available_end_time_wednesday,
            ),
            wire_day(
                w.thursday,
                w.available_start_time_thursday,
                w.available_end_time_thursday,
            ),
            wire_day(w.friday, w.available_start_time_friday, w.available_end_time_friday),
            wire_day(
                w.saturday,
                w.available_start_time_saturday,
                w.available_end_time_saturday,
            ),
            wire_day(w.sunday, w.available_start_time_sunday, w.available_end_time_sunday),
        ];
        Self {
            name: w.doctor_name.unwrap_or_default(),
            department: w.doctor_department.unwrap_or_default(),
            specialty: w.speciality_title.filter(|s| !s.trim().is_empty()),
            schedule,
        }
    }
}

/// Parse a roster JSON document (an array of wire records).
///
/// Entries without a name are skipped.
pub fn parse_roster(json: &str) -> Result<Vec<PractitionerRecord>> {
    let wire: Vec<WirePractitioner> = serde_json::from_str(json)?;
    let total = wire.len();
    let records: Vec<PractitionerRecord> = wire
        .into_iter()
        .filter_map(|w| {
            if w.doctor_name.as_deref().map_or(true, |n| n.trim().is_empty()) {
                warn!("Skipping roster entry without a doctor name");
                None
            } else {
                Some(PractitionerRecord::from(w))
            }
        })
        .collect();
    debug!(total, kept = records.len(), "Roster parsed");
    Ok(records)
}

/// Read and parse a roster JSON file.
pub fn load_roster(path: &Path) -> Result<Vec<PractitionerRecord>> {
    let content = std::fs::read_to_string(path)?;
    parse_roster(&content)
        .map_err(|e| CarebotError::Roster(format!("{}: {}", path.display(), e)))
}

// =============================================================================
// Tests
// =============================================================================
