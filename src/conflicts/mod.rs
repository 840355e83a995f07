//! Conflict detection over a candidate timetable.
//!
//! A single pass keyed by (day, slot, faculty) and (day, slot, class). Pure and
//! deterministic: the document is only read for display names.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{StateDocument, TimetableEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// One faculty member booked into two classes in the same slot
    #[serde(rename = "Faculty Conflict")]
    FacultyConflict,
    /// One class holding two sessions in the same slot
    #[serde(rename = "Class Overlap")]
    ClassOverlap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
}

impl ConflictKind {
    pub fn severity(&self) -> Severity {
        match self {
            ConflictKind::FacultyConflict => Severity::High,
            ConflictKind::ClassOverlap => Severity::Medium,
        }
    }
}

/// A detected double booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub description: String,
    pub severity: Severity,
}

impl Conflict {
    fn new(kind: ConflictKind, description: String) -> Self {
        Self {
            kind,
            description,
            severity: kind.severity(),
        }
    }
}

type SlotKey<'a> = (&'a str, &'a str, &'a str);

fn class_label(names: &StateDocument, class_id: &str) -> String {
    names
        .find_class(class_id)
        .map(|c| c.label())
        .unwrap_or_else(|| class_id.to_string())
}

/// Report every faculty double booking and class overlap in `entries`, in
/// input order. An entry never conflicts with another entry of the same id.
pub fn detect_conflicts(entries: &[TimetableEntry], names: &StateDocument) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    let mut by_faculty: HashMap<SlotKey<'_>, &TimetableEntry> = HashMap::new();
    let mut by_class: HashMap<SlotKey<'_>, &TimetableEntry> = HashMap::new();

    for entry in entries {
        let faculty_key = (
            entry.day.as_str(),
            entry.slot_id.as_str(),
            entry.faculty_id.as_str(),
        );
        let class_key = (
            entry.day.as_str(),
            entry.slot_id.as_str(),
            entry.class_id.as_str(),
        );

        if let Some(existing) = by_faculty.insert(faculty_key, entry) {
            if existing.id != entry.id {
                let faculty = names
                    .find_staff(&entry.faculty_id)
                    .map(|s| s.name.as_str())
                    .unwrap_or("Faculty");
                conflicts.push(Conflict::new(
                    ConflictKind::FacultyConflict,
                    format!(
                        "{} is already scheduled for {} during this slot. Potential overlap with {}.",
                        faculty,
                        class_label(names, &existing.class_id),
                        class_label(names, &entry.class_id),
                    ),
                ));
            }
        }

        if let Some(existing) = by_class.insert(class_key, entry) {
            if existing.id != entry.id {
                conflicts.push(Conflict::new(
                    ConflictKind::ClassOverlap,
                    format!(
                        "{} is already assigned a session in this slot on {}.",
                        class_label(names, &entry.class_id),
                        entry.day,
                    ),
                ));
            }
        }
    }

    tracing::debug!(
        entries = entries.len(),
        conflicts = conflicts.len(),
        "Conflict check complete"
    );
    conflicts
}
