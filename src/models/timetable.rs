//! Timetable entries, slot assignment and schedule views.

use serde::{Deserialize, Serialize};

use crate::conflicts::{detect_conflicts, Conflict};
use crate::errors::AppError;

use super::{new_id, StateDocument};

/// Kind of teaching session held in a slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionType {
    #[default]
    Lecture,
    Lab,
    Seminar,
    Clinical,
}

/// One cell of the weekly grid: a class taught by a faculty member in a slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub id: String,
    pub day: String,
    pub slot_id: String,
    #[serde(default)]
    pub subject_id: String,
    #[serde(default)]
    pub faculty_id: String,
    pub class_id: String,
    #[serde(rename = "type", default)]
    pub session_type: SessionType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_locked: bool,
}

impl TimetableEntry {
    /// Whether this entry occupies the given (day, slot, class) cell.
    pub fn occupies(&self, day: &str, slot_id: &str, class_id: &str) -> bool {
        self.day == day && self.slot_id == slot_id && self.class_id == class_id
    }
}

/// Request body for assigning a faculty member and subject to a grid cell.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignSlotRequest {
    pub day: String,
    pub slot_id: String,
    pub class_id: String,
    pub faculty_id: String,
    pub subject_id: String,
    #[serde(rename = "type", default)]
    pub session_type: Option<SessionType>,
    /// Commit even when conflicts are detected
    #[serde(rename = "override", default)]
    pub allow_conflicts: bool,
}

/// Request body identifying a single grid cell.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotKey {
    pub day: String,
    pub slot_id: String,
    pub class_id: String,
}

/// Result of a conflict check for a proposed assignment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentCheck {
    pub entry: TimetableEntry,
    pub conflicts: Vec<Conflict>,
}

/// One row of a rendered day schedule.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    pub slot_id: String,
    pub label: String,
    pub time: String,
    pub is_break: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<ScheduledSession>,
}

/// Timetable entry resolved to display names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledSession {
    pub entry_id: String,
    pub subject_name: String,
    pub faculty_name: String,
    pub class_name: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
}

/// Which side of the grid a schedule is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleView {
    Class,
    Faculty,
}

impl StateDocument {
    fn validate_assignment(&self, request: &AssignSlotRequest) -> Result<(), AppError> {
        if !self.config.is_working_day(&request.day) {
            return Err(AppError::Validation(format!(
                "{} is not a working day",
                request.day
            )));
        }
        match self.config.slot(&request.slot_id) {
            None => {
                return Err(AppError::Validation(format!(
                    "Unknown time slot {}",
                    request.slot_id
                )))
            }
            Some(slot) if slot.is_break => {
                return Err(AppError::Validation(format!(
                    "{} is a break and cannot be scheduled",
                    slot.label
                )))
            }
            Some(_) => {}
        }
        if self.find_class(&request.class_id).is_none() {
            return Err(AppError::NotFound(format!("Class {} not found", request.class_id)));
        }
        if self.find_staff(&request.faculty_id).is_none() {
            return Err(AppError::NotFound(format!(
                "Staff member {} not found",
                request.faculty_id
            )));
        }
        if self.find_subject(&request.subject_id).is_none() {
            return Err(AppError::NotFound(format!(
                "Subject {} not found",
                request.subject_id
            )));
        }
        Ok(())
    }

    /// Build the post-assignment timetable: every entry except the one in the
    /// target cell, followed by the new entry.
    fn candidate_timetable(&self, request: &AssignSlotRequest) -> (TimetableEntry, Vec<TimetableEntry>) {
        let entry = TimetableEntry {
            id: new_id(),
            day: request.day.clone(),
            slot_id: request.slot_id.clone(),
            subject_id: request.subject_id.clone(),
            faculty_id: request.faculty_id.clone(),
            class_id: request.class_id.clone(),
            session_type: request.session_type.unwrap_or_default(),
            is_locked: false,
        };

        let mut candidate: Vec<TimetableEntry> = self
            .timetable
            .iter()
            .filter(|e| !e.occupies(&request.day, &request.slot_id, &request.class_id))
            .cloned()
            .collect();
        candidate.push(entry.clone());

        (entry, candidate)
    }

    /// Dry-run an assignment and report the conflicts it would introduce.
    pub fn check_assignment(&self, request: &AssignSlotRequest) -> Result<AssignmentCheck, AppError> {
        self.validate_assignment(request)?;
        let (entry, candidate) = self.candidate_timetable(request);
        let conflicts = detect_conflicts(&candidate, self);
        Ok(AssignmentCheck { entry, conflicts })
    }

    /// Assign a cell. Conflicts reject the assignment unless the request
    /// explicitly overrides them.
    pub fn assign_slot(&mut self, request: &AssignSlotRequest) -> Result<AssignmentCheck, AppError> {
        self.validate_assignment(request)?;
        let (entry, candidate) = self.candidate_timetable(request);
        let conflicts = detect_conflicts(&candidate, self);

        if !conflicts.is_empty() && !request.allow_conflicts {
            return Err(AppError::Conflict {
                message: format!("{} Override to save anyway.", conflicts[0].description),
                conflicts,
            });
        }

        self.timetable = candidate;
        Ok(AssignmentCheck { entry, conflicts })
    }

    /// Remove every entry in a cell, returning how many were removed.
    pub fn clear_slot(&mut self, key: &SlotKey) -> usize {
        let before = self.timetable.len();
        self.timetable
            .retain(|e| !e.occupies(&key.day, &key.slot_id, &key.class_id));
        before - self.timetable.len()
    }

    /// Render the day's grid for a class or a faculty member.
    pub fn schedule(&self, view: ScheduleView, target_id: &str, day: &str) -> Vec<ScheduleRow> {
        self.config
            .time_slots
            .iter()
            .map(|slot| {
                let session = self
                    .timetable
                    .iter()
                    .find(|e| {
                        e.day == day
                            && e.slot_id == slot.id
                            && match view {
                                ScheduleView::Class => e.class_id == target_id,
                                ScheduleView::Faculty => e.faculty_id == target_id,
                            }
                    })
                    .map(|e| self.resolve_session(e));

                ScheduleRow {
                    slot_id: slot.id.clone(),
                    label: slot.label.clone(),
                    time: slot.time_range(),
                    is_break: slot.is_break,
                    session,
                }
            })
            .collect()
    }

    fn resolve_session(&self, entry: &TimetableEntry) -> ScheduledSession {
        ScheduledSession {
            entry_id: entry.id.clone(),
            subject_name: self
                .find_subject(&entry.subject_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "Unknown Subject".to_string()),
            faculty_name: self
                .find_staff(&entry.faculty_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "Unknown Faculty".to_string()),
            class_name: self
                .find_class(&entry.class_id)
                .map(|c| c.label())
                .unwrap_or_else(|| "Unknown Class".to_string()),
            session_type: entry.session_type,
        }
    }
}
