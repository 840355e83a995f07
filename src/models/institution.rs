//! Institution configuration: working days and the daily slot grid.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

use super::StateDocument;

/// A single period (or break) in the daily grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: String,
    pub label: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub is_break: bool,
}

impl TimeSlot {
    fn new(id: &str, label: &str, start: &str, end: &str, is_break: bool) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            is_break,
        }
    }

    /// Human-readable time range, e.g. `09:00 - 10:00`.
    pub fn time_range(&self) -> String {
        format!("{} - {}", self.start, self.end)
    }
}

/// Singleton institution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstitutionConfig {
    pub working_days: Vec<String>,
    pub periods_per_day: u32,
    pub time_slots: Vec<TimeSlot>,
    pub academic_year: String,
    pub term: String,
}

impl Default for InstitutionConfig {
    fn default() -> Self {
        let working_days = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"]
            .iter()
            .map(|d| d.to_string())
            .collect();

        let time_slots = vec![
            TimeSlot::new("1", "Period 1", "09:00", "10:00", false),
            TimeSlot::new("2", "Period 2", "10:00", "11:00", false),
            TimeSlot::new("3", "Period 3", "11:00", "12:00", false),
            TimeSlot::new("4", "Lunch", "12:00", "13:00", true),
            TimeSlot::new("5", "Period 4", "13:00", "14:00", false),
            TimeSlot::new("6", "Period 5", "14:00", "15:00", false),
            TimeSlot::new("7", "Period 6", "15:00", "16:00", false),
        ];

        Self {
            working_days,
            periods_per_day: 7,
            time_slots,
            academic_year: "2024-25".to_string(),
            term: "Even Semester".to_string(),
        }
    }
}

impl InstitutionConfig {
    pub fn slot(&self, slot_id: &str) -> Option<&TimeSlot> {
        self.time_slots.iter().find(|s| s.id == slot_id)
    }

    pub fn is_working_day(&self, day: &str) -> bool {
        self.working_days.iter().any(|d| d == day)
    }
}

/// Request body for updating the institution configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfigRequest {
    #[serde(default)]
    pub working_days: Option<Vec<String>>,
    #[serde(default)]
    pub periods_per_day: Option<u32>,
    #[serde(default)]
    pub time_slots: Option<Vec<TimeSlot>>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub term: Option<String>,
}

impl StateDocument {
    /// Apply a partial configuration update.
    pub fn update_config(&mut self, request: &UpdateConfigRequest) -> Result<InstitutionConfig, AppError> {
        if let Some(days) = &request.working_days {
            if days.iter().any(|d| d.trim().is_empty()) {
                return Err(AppError::Validation("Working day names must not be empty".to_string()));
            }
            let mut ordered: Vec<String> = Vec::with_capacity(days.len());
            for day in days {
                if !ordered.contains(day) {
                    ordered.push(day.clone());
                }
            }
            self.config.working_days = ordered;
        }

        if let Some(slots) = &request.time_slots {
            for (i, slot) in slots.iter().enumerate() {
                if slot.id.trim().is_empty() {
                    return Err(AppError::Validation("Time slot id is required".to_string()));
                }
                if slots[..i].iter().any(|s| s.id == slot.id) {
                    return Err(AppError::Validation(format!(
                        "Duplicate time slot id {}",
                        slot.id
                    )));
                }
            }
            self.config.time_slots = slots.clone();
        }

        if let Some(periods) = request.periods_per_day {
            self.config.periods_per_day = periods;
        }
        if let Some(year) = &request.academic_year {
            self.config.academic_year = year.clone();
        }
        if let Some(term) = &request.term {
            self.config.term = term.clone();
        }

        Ok(self.config.clone())
    }
}
