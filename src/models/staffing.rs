//! Attendance, leave and substitution records.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

use super::{new_id, StateDocument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[default]
    Present,
}

/// Daily check-in of a staff member. At most one per (staff, date).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub staff_id: String,
    pub date: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: String,
    pub staff_id: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub status: LeaveStatus,
    #[serde(default)]
    pub request_date: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubstitutionStatus {
    #[default]
    Pending,
    Approved,
    Cancelled,
}

/// Cover arrangement for a single slot. Only approved ones are shown to viewers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub id: String,
    pub date: String,
    pub slot_id: String,
    pub class_id: String,
    pub original_faculty_id: String,
    pub substitute_faculty_id: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub status: SubstitutionStatus,
}

/// Request body for marking attendance. The date defaults to today (UTC).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceRequest {
    #[serde(default)]
    pub staff_id: String,
    #[serde(default)]
    pub date: Option<String>,
}

/// Request body for a leave application. Every field is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyLeaveRequest {
    #[serde(default)]
    pub staff_id: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaveDecisionRequest {
    pub status: LeaveStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubstitutionRequest {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub slot_id: String,
    #[serde(default)]
    pub class_id: String,
    #[serde(default)]
    pub original_faculty_id: String,
    #[serde(default)]
    pub substitute_faculty_id: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubstitutionDecisionRequest {
    pub status: SubstitutionStatus,
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{} must be a YYYY-MM-DD date", field)))
}

fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

impl StateDocument {
    /// Record a check-in. Returns the record and whether it was newly created.
    pub fn mark_attendance(
        &mut self,
        request: &MarkAttendanceRequest,
    ) -> Result<(AttendanceRecord, bool), AppError> {
        let date = self.attendance_date(request)?;
        if let Some(existing) = self.find_attendance(&request.staff_id, &date) {
            return Ok((existing.clone(), false));
        }

        let record = AttendanceRecord {
            id: new_id(),
            staff_id: request.staff_id.clone(),
            date,
            timestamp: Utc::now().to_rfc3339(),
            status: AttendanceStatus::Present,
        };
        self.attendance.push(record.clone());
        Ok((record, true))
    }

    /// The check-in already recorded for this request, if any.
    pub fn existing_attendance(
        &self,
        request: &MarkAttendanceRequest,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let date = self.attendance_date(request)?;
        Ok(self.find_attendance(&request.staff_id, &date).cloned())
    }

    fn find_attendance(&self, staff_id: &str, date: &str) -> Option<&AttendanceRecord> {
        self.attendance
            .iter()
            .find(|a| a.staff_id == staff_id && a.date == date)
    }

    /// Validate the request and normalize its date to `YYYY-MM-DD`.
    fn attendance_date(&self, request: &MarkAttendanceRequest) -> Result<String, AppError> {
        if request.staff_id.trim().is_empty() {
            return Err(AppError::Validation("staffId is required".to_string()));
        }
        if self.find_staff(&request.staff_id).is_none() {
            return Err(AppError::NotFound(format!(
                "Staff member {} not found",
                request.staff_id
            )));
        }

        match &request.date {
            Some(date) => Ok(parse_date(date, "date")?.format("%Y-%m-%d").to_string()),
            None => Ok(today()),
        }
    }

    pub fn apply_leave(&mut self, request: &ApplyLeaveRequest) -> Result<LeaveRequest, AppError> {
        if request.staff_id.trim().is_empty()
            || request.start_date.trim().is_empty()
            || request.end_date.trim().is_empty()
            || request.reason.trim().is_empty()
        {
            return Err(AppError::Validation("All fields are required.".to_string()));
        }
        if self.find_staff(&request.staff_id).is_none() {
            return Err(AppError::NotFound(format!(
                "Staff member {} not found",
                request.staff_id
            )));
        }

        let start = parse_date(&request.start_date, "startDate")?;
        let end = parse_date(&request.end_date, "endDate")?;
        if start > end {
            return Err(AppError::Validation(
                "startDate must not be after endDate".to_string(),
            ));
        }

        let leave = LeaveRequest {
            id: new_id(),
            staff_id: request.staff_id.clone(),
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
            reason: request.reason.trim().to_string(),
            status: LeaveStatus::Pending,
            request_date: today(),
        };
        self.leaves.insert(0, leave.clone());
        Ok(leave)
    }

    pub fn decide_leave(&mut self, id: &str, status: LeaveStatus) -> Result<LeaveRequest, AppError> {
        if status == LeaveStatus::Pending {
            return Err(AppError::Validation(
                "A decision must approve or reject".to_string(),
            ));
        }
        let leave = self
            .leaves
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Leave request {} not found", id)))?;
        if leave.status != LeaveStatus::Pending {
            return Err(AppError::Validation(format!(
                "Leave request {} was already decided",
                id
            )));
        }
        leave.status = status;
        Ok(leave.clone())
    }

    pub fn pending_leave_count(&self) -> usize {
        self.leaves
            .iter()
            .filter(|l| l.status == LeaveStatus::Pending)
            .count()
    }

    pub fn create_substitution(
        &mut self,
        request: &CreateSubstitutionRequest,
    ) -> Result<Substitution, AppError> {
        if request.slot_id.trim().is_empty()
            || request.class_id.trim().is_empty()
            || request.original_faculty_id.trim().is_empty()
            || request.substitute_faculty_id.trim().is_empty()
        {
            return Err(AppError::Validation(
                "slotId, classId, originalFacultyId and substituteFacultyId are required"
                    .to_string(),
            ));
        }
        let date = parse_date(&request.date, "date")?;
        if request.original_faculty_id == request.substitute_faculty_id {
            return Err(AppError::Validation(
                "Substitute must differ from the original faculty member".to_string(),
            ));
        }
        if self.config.slot(&request.slot_id).is_none() {
            return Err(AppError::Validation(format!(
                "Unknown time slot {}",
                request.slot_id
            )));
        }
        if self.find_class(&request.class_id).is_none() {
            return Err(AppError::NotFound(format!("Class {} not found", request.class_id)));
        }
        for faculty_id in [&request.original_faculty_id, &request.substitute_faculty_id] {
            if self.find_staff(faculty_id).is_none() {
                return Err(AppError::NotFound(format!(
                    "Staff member {} not found",
                    faculty_id
                )));
            }
        }

        let substitution = Substitution {
            id: new_id(),
            date: date.format("%Y-%m-%d").to_string(),
            slot_id: request.slot_id.clone(),
            class_id: request.class_id.clone(),
            original_faculty_id: request.original_faculty_id.clone(),
            substitute_faculty_id: request.substitute_faculty_id.clone(),
            reason: request.reason.trim().to_string(),
            status: SubstitutionStatus::Pending,
        };
        self.substitutions.push(substitution.clone());
        Ok(substitution)
    }

    pub fn decide_substitution(
        &mut self,
        id: &str,
        status: SubstitutionStatus,
    ) -> Result<Substitution, AppError> {
        let substitution = self
            .substitutions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Substitution {} not found", id)))?;
        substitution.status = status;
        Ok(substitution.clone())
    }

    pub fn approved_substitutions(&self) -> Vec<Substitution> {
        self.substitutions
            .iter()
            .filter(|s| s.status == SubstitutionStatus::Approved)
            .cloned()
            .collect()
    }

    /// Pick cover staff: the first active member of the subject's
    /// department, else the first active member at all.
    pub fn suggest_substitute(&self, subject_id: &str) -> Option<&super::StaffMember> {
        let subject = self.find_subject(subject_id);
        self.staff
            .iter()
            .filter(|s| s.is_active)
            .find(|s| subject.map_or(true, |sub| s.department == sub.department))
            .or_else(|| self.staff.iter().find(|s| s.is_active))
    }
}
