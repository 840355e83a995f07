//! Attendance, leave and substitution endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use super::{commit, error, success, view, ApiResult};
use crate::errors::AppError;
use crate::models::{
    ApplyLeaveRequest, AttendanceRecord, CreateSubstitutionRequest, LeaveDecisionRequest,
    LeaveRequest, MarkAttendanceRequest, Session, StaffMember, Substitution,
    SubstitutionDecisionRequest,
};
use crate::AppState;

/// Attendance result; `created` is false when the record already existed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedAttendance {
    pub record: AttendanceRecord,
    pub created: bool,
}

/// GET /api/attendance
pub async fn list_attendance(State(state): State<AppState>) -> ApiResult<Vec<AttendanceRecord>> {
    view(&state, |doc| doc.attendance.clone()).await
}

/// POST /api/attendance - A repeat check-in returns the existing record
/// without a write.
pub async fn mark_attendance(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<MarkAttendanceRequest>,
) -> ApiResult<MarkedAttendance> {
    let (existing, revision) = state
        .sync
        .read(|doc| (doc.existing_attendance(&request), doc.revision))
        .await;
    match existing {
        Ok(Some(record)) => {
            return success(
                MarkedAttendance {
                    record,
                    created: false,
                },
                revision,
            )
        }
        Ok(None) => {}
        Err(e) => return error(e, revision),
    }

    commit(&state, session.role, |doc| {
        let (record, created) = doc.mark_attendance(&request)?;
        let action = format!(
            "Marked {} present on {}",
            doc.staff_name(&record.staff_id),
            record.date
        );
        Ok((MarkedAttendance { record, created }, action))
    })
    .await
}

/// GET /api/leaves
pub async fn list_leaves(State(state): State<AppState>) -> ApiResult<Vec<LeaveRequest>> {
    view(&state, |doc| doc.leaves.clone()).await
}

/// POST /api/leaves
pub async fn apply_leave(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<ApplyLeaveRequest>,
) -> ApiResult<LeaveRequest> {
    commit(&state, session.role, |doc| {
        let leave = doc.apply_leave(&request)?;
        let action = format!(
            "Leave requested for {} ({} to {})",
            doc.staff_name(&leave.staff_id),
            leave.start_date,
            leave.end_date
        );
        Ok((leave, action))
    })
    .await
}

/// POST /api/leaves/:id/decision
pub async fn decide_leave(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(request): Json<LeaveDecisionRequest>,
) -> ApiResult<LeaveRequest> {
    commit(&state, session.role, |doc| {
        let leave = doc.decide_leave(&id, request.status)?;
        let action = format!(
            "Leave for {} marked {:?}",
            doc.staff_name(&leave.staff_id),
            leave.status
        );
        Ok((leave, action))
    })
    .await
}

/// GET /api/substitutions
pub async fn list_substitutions(State(state): State<AppState>) -> ApiResult<Vec<Substitution>> {
    view(&state, |doc| doc.substitutions.clone()).await
}

/// POST /api/substitutions
pub async fn create_substitution(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<CreateSubstitutionRequest>,
) -> ApiResult<Substitution> {
    commit(&state, session.role, |doc| {
        let substitution = doc.create_substitution(&request)?;
        let action = format!(
            "Substitution: {} covers {} on {}",
            doc.staff_name(&substitution.substitute_faculty_id),
            doc.staff_name(&substitution.original_faculty_id),
            substitution.date
        );
        Ok((substitution, action))
    })
    .await
}

/// POST /api/substitutions/:id/decision
pub async fn decide_substitution(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(request): Json<SubstitutionDecisionRequest>,
) -> ApiResult<Substitution> {
    commit(&state, session.role, |doc| {
        let substitution = doc.decide_substitution(&id, request.status)?;
        let action = format!("Substitution {} marked {:?}", id, substitution.status);
        Ok((substitution, action))
    })
    .await
}

/// GET /api/substitutions/suggest/:subject_id
pub async fn suggest_substitute(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
) -> ApiResult<StaffMember> {
    let (suggestion, revision_id) = state
        .sync
        .read(|doc| (doc.suggest_substitute(&subject_id).cloned(), doc.revision))
        .await;

    match suggestion {
        Some(member) => success(member, revision_id),
        None => error(
            AppError::NotFound("No active staff member available".to_string()),
            revision_id,
        ),
    }
}
