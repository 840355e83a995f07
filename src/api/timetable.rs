//! Timetable editing endpoints.

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use super::{commit, error, success, ApiResult};
use crate::models::{AssignSlotRequest, AssignmentCheck, Session, SlotKey};
use crate::AppState;

/// Result of clearing a slot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearedSlot {
    pub removed: usize,
}

/// PUT /api/timetable/assign - Place a session; 409 with the conflict list
/// unless `override` is set.
pub async fn assign_slot(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<AssignSlotRequest>,
) -> ApiResult<AssignmentCheck> {
    commit(&state, session.role, |doc| {
        let check = doc.assign_slot(&request)?;
        let mut action = format!(
            "Assigned {} to {} on {} slot {}",
            doc.staff_name(&request.faculty_id),
            request.class_id,
            request.day,
            request.slot_id
        );
        if !check.conflicts.is_empty() {
            action.push_str(&format!(" ({} conflicts overridden)", check.conflicts.len()));
        }
        Ok((check, action))
    })
    .await
}

/// POST /api/timetable/check - Conflicts the assignment would produce.
pub async fn check_slot(
    State(state): State<AppState>,
    Json(request): Json<AssignSlotRequest>,
) -> ApiResult<AssignmentCheck> {
    let (result, revision_id) = state
        .sync
        .read(|doc| (doc.check_assignment(&request), doc.revision))
        .await;

    match result {
        Ok(check) => success(check, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/timetable/slot
pub async fn clear_slot(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(key): Json<SlotKey>,
) -> ApiResult<ClearedSlot> {
    commit(&state, session.role, |doc| {
        let removed = doc.clear_slot(&key);
        let action = format!(
            "Cleared {} slot {} for {}",
            key.day, key.slot_id, key.class_id
        );
        Ok((ClearedSlot { removed }, action))
    })
    .await
}
