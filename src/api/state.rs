//! Whole-document and viewer endpoints.

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{success, view, ApiResult};
use crate::models::{
    DashboardSummary, PublicDirectory, Role, ScheduleRow, ScheduleView, Session, StateDocument,
    Substitution,
};
use crate::AppState;

/// Revision info returned by `GET /api/state/revision`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub day: Option<String>,
}

impl DayQuery {
    /// The requested day, or today's weekday name.
    fn day(&self) -> String {
        self.day
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| Utc::now().format("%A").to_string())
    }
}

/// GET /api/state - Full document; credentials are redacted for admins.
pub async fn get_state(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<StateDocument> {
    let doc = state.sync.snapshot().await;
    let revision_id = doc.revision;

    match session.role {
        Role::Principal => success(doc, revision_id),
        Role::Admin => success(doc.redacted(), revision_id),
    }
}

/// GET /api/state/revision
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    view(&state, |doc| RevisionInfo {
        revision_id: doc.revision,
    })
    .await
}

/// GET /api/dashboard
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<DashboardSummary> {
    view(&state, StateDocument::dashboard).await
}

/// GET /api/public/directory
pub async fn get_directory(State(state): State<AppState>) -> ApiResult<PublicDirectory> {
    view(&state, StateDocument::public_directory).await
}

/// GET /api/public/timetable/class/:class_id?day=
pub async fn class_schedule(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    Query(query): Query<DayQuery>,
) -> ApiResult<Vec<ScheduleRow>> {
    let day = query.day();
    view(&state, |doc| doc.schedule(ScheduleView::Class, &class_id, &day)).await
}

/// GET /api/public/timetable/faculty/:faculty_id?day=
pub async fn faculty_schedule(
    State(state): State<AppState>,
    Path(faculty_id): Path<String>,
    Query(query): Query<DayQuery>,
) -> ApiResult<Vec<ScheduleRow>> {
    let day = query.day();
    view(&state, |doc| {
        doc.schedule(ScheduleView::Faculty, &faculty_id, &day)
    })
    .await
}

/// GET /api/public/substitutions - Approved substitutions only.
pub async fn public_substitutions(State(state): State<AppState>) -> ApiResult<Vec<Substitution>> {
    view(&state, StateDocument::approved_substitutions).await
}
