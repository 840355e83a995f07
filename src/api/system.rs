//! Principal-only settings, configuration and sync endpoints.

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use super::{commit, error, success, view, ApiResult};
use crate::models::{
    AdminSettings, InstitutionConfig, Session, SystemLog, UpdateConfigRequest,
    UpdateSettingsRequest,
};
use crate::sync::SyncStatus;
use crate::AppState;

/// Outcome of a manual remote operation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub ok: bool,
}

/// Sync status plus how pushes are judged.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    #[serde(flatten)]
    pub status: SyncStatus,
    pub push_mode: &'static str,
}

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<AdminSettings> {
    view(&state, |doc| doc.settings.clone()).await
}

/// PUT /api/settings - Partial update.
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<UpdateSettingsRequest>,
) -> ApiResult<AdminSettings> {
    commit(&state, session.role, |doc| {
        let settings = doc.update_settings(&request);
        Ok((settings, "Updated system settings".to_string()))
    })
    .await
}

/// PUT /api/config
pub async fn update_config(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<UpdateConfigRequest>,
) -> ApiResult<InstitutionConfig> {
    commit(&state, session.role, |doc| {
        let config = doc.update_config(&request)?;
        let action = format!(
            "Updated institution configuration ({} {})",
            config.academic_year, config.term
        );
        Ok((config, action))
    })
    .await
}

/// GET /api/logs - Newest first.
pub async fn list_logs(State(state): State<AppState>) -> ApiResult<Vec<SystemLog>> {
    view(&state, |doc| doc.logs.clone()).await
}

/// GET /api/sync/status
pub async fn sync_status(State(state): State<AppState>) -> ApiResult<SyncReport> {
    let status = state.sync.status().await;
    let revision_id = status.revision;
    let report = SyncReport {
        status,
        push_mode: state.config.push_mode.as_str(),
    };
    success(report, revision_id)
}

/// POST /api/sync/pull - Replace local state with the remote copy.
pub async fn sync_pull(State(state): State<AppState>) -> ApiResult<SyncOutcome> {
    let result = state.sync.pull_now().await;
    let revision_id = state.sync.revision().await;

    match result {
        Ok(ok) => success(SyncOutcome { ok }, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/sync/push - Send the live document to the remote now.
pub async fn sync_push(State(state): State<AppState>) -> ApiResult<SyncOutcome> {
    let result = state.sync.push_now().await;
    let revision_id = state.sync.revision().await;

    match result {
        Ok(ok) => success(SyncOutcome { ok }, revision_id),
        Err(e) => error(e, revision_id),
    }
}
