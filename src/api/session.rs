//! Login, single sign-on and session endpoints.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::auth;
use crate::errors::AppError;
use crate::models::{Role, Session};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Identity already verified by the external sign-in provider.
#[derive(Debug, Deserialize)]
pub struct SsoRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RoleInfo {
    pub role: Role,
}

/// Store a new session, replacing any previous one.
async fn start_session(state: &AppState, role: Role) -> ApiResult<Session> {
    let revision_id = state.sync.revision().await;
    let session = auth::issue_session(role);

    match state.store.set_session(&session).await {
        Ok(()) => {
            tracing::info!(role = role.actor_label(), "Session started");
            success(session, revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Session> {
    let role = state
        .sync
        .read(|doc| auth::verify_credentials(&doc.settings, &request.username, &request.password))
        .await;

    match role {
        Some(role) => start_session(&state, role).await,
        None => {
            tracing::warn!("Rejected login attempt");
            let revision_id = state.sync.revision().await;
            error(
                AppError::Unauthorized("Invalid username or password".to_string()),
                revision_id,
            )
        }
    }
}

/// POST /api/auth/sso - Issues an admin session for allow-listed identities.
pub async fn login_sso(
    State(state): State<AppState>,
    Json(request): Json<SsoRequest>,
) -> ApiResult<Session> {
    let (enabled, permitted) = state
        .sync
        .read(|doc| {
            (
                doc.settings.sso_enabled,
                auth::sso_permitted(&doc.settings, &request.email),
            )
        })
        .await;

    if permitted {
        return start_session(&state, Role::Admin).await;
    }

    let revision_id = state.sync.revision().await;
    let err = if enabled {
        tracing::warn!("SSO identity is not on the allow-list");
        AppError::Forbidden("This account is not approved for access".to_string())
    } else {
        AppError::Forbidden("Single sign-on is disabled".to_string())
    };
    error(err, revision_id)
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>) -> ApiResult<()> {
    let revision_id = state.sync.revision().await;

    match state.store.clear_session().await {
        Ok(()) => success((), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/auth/session
pub async fn current_session(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<RoleInfo> {
    let revision_id = state.sync.revision().await;
    success(RoleInfo { role: session.role }, revision_id)
}
