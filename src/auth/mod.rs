//! Session-based authentication for the two administrative roles.
//!
//! Credentials live in the State Document settings; the active session lives in
//! the local store. Comparisons are constant-time to mitigate timing attacks.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use subtle::ConstantTimeEq;

use crate::db::LocalStore;
use crate::errors::{codes, ErrorDetails, ErrorResponse};
use crate::models::{AdminSettings, Role, Session};

/// Header carrying the session token as an alternative to a bearer token.
pub const SESSION_HEADER: &str = "x-session-token";

/// Check username/password against the stored credentials. The principal
/// account is checked first.
pub fn verify_credentials(settings: &AdminSettings, username: &str, password: &str) -> Option<Role> {
    let principal = constant_time_compare(username, &settings.principal_username)
        & constant_time_compare(password, &settings.principal_password);
    if principal {
        return Some(Role::Principal);
    }

    let admin = constant_time_compare(username, &settings.admin_username)
        & constant_time_compare(password, &settings.admin_password);
    admin.then_some(Role::Admin)
}

/// Whether single sign-on may issue a session for this identity.
pub fn sso_permitted(settings: &AdminSettings, email: &str) -> bool {
    let email = email.trim();
    settings.sso_enabled
        && !email.is_empty()
        && settings
            .sso_allow_list
            .iter()
            .any(|allowed| allowed.trim().eq_ignore_ascii_case(email))
}

/// Create a new session for a role.
pub fn issue_session(role: Role) -> Session {
    Session {
        token: uuid::Uuid::new_v4().simple().to_string(),
        role,
        issued_at: Utc::now().to_rfc3339(),
    }
}

/// Extract the presented token from `x-session-token` or a bearer header.
fn presented_token(request: &Request) -> Option<String> {
    let headers = request.headers();
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
        .map(|s| s.trim().to_string())
}

/// Session layer: requires the presented token to match the stored session and
/// exposes the [`Session`] to handlers as a request extension.
pub async fn session_layer(store: LocalStore, mut request: Request, next: Next) -> Response {
    let Some(token) = presented_token(&request) else {
        return error_response(StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED, "Missing session token");
    };

    let session = match store.get_session().await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to read session: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::STORAGE_ERROR,
                "Failed to read session",
            );
        }
    };

    match session {
        Some(session) if constant_time_compare(&token, &session.token) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        _ => error_response(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Invalid or expired session",
        ),
    }
}

/// Restricts a route group to the principal role. Must run inside the session layer.
pub async fn principal_layer(request: Request, next: Next) -> Response {
    let role = request.extensions().get::<Session>().map(|s| s.role);

    match role {
        Some(Role::Principal) => next.run(request).await,
        Some(Role::Admin) => error_response(
            StatusCode::FORBIDDEN,
            codes::FORBIDDEN,
            "Principal access required",
        ),
        None => error_response(StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED, "Missing session"),
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    a_bytes.ct_eq(b_bytes).into()
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorDetails {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        },
        revision_id: 0,
    };

    (status, Json(body)).into_response()
}
