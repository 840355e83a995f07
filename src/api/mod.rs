//! REST API module.
//!
//! Contains all API routes and handlers. Every mutation goes through the
//! synchronizer so it is persisted and replicated the same way.

mod registry;
mod session;
mod staffing;
mod state;
mod system;
mod timetable;

pub use registry::*;
pub use session::*;
pub use staffing::*;
pub use state::*;
pub use system::*;
pub use timetable::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::{AppError, AppErrorWithRevision};
use crate::models::{Role, StateDocument};
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: u64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: u64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: u64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, revision_id: u64) -> ApiResult<T> {
    Err(AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

/// Run a mutation through the synchronizer and log it under the acting role.
async fn commit<T, F>(state: &AppState, role: Role, mutate: F) -> ApiResult<T>
where
    T: Serialize,
    F: FnOnce(&mut StateDocument) -> Result<(T, String), AppError>,
{
    let result = state
        .sync
        .update(|doc| {
            let (value, action) = mutate(doc)?;
            doc.push_log(role, action);
            Ok(value)
        })
        .await;

    match result {
        Ok(committed) => success(committed.value, committed.revision),
        Err(e) => {
            let revision_id = state.sync.revision().await;
            error(e, revision_id)
        }
    }
}

/// Read from the live document and wrap the result with the current revision.
async fn view<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    T: Serialize,
    F: FnOnce(&StateDocument) -> T,
{
    let (data, revision_id) = state.sync.read(|doc| (f(doc), doc.revision)).await;
    success(data, revision_id)
}
