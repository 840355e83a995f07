//! Staff, subject and class registry endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{commit, view, ApiResult};
use crate::models::{
    ClassRoom, CreateClassRequest, CreateStaffRequest, CreateSubjectRequest, Session, StaffMember,
    Subject,
};
use crate::AppState;

/// GET /api/staff
pub async fn list_staff(State(state): State<AppState>) -> ApiResult<Vec<StaffMember>> {
    view(&state, |doc| doc.staff.clone()).await
}

/// POST /api/staff
pub async fn create_staff(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<CreateStaffRequest>,
) -> ApiResult<StaffMember> {
    commit(&state, session.role, |doc| {
        let member = doc.add_staff(&request)?;
        let action = format!("Added staff member {}", member.name);
        Ok((member, action))
    })
    .await
}

/// DELETE /api/staff/:id
pub async fn delete_staff(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<StaffMember> {
    commit(&state, session.role, |doc| {
        let member = doc.remove_staff(&id)?;
        let action = format!("Removed staff member {}", member.name);
        Ok((member, action))
    })
    .await
}

/// GET /api/subjects
pub async fn list_subjects(State(state): State<AppState>) -> ApiResult<Vec<Subject>> {
    view(&state, |doc| doc.subjects.clone()).await
}

/// POST /api/subjects
pub async fn create_subject(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<CreateSubjectRequest>,
) -> ApiResult<Subject> {
    commit(&state, session.role, |doc| {
        let subject = doc.add_subject(&request)?;
        let action = format!("Added subject {} {}", subject.code, subject.name);
        Ok((subject, action))
    })
    .await
}

/// DELETE /api/subjects/:id
pub async fn delete_subject(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Subject> {
    commit(&state, session.role, |doc| {
        let subject = doc.remove_subject(&id)?;
        let action = format!("Removed subject {}", subject.code);
        Ok((subject, action))
    })
    .await
}

/// GET /api/classes
pub async fn list_classes(State(state): State<AppState>) -> ApiResult<Vec<ClassRoom>> {
    view(&state, |doc| doc.classes.clone()).await
}

/// POST /api/classes
pub async fn create_class(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<CreateClassRequest>,
) -> ApiResult<ClassRoom> {
    commit(&state, session.role, |doc| {
        let class = doc.add_class(&request)?;
        let action = format!("Added class {}", class.label());
        Ok((class, action))
    })
    .await
}

/// DELETE /api/classes/:id
pub async fn delete_class(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<ClassRoom> {
    commit(&state, session.role, |doc| {
        let class = doc.remove_class(&id)?;
        let action = format!("Removed class {}", class.label());
        Ok((class, action))
    })
    .await
}
