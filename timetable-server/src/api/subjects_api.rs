use axum::{extract::State, Extension};

use crate::api::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::auth::{ensure_any, ensure_in_department};
use crate::auth::roles::SUBJECT_WRITE;
use crate::error::AppResult;
use crate::models::{NewSubject, Subject, UpdateSubject, User};
use crate::response::{ApiResponse, Deleted};
use crate::services::subject_service::{self, SubjectFilter};
use crate::AppState;

pub async fn list_subjects(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<SubjectFilter>,
) -> AppResult<ApiResponse<Vec<Subject>>> {
    let mut conn = state.db.get()?;
    let subjects = subject_service::list_subjects(&mut conn, &filter)?;
    Ok(ApiResponse::ok("Subjects retrieved successfully", subjects))
}

pub async fn get_subject(
    State(state): State<AppState>,
    ApiPath(subject_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Subject>> {
    let mut conn = state.db.get()?;
    let subject = subject_service::get_subject(&mut conn, subject_id)?;
    Ok(ApiResponse::ok("Subject retrieved successfully", subject))
}

pub async fn create_subject(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<NewSubject>,
) -> AppResult<ApiResponse<Subject>> {
    ensure_in_department(&user, SUBJECT_WRITE, req.department_id)?;
    let mut conn = state.db.get()?;
    let subject = subject_service::create_subject(&mut conn, &req)?;
    Ok(ApiResponse::created("Subject created successfully", subject))
}

pub async fn update_subject(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(subject_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<UpdateSubject>,
) -> AppResult<ApiResponse<Subject>> {
    ensure_any(&user, SUBJECT_WRITE)?;
    let mut conn = state.db.get()?;
    let current = subject_service::get_subject(&mut conn, subject_id)?;
    ensure_in_department(&user, SUBJECT_WRITE, current.department_id)?;
    if let Some(target) = req.department_id {
        ensure_in_department(&user, SUBJECT_WRITE, target)?;
    }
    let subject = subject_service::update_subject(&mut conn, subject_id, &req)?;
    Ok(ApiResponse::ok("Subject updated successfully", subject))
}

pub async fn delete_subject(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(subject_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_any(&user, SUBJECT_WRITE)?;
    let mut conn = state.db.get()?;
    let current = subject_service::get_subject(&mut conn, subject_id)?;
    ensure_in_department(&user, SUBJECT_WRITE, current.department_id)?;
    subject_service::delete_subject(&mut conn, subject_id)?;
    Ok(ApiResponse::ok("Subject deleted successfully", Deleted { id: subject_id }))
}
