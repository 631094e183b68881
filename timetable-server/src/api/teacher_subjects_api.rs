use axum::{extract::State, Extension};
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::auth::{ensure_any, ensure_in_department};
use crate::auth::roles::{CLASS_WRITE, TEACHER_WRITE};
use crate::error::AppResult;
use crate::models::{
    NewTeacherSubject, TeacherPerClass, TeacherPerClassPayload, TeacherSubject,
    UpdateTeacherSubject, User,
};
use crate::response::{ApiResponse, Deleted};
use crate::services::{class_service, teacher_service};
use crate::services::teacher_subject_service::{
    self, TeacherPerClassFilter, TeacherSubjectFilter, TeacherSubjectView,
};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceSubjectsRequest {
    pub subject_ids: Vec<i32>,
}

/// Links are scoped by their teacher's department.
fn ensure_teacher_in_scope(
    conn: &mut SqliteConnection,
    user: &User,
    teacher_id: i32,
) -> AppResult<()> {
    let teacher = teacher_service::get_teacher(conn, teacher_id)?;
    ensure_in_department(user, TEACHER_WRITE, teacher.department_id)
}

/// A class assignment belongs to its class's department, or to its own
/// `department_id` when no class is set.
fn ensure_assignment_in_scope(
    conn: &mut SqliteConnection,
    user: &User,
    class_id: Option<i32>,
    department_id: Option<i32>,
) -> AppResult<()> {
    let department = match class_id {
        Some(id) => class_service::get_class(conn, id)?.department_id,
        None => department_id,
    };
    ensure_in_department(user, CLASS_WRITE, department)?;
    if class_id.is_some() && department_id.is_some() {
        ensure_in_department(user, CLASS_WRITE, department_id)?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct PairDeleted {
    pub teacher_id: i32,
    pub subject_id: i32,
    pub removed: usize,
}

pub async fn list_teacher_subjects(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<TeacherSubjectFilter>,
) -> AppResult<ApiResponse<Vec<TeacherSubjectView>>> {
    let mut conn = state.db.get()?;
    let links = teacher_subject_service::list_teacher_subjects(&mut conn, &filter)?;
    Ok(ApiResponse::ok("Teacher subjects retrieved successfully", links))
}

pub async fn create_teacher_subject(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<NewTeacherSubject>,
) -> AppResult<ApiResponse<TeacherSubject>> {
    ensure_any(&user, TEACHER_WRITE)?;
    let mut conn = state.db.get()?;
    ensure_teacher_in_scope(&mut conn, &user, req.teacher_id)?;
    let link = teacher_subject_service::create_teacher_subject(&mut conn, &req)?;
    Ok(ApiResponse::created("Teacher subject created successfully", link))
}

pub async fn update_teacher_subject(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(link_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<UpdateTeacherSubject>,
) -> AppResult<ApiResponse<TeacherSubject>> {
    ensure_any(&user, TEACHER_WRITE)?;
    let mut conn = state.db.get()?;
    let current = teacher_subject_service::get_teacher_subject(&mut conn, link_id)?;
    ensure_teacher_in_scope(&mut conn, &user, current.teacher_id)?;
    if let Some(teacher_id) = req.teacher_id {
        ensure_teacher_in_scope(&mut conn, &user, teacher_id)?;
    }
    let link = teacher_subject_service::update_teacher_subject(&mut conn, link_id, &req)?;
    Ok(ApiResponse::ok("Teacher subject updated successfully", link))
}

pub async fn delete_teacher_subject(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(link_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_any(&user, TEACHER_WRITE)?;
    let mut conn = state.db.get()?;
    let current = teacher_subject_service::get_teacher_subject(&mut conn, link_id)?;
    ensure_teacher_in_scope(&mut conn, &user, current.teacher_id)?;
    teacher_subject_service::delete_teacher_subject(&mut conn, link_id)?;
    Ok(ApiResponse::ok("Teacher subject deleted successfully", Deleted { id: link_id }))
}

/// Removes exactly the links matching the teacher + subject pair.
pub async fn delete_teacher_subject_pair(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath((teacher_id, subject_id)): ApiPath<(i32, i32)>,
) -> AppResult<ApiResponse<PairDeleted>> {
    ensure_any(&user, TEACHER_WRITE)?;
    let mut conn = state.db.get()?;
    ensure_teacher_in_scope(&mut conn, &user, teacher_id)?;
    let removed =
        teacher_subject_service::delete_teacher_subject_pair(&mut conn, teacher_id, subject_id)?;
    Ok(ApiResponse::ok(
        "Teacher subject deleted successfully",
        PairDeleted {
            teacher_id,
            subject_id,
            removed,
        },
    ))
}

pub async fn replace_teacher_subjects(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(teacher_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<ReplaceSubjectsRequest>,
) -> AppResult<ApiResponse<Vec<TeacherSubject>>> {
    ensure_any(&user, TEACHER_WRITE)?;
    let mut conn = state.db.get()?;
    // 404 rather than an FK error for an unknown teacher
    ensure_teacher_in_scope(&mut conn, &user, teacher_id)?;
    let links =
        teacher_subject_service::replace_teacher_subjects(&mut conn, teacher_id, &req.subject_ids)?;
    Ok(ApiResponse::ok("Teacher subjects replaced successfully", links))
}

pub async fn list_teacher_per_class(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<TeacherPerClassFilter>,
) -> AppResult<ApiResponse<Vec<TeacherPerClass>>> {
    let mut conn = state.db.get()?;
    let rows = teacher_subject_service::list_teacher_per_class(&mut conn, &filter)?;
    Ok(ApiResponse::ok("Class assignments retrieved successfully", rows))
}

pub async fn create_teacher_per_class(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<TeacherPerClassPayload>,
) -> AppResult<ApiResponse<TeacherPerClass>> {
    ensure_any(&user, CLASS_WRITE)?;
    let mut conn = state.db.get()?;
    ensure_assignment_in_scope(&mut conn, &user, req.class_id, req.department_id)?;
    let row = teacher_subject_service::create_teacher_per_class(&mut conn, &req)?;
    Ok(ApiResponse::created("Class assignment created successfully", row))
}

pub async fn update_teacher_per_class(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(row_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<TeacherPerClassPayload>,
) -> AppResult<ApiResponse<TeacherPerClass>> {
    ensure_any(&user, CLASS_WRITE)?;
    let mut conn = state.db.get()?;
    let current = teacher_subject_service::get_teacher_per_class(&mut conn, row_id)?;
    ensure_assignment_in_scope(&mut conn, &user, current.class_id, current.department_id)?;
    if req.class_id.is_some() || req.department_id.is_some() {
        ensure_assignment_in_scope(&mut conn, &user, req.class_id, req.department_id)?;
    }
    let row = teacher_subject_service::update_teacher_per_class(&mut conn, row_id, &req)?;
    Ok(ApiResponse::ok("Class assignment updated successfully", row))
}

pub async fn delete_teacher_per_class(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(row_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_any(&user, CLASS_WRITE)?;
    let mut conn = state.db.get()?;
    let current = teacher_subject_service::get_teacher_per_class(&mut conn, row_id)?;
    ensure_assignment_in_scope(&mut conn, &user, current.class_id, current.department_id)?;
    teacher_subject_service::delete_teacher_per_class(&mut conn, row_id)?;
    Ok(ApiResponse::ok("Class assignment deleted successfully", Deleted { id: row_id }))
}
