use axum::{extract::State, Extension};

use crate::api::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::auth::{ensure_any, ensure_in_department};
use crate::auth::roles::TEACHER_WRITE;
use crate::error::AppResult;
use crate::models::{NewTeacher, Teacher, UpdateTeacher, User};
use crate::response::{ApiResponse, Deleted};
use crate::services::teacher_service::{self, TeacherFilter};
use crate::AppState;

pub async fn list_teachers(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<TeacherFilter>,
) -> AppResult<ApiResponse<Vec<Teacher>>> {
    let mut conn = state.db.get()?;
    let teachers = teacher_service::list_teachers(&mut conn, &filter)?;
    Ok(ApiResponse::ok("Teachers retrieved successfully", teachers))
}

pub async fn get_teacher(
    State(state): State<AppState>,
    ApiPath(teacher_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Teacher>> {
    let mut conn = state.db.get()?;
    let teacher = teacher_service::get_teacher(&mut conn, teacher_id)?;
    Ok(ApiResponse::ok("Teacher retrieved successfully", teacher))
}

pub async fn create_teacher(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<NewTeacher>,
) -> AppResult<ApiResponse<Teacher>> {
    ensure_in_department(&user, TEACHER_WRITE, req.department_id)?;
    let mut conn = state.db.get()?;
    let teacher = teacher_service::create_teacher(&mut conn, &req)?;
    Ok(ApiResponse::created("Teacher created successfully", teacher))
}

pub async fn update_teacher(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(teacher_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<UpdateTeacher>,
) -> AppResult<ApiResponse<Teacher>> {
    ensure_any(&user, TEACHER_WRITE)?;
    let mut conn = state.db.get()?;
    let current = teacher_service::get_teacher(&mut conn, teacher_id)?;
    ensure_in_department(&user, TEACHER_WRITE, current.department_id)?;
    if let Some(target) = req.department_id {
        ensure_in_department(&user, TEACHER_WRITE, target)?;
    }
    let teacher = teacher_service::update_teacher(&mut conn, teacher_id, &req)?;
    Ok(ApiResponse::ok("Teacher updated successfully", teacher))
}

pub async fn delete_teacher(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(teacher_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_any(&user, TEACHER_WRITE)?;
    let mut conn = state.db.get()?;
    let current = teacher_service::get_teacher(&mut conn, teacher_id)?;
    ensure_in_department(&user, TEACHER_WRITE, current.department_id)?;
    teacher_service::delete_teacher(&mut conn, teacher_id)?;
    Ok(ApiResponse::ok("Teacher deleted successfully", Deleted { id: teacher_id }))
}
