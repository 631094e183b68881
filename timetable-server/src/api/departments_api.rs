use axum::{extract::State, Extension};

use crate::api::extract::{ApiPath, ValidatedJson};
use crate::auth::ensure_any;
use crate::auth::roles::DEPARTMENT_WRITE;
use crate::error::AppResult;
use crate::models::{Department, NewDepartment, UpdateDepartment, User};
use crate::response::{ApiResponse, Deleted};
use crate::services::department_service;
use crate::AppState;

pub async fn list_departments(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<Department>>> {
    let mut conn = state.db.get()?;
    let departments = department_service::list_departments(&mut conn)?;
    Ok(ApiResponse::ok("Departments retrieved successfully", departments))
}

pub async fn get_department(
    State(state): State<AppState>,
    ApiPath(dept_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Department>> {
    let mut conn = state.db.get()?;
    let department = department_service::get_department(&mut conn, dept_id)?;
    Ok(ApiResponse::ok("Department retrieved successfully", department))
}

pub async fn create_department(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<NewDepartment>,
) -> AppResult<ApiResponse<Department>> {
    ensure_any(&user, DEPARTMENT_WRITE)?;
    let mut conn = state.db.get()?;
    let department = department_service::create_department(&mut conn, &req)?;
    Ok(ApiResponse::created("Department created successfully", department))
}

pub async fn update_department(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(dept_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<UpdateDepartment>,
) -> AppResult<ApiResponse<Department>> {
    ensure_any(&user, DEPARTMENT_WRITE)?;
    let mut conn = state.db.get()?;
    let department = department_service::update_department(&mut conn, dept_id, &req)?;
    Ok(ApiResponse::ok("Department updated successfully", department))
}

pub async fn delete_department(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(dept_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_any(&user, DEPARTMENT_WRITE)?;
    let mut conn = state.db.get()?;
    department_service::delete_department(&mut conn, dept_id)?;
    Ok(ApiResponse::ok("Department deleted successfully", Deleted { id: dept_id }))
}
