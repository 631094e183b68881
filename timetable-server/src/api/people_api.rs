//! Student, HOD and timetable-coordinator profiles. Writes are admin-only.

use axum::{extract::State, Extension};

use crate::api::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::auth::ensure_any;
use crate::auth::roles::PEOPLE_WRITE;
use crate::error::AppResult;
use crate::models::{
    Coordinator, CoordinatorPayload, HodPayload, HodProfile, Student, StudentPayload, User,
};
use crate::response::{ApiResponse, Deleted};
use crate::services::people_service::{self, StaffFilter, StudentFilter};
use crate::AppState;

pub async fn list_students(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<StudentFilter>,
) -> AppResult<ApiResponse<Vec<Student>>> {
    let mut conn = state.db.get()?;
    let students = people_service::list_students(&mut conn, &filter)?;
    Ok(ApiResponse::ok("Students retrieved successfully", students))
}

pub async fn get_student(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Student>> {
    let mut conn = state.db.get()?;
    let student = people_service::get_student(&mut conn, student_id)?;
    Ok(ApiResponse::ok("Student retrieved successfully", student))
}

pub async fn create_student(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<StudentPayload>,
) -> AppResult<ApiResponse<Student>> {
    ensure_any(&user, PEOPLE_WRITE)?;
    let mut conn = state.db.get()?;
    let student = people_service::create_student(&mut conn, &req)?;
    Ok(ApiResponse::created("Student created successfully", student))
}

pub async fn update_student(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(student_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<StudentPayload>,
) -> AppResult<ApiResponse<Student>> {
    ensure_any(&user, PEOPLE_WRITE)?;
    let mut conn = state.db.get()?;
    let student = people_service::update_student(&mut conn, student_id, &req)?;
    Ok(ApiResponse::ok("Student updated successfully", student))
}

pub async fn delete_student(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(student_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_any(&user, PEOPLE_WRITE)?;
    let mut conn = state.db.get()?;
    people_service::delete_student(&mut conn, student_id)?;
    Ok(ApiResponse::ok("Student deleted successfully", Deleted { id: student_id }))
}

pub async fn list_hods(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<StaffFilter>,
) -> AppResult<ApiResponse<Vec<HodProfile>>> {
    let mut conn = state.db.get()?;
    let hods = people_service::list_hods(&mut conn, &filter)?;
    Ok(ApiResponse::ok("HODs retrieved successfully", hods))
}

pub async fn get_hod(
    State(state): State<AppState>,
    ApiPath(hod_id): ApiPath<i32>,
) -> AppResult<ApiResponse<HodProfile>> {
    let mut conn = state.db.get()?;
    let hod = people_service::get_hod(&mut conn, hod_id)?;
    Ok(ApiResponse::ok("HOD retrieved successfully", hod))
}

pub async fn create_hod(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<HodPayload>,
) -> AppResult<ApiResponse<HodProfile>> {
    ensure_any(&user, PEOPLE_WRITE)?;
    let mut conn = state.db.get()?;
    let hod = people_service::create_hod(&mut conn, &req)?;
    Ok(ApiResponse::created("HOD created successfully", hod))
}

pub async fn update_hod(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(hod_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<HodPayload>,
) -> AppResult<ApiResponse<HodProfile>> {
    ensure_any(&user, PEOPLE_WRITE)?;
    let mut conn = state.db.get()?;
    let hod = people_service::update_hod(&mut conn, hod_id, &req)?;
    Ok(ApiResponse::ok("HOD updated successfully", hod))
}

pub async fn delete_hod(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(hod_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_any(&user, PEOPLE_WRITE)?;
    let mut conn = state.db.get()?;
    people_service::delete_hod(&mut conn, hod_id)?;
    Ok(ApiResponse::ok("HOD deleted successfully", Deleted { id: hod_id }))
}

pub async fn list_coordinators(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<StaffFilter>,
) -> AppResult<ApiResponse<Vec<Coordinator>>> {
    let mut conn = state.db.get()?;
    let coordinators = people_service::list_coordinators(&mut conn, &filter)?;
    Ok(ApiResponse::ok("Coordinators retrieved successfully", coordinators))
}

pub async fn get_coordinator(
    State(state): State<AppState>,
    ApiPath(coordinator_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Coordinator>> {
    let mut conn = state.db.get()?;
    let coordinator = people_service::get_coordinator(&mut conn, coordinator_id)?;
    Ok(ApiResponse::ok("Coordinator retrieved successfully", coordinator))
}

pub async fn create_coordinator(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<CoordinatorPayload>,
) -> AppResult<ApiResponse<Coordinator>> {
    ensure_any(&user, PEOPLE_WRITE)?;
    let mut conn = state.db.get()?;
    let coordinator = people_service::create_coordinator(&mut conn, &req)?;
    Ok(ApiResponse::created("Coordinator created successfully", coordinator))
}

pub async fn update_coordinator(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(coordinator_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<CoordinatorPayload>,
) -> AppResult<ApiResponse<Coordinator>> {
    ensure_any(&user, PEOPLE_WRITE)?;
    let mut conn = state.db.get()?;
    let coordinator = people_service::update_coordinator(&mut conn, coordinator_id, &req)?;
    Ok(ApiResponse::ok("Coordinator updated successfully", coordinator))
}

pub async fn delete_coordinator(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(coordinator_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_any(&user, PEOPLE_WRITE)?;
    let mut conn = state.db.get()?;
    people_service::delete_coordinator(&mut conn, coordinator_id)?;
    Ok(ApiResponse::ok(
        "Coordinator deleted successfully",
        Deleted { id: coordinator_id },
    ))
}
