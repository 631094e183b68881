use axum::{extract::State, Extension};

use crate::api::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::auth::ensure_any;
use crate::auth::roles::TIMETABLE_WRITE;
use crate::error::AppResult;
use crate::models::{NewTimeSlot, TimeSlot, UpdateTimeSlot, User};
use crate::response::{ApiResponse, Deleted};
use crate::services::time_slot_service::{self, TimeSlotFilter};
use crate::AppState;

pub async fn list_time_slots(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<TimeSlotFilter>,
) -> AppResult<ApiResponse<Vec<TimeSlot>>> {
    let mut conn = state.db.get()?;
    let slots = time_slot_service::list_time_slots(&mut conn, &filter)?;
    Ok(ApiResponse::ok("Time slots retrieved successfully", slots))
}

pub async fn get_time_slot(
    State(state): State<AppState>,
    ApiPath(slot_id): ApiPath<i32>,
) -> AppResult<ApiResponse<TimeSlot>> {
    let mut conn = state.db.get()?;
    let slot = time_slot_service::get_time_slot(&mut conn, slot_id)?;
    Ok(ApiResponse::ok("Time slot retrieved successfully", slot))
}

pub async fn create_time_slot(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<NewTimeSlot>,
) -> AppResult<ApiResponse<TimeSlot>> {
    ensure_any(&user, TIMETABLE_WRITE)?;
    let mut conn = state.db.get()?;
    let slot = time_slot_service::create_time_slot(&mut conn, &req)?;
    Ok(ApiResponse::created("Time slot created successfully", slot))
}

pub async fn update_time_slot(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(slot_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<UpdateTimeSlot>,
) -> AppResult<ApiResponse<TimeSlot>> {
    ensure_any(&user, TIMETABLE_WRITE)?;
    let mut conn = state.db.get()?;
    let slot = time_slot_service::update_time_slot(&mut conn, slot_id, &req)?;
    Ok(ApiResponse::ok("Time slot updated successfully", slot))
}

pub async fn delete_time_slot(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(slot_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_any(&user, TIMETABLE_WRITE)?;
    let mut conn = state.db.get()?;
    time_slot_service::delete_time_slot(&mut conn, slot_id)?;
    Ok(ApiResponse::ok("Time slot deleted successfully", Deleted { id: slot_id }))
}
