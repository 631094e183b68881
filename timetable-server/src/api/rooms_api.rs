use axum::{extract::State, Extension};

use crate::api::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::auth::ensure_any;
use crate::auth::roles::ROOM_WRITE;
use crate::error::AppResult;
use crate::models::{NewRoom, Room, UpdateRoom, User};
use crate::response::{ApiResponse, Deleted};
use crate::services::room_service::{self, RoomFilter};
use crate::AppState;

pub async fn list_rooms(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<RoomFilter>,
) -> AppResult<ApiResponse<Vec<Room>>> {
    let mut conn = state.db.get()?;
    let rooms = room_service::list_rooms(&mut conn, &filter)?;
    Ok(ApiResponse::ok("Rooms retrieved successfully", rooms))
}

pub async fn get_room(
    State(state): State<AppState>,
    ApiPath(room_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Room>> {
    let mut conn = state.db.get()?;
    let room = room_service::get_room(&mut conn, room_id)?;
    Ok(ApiResponse::ok("Room retrieved successfully", room))
}

pub async fn create_room(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<NewRoom>,
) -> AppResult<ApiResponse<Room>> {
    ensure_any(&user, ROOM_WRITE)?;
    let mut conn = state.db.get()?;
    let room = room_service::create_room(&mut conn, &req)?;
    Ok(ApiResponse::created("Room created successfully", room))
}

pub async fn update_room(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(room_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<UpdateRoom>,
) -> AppResult<ApiResponse<Room>> {
    ensure_any(&user, ROOM_WRITE)?;
    let mut conn = state.db.get()?;
    let room = room_service::update_room(&mut conn, room_id, &req)?;
    Ok(ApiResponse::ok("Room updated successfully", room))
}

pub async fn delete_room(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(room_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_any(&user, ROOM_WRITE)?;
    let mut conn = state.db.get()?;
    room_service::delete_room(&mut conn, room_id)?;
    Ok(ApiResponse::ok("Room deleted successfully", Deleted { id: room_id }))
}
