use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{NewRoom, Room, RoomType, UpdateRoom};
use crate::schema::room;

#[derive(Debug, Default, Deserialize)]
pub struct RoomFilter {
    pub department_id: Option<i32>,
    pub room_type: Option<RoomType>,
    pub min_capacity: Option<i32>,
}

pub fn list_rooms(conn: &mut SqliteConnection, filter: &RoomFilter) -> AppResult<Vec<Room>> {
    let mut query = room::table.select(Room::as_select()).into_boxed();

    if let Some(dept) = filter.department_id {
        query = query.filter(room::department_id.eq(dept));
    }
    if let Some(kind) = filter.room_type {
        query = query.filter(room::room_type.eq(kind));
    }
    if let Some(cap) = filter.min_capacity {
        query = query.filter(room::capacity.ge(cap));
    }

    Ok(query.order(room::id.asc()).load(conn)?)
}

pub fn get_room(conn: &mut SqliteConnection, room_id: i32) -> AppResult<Room> {
    room::table
        .find(room_id)
        .select(Room::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Room"))
}

pub fn create_room(conn: &mut SqliteConnection, new: &NewRoom) -> AppResult<Room> {
    Ok(diesel::insert_into(room::table)
        .values(new)
        .returning(Room::as_returning())
        .get_result(conn)?)
}

pub fn update_room(
    conn: &mut SqliteConnection,
    room_id: i32,
    changes: &UpdateRoom,
) -> AppResult<Room> {
    diesel::update(room::table.find(room_id))
        .set(changes)
        .returning(Room::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Room"))
}

pub fn delete_room(conn: &mut SqliteConnection, room_id: i32) -> AppResult<()> {
    let deleted = diesel::delete(room::table.find(room_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("Room"));
    }
    Ok(())
}
