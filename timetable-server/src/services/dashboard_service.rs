use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::error::AppResult;
use crate::schema::{classes, room, subjects, teacher_profile, time_slots, timetable_entries};

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub teachers: i64,
    pub rooms: i64,
    pub subjects: i64,
    pub classes: i64,
    pub time_slots: i64,
    pub timetable_entries: i64,
}

pub fn stats(conn: &mut SqliteConnection) -> AppResult<DashboardStats> {
    Ok(DashboardStats {
        teachers: teacher_profile::table.count().get_result(conn)?,
        rooms: room::table.count().get_result(conn)?,
        subjects: subjects::table.count().get_result(conn)?,
        classes: classes::table.count().get_result(conn)?,
        time_slots: time_slots::table.count().get_result(conn)?,
        timetable_entries: timetable_entries::table.count().get_result(conn)?,
    })
}
