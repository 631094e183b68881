//! Student, HOD and timetable-coordinator profiles.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{
    Coordinator, CoordinatorPayload, HodPayload, HodProfile, Student, StudentPayload,
};
use crate::schema::{hod_profile, student_profile, timetable_coordinator_profile};

#[derive(Debug, Default, Deserialize)]
pub struct StudentFilter {
    pub class_id: Option<i32>,
    pub semester: Option<i32>,
    pub user_id: Option<String>,
}

/// Shared by HOD and coordinator listings.
#[derive(Debug, Default, Deserialize)]
pub struct StaffFilter {
    pub department_id: Option<i32>,
    pub teacher_id: Option<i32>,
    pub user_id: Option<String>,
}

// Students

pub fn list_students(
    conn: &mut SqliteConnection,
    filter: &StudentFilter,
) -> AppResult<Vec<Student>> {
    let mut query = student_profile::table
        .select(Student::as_select())
        .into_boxed();

    if let Some(class) = filter.class_id {
        query = query.filter(student_profile::class_id.eq(class));
    }
    if let Some(sem) = filter.semester {
        query = query.filter(student_profile::semester.eq(sem));
    }
    if let Some(uid) = &filter.user_id {
        query = query.filter(student_profile::user_id.eq(uid.clone()));
    }

    Ok(query
        .order((student_profile::class_id.asc(), student_profile::id.asc()))
        .load(conn)?)
}

pub fn get_student(conn: &mut SqliteConnection, student_id: i32) -> AppResult<Student> {
    student_profile::table
        .find(student_id)
        .select(Student::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Student"))
}

pub fn create_student(conn: &mut SqliteConnection, new: &StudentPayload) -> AppResult<Student> {
    Ok(diesel::insert_into(student_profile::table)
        .values(new)
        .returning(Student::as_returning())
        .get_result(conn)?)
}

pub fn update_student(
    conn: &mut SqliteConnection,
    student_id: i32,
    changes: &StudentPayload,
) -> AppResult<Student> {
    diesel::update(student_profile::table.find(student_id))
        .set(changes)
        .returning(Student::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Student"))
}

pub fn delete_student(conn: &mut SqliteConnection, student_id: i32) -> AppResult<()> {
    let deleted = diesel::delete(student_profile::table.find(student_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("Student"));
    }
    Ok(())
}

// Heads of department

pub fn list_hods(conn: &mut SqliteConnection, filter: &StaffFilter) -> AppResult<Vec<HodProfile>> {
    let mut query = hod_profile::table
        .select(HodProfile::as_select())
        .into_boxed();

    if let Some(dept) = filter.department_id {
        query = query.filter(hod_profile::department_id.eq(dept));
    }
    if let Some(teacher) = filter.teacher_id {
        query = query.filter(hod_profile::teacher_id.eq(teacher));
    }
    if let Some(uid) = &filter.user_id {
        query = query.filter(hod_profile::user_id.eq(uid.clone()));
    }

    Ok(query.order(hod_profile::id.asc()).load(conn)?)
}

pub fn get_hod(conn: &mut SqliteConnection, hod_id: i32) -> AppResult<HodProfile> {
    hod_profile::table
        .find(hod_id)
        .select(HodProfile::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("HOD profile"))
}

pub fn create_hod(conn: &mut SqliteConnection, new: &HodPayload) -> AppResult<HodProfile> {
    Ok(diesel::insert_into(hod_profile::table)
        .values(new)
        .returning(HodProfile::as_returning())
        .get_result(conn)?)
}

pub fn update_hod(
    conn: &mut SqliteConnection,
    hod_id: i32,
    changes: &HodPayload,
) -> AppResult<HodProfile> {
    diesel::update(hod_profile::table.find(hod_id))
        .set(changes)
        .returning(HodProfile::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("HOD profile"))
}

pub fn delete_hod(conn: &mut SqliteConnection, hod_id: i32) -> AppResult<()> {
    let deleted = diesel::delete(hod_profile::table.find(hod_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("HOD profile"));
    }
    Ok(())
}

// Timetable coordinators

pub fn list_coordinators(
    conn: &mut SqliteConnection,
    filter: &StaffFilter,
) -> AppResult<Vec<Coordinator>> {
    use timetable_coordinator_profile as tcp;

    let mut query = tcp::table.select(Coordinator::as_select()).into_boxed();

    if let Some(dept) = filter.department_id {
        query = query.filter(tcp::department_id.eq(dept));
    }
    if let Some(teacher) = filter.teacher_id {
        query = query.filter(tcp::teacher_id.eq(teacher));
    }
    if let Some(uid) = &filter.user_id {
        query = query.filter(tcp::user_id.eq(uid.clone()));
    }

    Ok(query.order(tcp::id.asc()).load(conn)?)
}

pub fn get_coordinator(conn: &mut SqliteConnection, coordinator_id: i32) -> AppResult<Coordinator> {
    timetable_coordinator_profile::table
        .find(coordinator_id)
        .select(Coordinator::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Coordinator"))
}

pub fn create_coordinator(
    conn: &mut SqliteConnection,
    new: &CoordinatorPayload,
) -> AppResult<Coordinator> {
    Ok(diesel::insert_into(timetable_coordinator_profile::table)
        .values(new)
        .returning(Coordinator::as_returning())
        .get_result(conn)?)
}

pub fn update_coordinator(
    conn: &mut SqliteConnection,
    coordinator_id: i32,
    changes: &CoordinatorPayload,
) -> AppResult<Coordinator> {
    diesel::update(timetable_coordinator_profile::table.find(coordinator_id))
        .set(changes)
        .returning(Coordinator::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Coordinator"))
}

pub fn delete_coordinator(conn: &mut SqliteConnection, coordinator_id: i32) -> AppResult<()> {
    let deleted =
        diesel::delete(timetable_coordinator_profile::table.find(coordinator_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("Coordinator"));
    }
    Ok(())
}
