use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{NewTeacher, Teacher, UpdateTeacher};
use crate::schema::teacher_profile;

#[derive(Debug, Default, Deserialize)]
pub struct TeacherFilter {
    pub department_id: Option<i32>,
    pub user_id: Option<String>,
    pub designation: Option<String>,
}

pub fn list_teachers(
    conn: &mut SqliteConnection,
    filter: &TeacherFilter,
) -> AppResult<Vec<Teacher>> {
    let mut query = teacher_profile::table
        .select(Teacher::as_select())
        .into_boxed();

    if let Some(dept) = filter.department_id {
        query = query.filter(teacher_profile::department_id.eq(dept));
    }
    if let Some(uid) = &filter.user_id {
        query = query.filter(teacher_profile::user_id.eq(uid.clone()));
    }
    if let Some(designation) = &filter.designation {
        query = query.filter(teacher_profile::designation.eq(designation.clone()));
    }

    Ok(query.order(teacher_profile::id.asc()).load(conn)?)
}

pub fn get_teacher(conn: &mut SqliteConnection, teacher_id: i32) -> AppResult<Teacher> {
    teacher_profile::table
        .find(teacher_id)
        .select(Teacher::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Teacher"))
}

pub fn create_teacher(conn: &mut SqliteConnection, new: &NewTeacher) -> AppResult<Teacher> {
    Ok(diesel::insert_into(teacher_profile::table)
        .values(new)
        .returning(Teacher::as_returning())
        .get_result(conn)?)
}

pub fn update_teacher(
    conn: &mut SqliteConnection,
    teacher_id: i32,
    changes: &UpdateTeacher,
) -> AppResult<Teacher> {
    diesel::update(teacher_profile::table.find(teacher_id))
        .set(changes)
        .returning(Teacher::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Teacher"))
}

pub fn delete_teacher(conn: &mut SqliteConnection, teacher_id: i32) -> AppResult<()> {
    let deleted = diesel::delete(teacher_profile::table.find(teacher_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("Teacher"));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn sample_teacher(emp_id: &str, department_id: Option<i32>) -> NewTeacher {
    NewTeacher {
        user_id: None,
        emp_id: emp_id.to_string(),
        first_name: Some("Grace".into()),
        last_name: Some(emp_id.to_string()),
        name: None,
        email: format!("{}@uni.edu", emp_id.to_ascii_lowercase()),
        phone: None,
        designation: Some("Assistant Professor".into()),
        max_hours: Some(18),
        bio: None,
        department_id,
    }
}
