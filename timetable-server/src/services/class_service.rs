use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{Class, NewClass, UpdateClass};
use crate::schema::classes;

#[derive(Debug, Default, Deserialize)]
pub struct ClassFilter {
    pub department_id: Option<i32>,
    pub semester: Option<i32>,
}

pub fn list_classes(conn: &mut SqliteConnection, filter: &ClassFilter) -> AppResult<Vec<Class>> {
    let mut query = classes::table.select(Class::as_select()).into_boxed();

    if let Some(dept) = filter.department_id {
        query = query.filter(classes::department_id.eq(dept));
    }
    if let Some(sem) = filter.semester {
        query = query.filter(classes::semester.eq(sem));
    }

    Ok(query.order(classes::id.asc()).load(conn)?)
}

pub fn get_class(conn: &mut SqliteConnection, class_id: i32) -> AppResult<Class> {
    classes::table
        .find(class_id)
        .select(Class::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Class"))
}

pub fn create_class(conn: &mut SqliteConnection, new: &NewClass) -> AppResult<Class> {
    Ok(diesel::insert_into(classes::table)
        .values(new)
        .returning(Class::as_returning())
        .get_result(conn)?)
}

pub fn update_class(
    conn: &mut SqliteConnection,
    class_id: i32,
    changes: &UpdateClass,
) -> AppResult<Class> {
    diesel::update(classes::table.find(class_id))
        .set(changes)
        .returning(Class::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Class"))
}

pub fn delete_class(conn: &mut SqliteConnection, class_id: i32) -> AppResult<()> {
    let deleted = diesel::delete(classes::table.find(class_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("Class"));
    }
    Ok(())
}
