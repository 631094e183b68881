use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{NewUserRole, RoleEntry, UserRole};
use crate::schema::{roles, user_roles};

#[derive(Debug, Deserialize, Validate)]
pub struct NewRoleRequest {
    #[validate(length(min = 1, max = 64, message = "Role name must be 1-64 characters"))]
    pub role_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignRoleRequest {
    #[validate(length(min = 1, message = "User id is required"))]
    pub user_id: String,
    pub role_id: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserRoleFilter {
    pub user_id: Option<String>,
    pub role_id: Option<i32>,
}

pub fn list_roles(conn: &mut SqliteConnection) -> AppResult<Vec<RoleEntry>> {
    Ok(roles::table
        .select(RoleEntry::as_select())
        .order(roles::id.asc())
        .load(conn)?)
}

pub fn create_role(conn: &mut SqliteConnection, req: &NewRoleRequest) -> AppResult<RoleEntry> {
    Ok(diesel::insert_into(roles::table)
        .values(roles::role_name.eq(req.role_name.trim().to_ascii_lowercase()))
        .returning(RoleEntry::as_returning())
        .get_result(conn)?)
}

pub fn delete_role(conn: &mut SqliteConnection, role_id: i32) -> AppResult<()> {
    let deleted = diesel::delete(roles::table.find(role_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("Role"));
    }
    Ok(())
}

pub fn list_user_roles(
    conn: &mut SqliteConnection,
    filter: &UserRoleFilter,
) -> AppResult<Vec<UserRole>> {
    let mut query = user_roles::table.select(UserRole::as_select()).into_boxed();
    if let Some(uid) = &filter.user_id {
        query = query.filter(user_roles::user_id.eq(uid.clone()));
    }
    if let Some(rid) = filter.role_id {
        query = query.filter(user_roles::role_id.eq(rid));
    }
    Ok(query.order(user_roles::id.asc()).load(conn)?)
}

pub fn assign_role(conn: &mut SqliteConnection, req: &AssignRoleRequest) -> AppResult<UserRole> {
    Ok(diesel::insert_into(user_roles::table)
        .values(&NewUserRole {
            user_id: req.user_id.clone(),
            role_id: req.role_id,
        })
        .returning(UserRole::as_returning())
        .get_result(conn)?)
}

pub fn remove_user_role(conn: &mut SqliteConnection, assignment_id: i32) -> AppResult<()> {
    let deleted = diesel::delete(user_roles::table.find(assignment_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("Role assignment"));
    }
    Ok(())
}
