use axum::{extract::State, Extension};

use crate::api::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::auth::ensure_any;
use crate::auth::roles::PEOPLE_WRITE;
use crate::error::AppResult;
use crate::models::{RoleEntry, User, UserRole};
use crate::response::{ApiResponse, Deleted};
use crate::services::role_service::{self, AssignRoleRequest, NewRoleRequest, UserRoleFilter};
use crate::AppState;

pub async fn list_roles(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<RoleEntry>>> {
    let mut conn = state.db.get()?;
    let roles = role_service::list_roles(&mut conn)?;
    Ok(ApiResponse::ok("Roles retrieved successfully", roles))
}

pub async fn create_role(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<NewRoleRequest>,
) -> AppResult<ApiResponse<RoleEntry>> {
    ensure_any(&user, PEOPLE_WRITE)?;
    let mut conn = state.db.get()?;
    let role = role_service::create_role(&mut conn, &req)?;
    Ok(ApiResponse::created("Role created successfully", role))
}

pub async fn delete_role(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(role_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_any(&user, PEOPLE_WRITE)?;
    let mut conn = state.db.get()?;
    role_service::delete_role(&mut conn, role_id)?;
    Ok(ApiResponse::ok("Role deleted successfully", Deleted { id: role_id }))
}

pub async fn list_user_roles(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<UserRoleFilter>,
) -> AppResult<ApiResponse<Vec<UserRole>>> {
    let mut conn = state.db.get()?;
    let assignments = role_service::list_user_roles(&mut conn, &filter)?;
    Ok(ApiResponse::ok("User roles retrieved successfully", assignments))
}

pub async fn assign_role(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<AssignRoleRequest>,
) -> AppResult<ApiResponse<UserRole>> {
    ensure_any(&user, PEOPLE_WRITE)?;
    let mut conn = state.db.get()?;
    let assignment = role_service::assign_role(&mut conn, &req)?;
    Ok(ApiResponse::created("Role assigned successfully", assignment))
}

pub async fn remove_user_role(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(assignment_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_any(&user, PEOPLE_WRITE)?;
    let mut conn = state.db.get()?;
    role_service::remove_user_role(&mut conn, assignment_id)?;
    Ok(ApiResponse::ok("Role removed successfully", Deleted { id: assignment_id }))
}
