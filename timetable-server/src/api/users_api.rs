use axum::{extract::State, Extension};

use crate::api::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::response::{ApiResponse, Deleted};
use crate::services::user_service::{self, CreateUserRequest, UpdateUserRequest, UserFilter};
use crate::AppState;

fn require_admin(user: &User) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Administrator access required".to_string()))
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiQuery(filter): ApiQuery<UserFilter>,
) -> AppResult<ApiResponse<Vec<User>>> {
    require_admin(&user)?;
    let mut conn = state.db.get()?;
    let users = user_service::list_users(&mut conn, &filter)?;
    Ok(ApiResponse::ok("Users retrieved successfully", users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(user_id): ApiPath<i32>,
) -> AppResult<ApiResponse<User>> {
    require_admin(&user)?;
    let mut conn = state.db.get()?;
    let found = user_service::get_user(&mut conn, user_id)?;
    Ok(ApiResponse::ok("User retrieved successfully", found))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> AppResult<ApiResponse<User>> {
    require_admin(&user)?;
    let pool = state.db.clone();
    let cost = state.config.jwt.bcrypt_cost;
    let created = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        user_service::create_user(&mut conn, &req, cost)
    })
    .await??;
    tracing::info!("Admin {} created user {}", user.id, created.id);
    Ok(ApiResponse::created("User created successfully", created))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(user_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> AppResult<ApiResponse<User>> {
    require_admin(&user)?;
    let pool = state.db.clone();
    let cost = state.config.jwt.bcrypt_cost;
    let updated = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        user_service::update_user(&mut conn, user_id, &req, cost)
    })
    .await??;
    Ok(ApiResponse::ok("User updated successfully", updated))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(user_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    require_admin(&user)?;
    let mut conn = state.db.get()?;
    user_service::delete_user(&mut conn, user_id)?;
    tracing::info!("Admin {} deleted user {}", user.id, user_id);
    Ok(ApiResponse::ok("User deleted successfully", Deleted { id: user_id }))
}
