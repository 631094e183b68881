use axum::{extract::State, Extension};

use crate::api::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::auth::{ensure_any, ensure_in_department};
use crate::auth::roles::CLASS_WRITE;
use crate::error::AppResult;
use crate::models::{Class, NewClass, UpdateClass, User};
use crate::response::{ApiResponse, Deleted};
use crate::services::class_service::{self, ClassFilter};
use crate::AppState;

pub async fn list_classes(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ClassFilter>,
) -> AppResult<ApiResponse<Vec<Class>>> {
    let mut conn = state.db.get()?;
    let classes = class_service::list_classes(&mut conn, &filter)?;
    Ok(ApiResponse::ok("Classes retrieved successfully", classes))
}

pub async fn get_class(
    State(state): State<AppState>,
    ApiPath(class_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Class>> {
    let mut conn = state.db.get()?;
    let class = class_service::get_class(&mut conn, class_id)?;
    Ok(ApiResponse::ok("Class retrieved successfully", class))
}

pub async fn create_class(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<NewClass>,
) -> AppResult<ApiResponse<Class>> {
    ensure_in_department(&user, CLASS_WRITE, req.department_id)?;
    let mut conn = state.db.get()?;
    let class = class_service::create_class(&mut conn, &req)?;
    Ok(ApiResponse::created("Class created successfully", class))
}

pub async fn update_class(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(class_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<UpdateClass>,
) -> AppResult<ApiResponse<Class>> {
    ensure_any(&user, CLASS_WRITE)?;
    let mut conn = state.db.get()?;
    let current = class_service::get_class(&mut conn, class_id)?;
    ensure_in_department(&user, CLASS_WRITE, current.department_id)?;
    if let Some(target) = req.department_id {
        ensure_in_department(&user, CLASS_WRITE, target)?;
    }
    let class = class_service::update_class(&mut conn, class_id, &req)?;
    Ok(ApiResponse::ok("Class updated successfully", class))
}

pub async fn delete_class(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(class_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_any(&user, CLASS_WRITE)?;
    let mut conn = state.db.get()?;
    let current = class_service::get_class(&mut conn, class_id)?;
    ensure_in_department(&user, CLASS_WRITE, current.department_id)?;
    class_service::delete_class(&mut conn, class_id)?;
    Ok(ApiResponse::ok("Class deleted successfully", Deleted { id: class_id }))
}
