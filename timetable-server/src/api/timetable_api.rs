use axum::{extract::State, Extension};
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::auth::{ensure_any, ensure_in_department};
use crate::auth::roles::{TIMETABLE_GENERATE, TIMETABLE_WRITE};
use crate::error::AppResult;
use crate::models::{NewTimetableEntry, TimetableEntry, UpdateTimetableEntry, User};
use crate::response::{ApiResponse, Deleted};
use crate::services::class_service;
use crate::services::generation::payload::TimetablePayload;
use crate::services::generation::{self, GenerateRequest, GenerationReport};
use crate::services::timetable_service::{self, EntryFilter, EntryView};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct EntryBatch {
    #[validate(length(min = 1, message = "At least one entry is required"))]
    pub entries: Vec<NewTimetableEntry>,
}

#[derive(Debug, Serialize)]
pub struct Cleared {
    pub class_id: i32,
    pub removed: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayloadQuery {
    pub department_id: Option<i32>,
    pub class_id: Option<i32>,
}

/// Entries are scoped by their class's department.
fn ensure_classes_in_scope(
    conn: &mut SqliteConnection,
    user: &User,
    class_ids: impl IntoIterator<Item = i32>,
) -> AppResult<()> {
    let mut checked: Vec<i32> = Vec::new();
    for class_id in class_ids {
        if checked.contains(&class_id) {
            continue;
        }
        let class = class_service::get_class(conn, class_id)?;
        ensure_in_department(user, TIMETABLE_WRITE, class.department_id)?;
        checked.push(class_id);
    }
    Ok(())
}

pub async fn list_entries(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<EntryFilter>,
) -> AppResult<ApiResponse<Vec<EntryView>>> {
    let mut conn = state.db.get()?;
    let entries = timetable_service::list_entries(&mut conn, &filter)?;
    Ok(ApiResponse::ok("Timetable entries retrieved successfully", entries))
}

pub async fn get_entry(
    State(state): State<AppState>,
    ApiPath(entry_id): ApiPath<i32>,
) -> AppResult<ApiResponse<TimetableEntry>> {
    let mut conn = state.db.get()?;
    let entry = timetable_service::get_entry(&mut conn, entry_id)?;
    Ok(ApiResponse::ok("Timetable entry retrieved successfully", entry))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<NewTimetableEntry>,
) -> AppResult<ApiResponse<TimetableEntry>> {
    ensure_any(&user, TIMETABLE_WRITE)?;
    let mut conn = state.db.get()?;
    ensure_classes_in_scope(&mut conn, &user, [req.class_id])?;
    let entry = timetable_service::create_entry(&mut conn, &req)?;
    Ok(ApiResponse::created("Timetable entry created successfully", entry))
}

/// All or nothing.
pub async fn create_entries(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<EntryBatch>,
) -> AppResult<ApiResponse<Vec<TimetableEntry>>> {
    ensure_any(&user, TIMETABLE_WRITE)?;
    let mut conn = state.db.get()?;
    ensure_classes_in_scope(&mut conn, &user, req.entries.iter().map(|e| e.class_id))?;
    let entries = timetable_service::create_entries(&mut conn, &req.entries)?;
    Ok(ApiResponse::created("Timetable entries created successfully", entries))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(entry_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<UpdateTimetableEntry>,
) -> AppResult<ApiResponse<TimetableEntry>> {
    ensure_any(&user, TIMETABLE_WRITE)?;
    let mut conn = state.db.get()?;
    let current = timetable_service::get_entry(&mut conn, entry_id)?;
    let touched = std::iter::once(current.class_id).chain(req.class_id);
    ensure_classes_in_scope(&mut conn, &user, touched)?;
    let entry = timetable_service::update_entry(&mut conn, entry_id, &req)?;
    Ok(ApiResponse::ok("Timetable entry updated successfully", entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(entry_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_any(&user, TIMETABLE_WRITE)?;
    let mut conn = state.db.get()?;
    let current = timetable_service::get_entry(&mut conn, entry_id)?;
    ensure_classes_in_scope(&mut conn, &user, [current.class_id])?;
    timetable_service::delete_entry(&mut conn, entry_id)?;
    Ok(ApiResponse::ok("Timetable entry deleted successfully", Deleted { id: entry_id }))
}

pub async fn clear_class(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(class_id): ApiPath<i32>,
) -> AppResult<ApiResponse<Cleared>> {
    ensure_any(&user, TIMETABLE_WRITE)?;
    let mut conn = state.db.get()?;
    ensure_classes_in_scope(&mut conn, &user, [class_id])?;
    let removed = timetable_service::clear_class(&mut conn, class_id)?;
    Ok(ApiResponse::ok(
        "Timetable cleared successfully",
        Cleared { class_id, removed },
    ))
}

pub async fn replace_class(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiPath(class_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<EntryBatch>,
) -> AppResult<ApiResponse<Vec<TimetableEntry>>> {
    ensure_any(&user, TIMETABLE_WRITE)?;
    let mut conn = state.db.get()?;
    let touched = std::iter::once(class_id).chain(req.entries.iter().map(|e| e.class_id));
    ensure_classes_in_scope(&mut conn, &user, touched)?;
    let entries = timetable_service::replace_for_classes(&mut conn, &[class_id], &req.entries)?;
    Ok(ApiResponse::ok("Timetable replaced successfully", entries))
}

pub async fn generate(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(req): ValidatedJson<GenerateRequest>,
) -> AppResult<ApiResponse<GenerationReport>> {
    ensure_in_department(&user, TIMETABLE_GENERATE, req.department_id)?;
    tracing::info!(
        "User {} requested timetable generation (department {:?}, class {:?})",
        user.id,
        req.department_id,
        req.class_id
    );
    let report = generation::generate_timetable(&state.db, &state.generator, &req).await?;
    let message = if report.persisted {
        "Timetable generated and saved successfully"
    } else {
        "Timetable generated successfully"
    };
    Ok(ApiResponse::ok(message, report))
}

pub async fn preview_payload(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiQuery(query): ApiQuery<PayloadQuery>,
) -> AppResult<ApiResponse<TimetablePayload>> {
    ensure_in_department(&user, TIMETABLE_GENERATE, query.department_id)?;
    let mut conn = state.db.get()?;
    let payload = generation::preview_payload(
        &mut conn,
        &GenerateRequest {
            department_id: query.department_id,
            class_id: query.class_id,
            ..Default::default()
        },
    )?;
    Ok(ApiResponse::ok("Generator payload assembled successfully", payload))
}
