//! Bridge to the external timetable generator: assemble its input from the
//! database, call it, and map the answer back onto timetable entries.

pub mod client;
pub mod mapping;
pub mod payload;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Class, Room, Subject, Teacher, TeacherSubject, TimetableEntry};
use crate::schema::{classes, room, subjects, teacher_profile, teacher_subjects};
use crate::services::time_slot_service::{list_time_slots, TimeSlotFilter};
use crate::services::timetable_service::replace_for_classes;

use self::client::GeneratorClient;
use self::mapping::{find_conflicts, rows_from_response, Conflict};
use self::payload::{assemble_payload, PayloadIndex, Snapshot, SolverSettings, TimetablePayload};

fn default_persist() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateRequest {
    pub department_id: Option<i32>,
    /// Restrict generation (and replacement) to a single class.
    pub class_id: Option<i32>,
    #[serde(default = "default_persist")]
    pub persist: bool,
    #[serde(default)]
    #[validate(nested)]
    pub settings: SolverSettings,
}

impl Default for GenerateRequest {
    fn default() -> Self {
        Self {
            department_id: None,
            class_id: None,
            persist: true,
            settings: SolverSettings::default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerationReport {
    pub fitness_score: Option<f64>,
    pub generation_count: Option<u32>,
    pub persisted: bool,
    pub entries: Vec<TimetableEntry>,
    pub proposed: usize,
    pub free_cells: usize,
    pub skipped_cells: usize,
    pub conflicts: Vec<Conflict>,
}

/// Loads everything the payload needs, scoped to a department and/or class.
pub fn load_snapshot(
    conn: &mut SqliteConnection,
    department_id: Option<i32>,
    class_id: Option<i32>,
) -> AppResult<Snapshot> {
    let mut class_query = classes::table.select(Class::as_select()).into_boxed();
    let mut subject_query = subjects::table.select(Subject::as_select()).into_boxed();
    let mut teacher_query = teacher_profile::table
        .select(Teacher::as_select())
        .into_boxed();
    let mut room_query = room::table.select(Room::as_select()).into_boxed();

    if let Some(dept) = department_id {
        class_query = class_query.filter(classes::department_id.eq(dept));
        subject_query = subject_query.filter(subjects::department_id.eq(dept));
        teacher_query = teacher_query.filter(teacher_profile::department_id.eq(dept));
        room_query = room_query.filter(room::department_id.eq(dept));
    }
    if let Some(class) = class_id {
        class_query = class_query.filter(classes::id.eq(class));
    }

    let classes: Vec<Class> = class_query.order(classes::id.asc()).load(conn)?;
    if let Some(class) = class_id {
        if classes.is_empty() {
            return Err(AppError::NotFound(format!(
                "Class {} not found in the selected scope",
                class
            )));
        }
    }

    let subjects: Vec<Subject> = subject_query.order(subjects::id.asc()).load(conn)?;
    let teachers: Vec<Teacher> = teacher_query.order(teacher_profile::id.asc()).load(conn)?;
    let rooms: Vec<Room> = room_query.order(room::id.asc()).load(conn)?;

    let teacher_ids: Vec<i32> = teachers.iter().map(|t| t.id).collect();
    let links: Vec<TeacherSubject> = teacher_subjects::table
        .filter(teacher_subjects::teacher_id.eq_any(teacher_ids))
        .select(TeacherSubject::as_select())
        .order(teacher_subjects::id.asc())
        .load(conn)?;

    let slots = list_time_slots(
        conn,
        &TimeSlotFilter {
            department_id,
            day: None,
        },
    )?;

    Ok(Snapshot {
        classes,
        subjects,
        teachers,
        rooms,
        slots,
        links,
    })
}

pub fn preview_payload(
    conn: &mut SqliteConnection,
    req: &GenerateRequest,
) -> AppResult<TimetablePayload> {
    let snapshot = load_snapshot(conn, req.department_id, req.class_id)?;
    Ok(assemble_payload(&snapshot, &req.settings).0)
}

fn ensure_generatable(snapshot: &Snapshot) -> AppResult<()> {
    let missing: Vec<&str> = [
        ("classes", snapshot.classes.is_empty()),
        ("subjects", snapshot.subjects.is_empty()),
        ("teachers", snapshot.teachers.is_empty()),
        ("rooms", snapshot.rooms.is_empty()),
        ("time slots", snapshot.slots.is_empty()),
    ]
    .into_iter()
    .filter(|(_, empty)| *empty)
    .map(|(name, _)| name)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Cannot generate a timetable without {}",
            missing.join(", ")
        )))
    }
}

/// Assemble, call the generator, map the answer, and optionally replace the
/// affected classes' entries. Conflicting proposals are never persisted.
pub async fn generate_timetable(
    pool: &DbPool,
    generator: &GeneratorClient,
    req: &GenerateRequest,
) -> AppResult<GenerationReport> {
    let (payload, index): (TimetablePayload, PayloadIndex) = {
        let mut conn = pool.get()?;
        let snapshot = load_snapshot(&mut conn, req.department_id, req.class_id)?;
        ensure_generatable(&snapshot)?;
        assemble_payload(&snapshot, &req.settings)
    };

    let response = generator.generate(&payload).await?;
    if response.success == Some(false) {
        return Err(AppError::Upstream(
            "generator reported an unsuccessful run".to_string(),
        ));
    }

    let mapped = rows_from_response(&response, &index, req.department_id);
    let conflicts = find_conflicts(&mapped.rows);
    tracing::info!(
        "Generator proposed {} entries ({} free, {} skipped, {} conflicts)",
        mapped.rows.len(),
        mapped.free_cells,
        mapped.skipped_cells,
        conflicts.len()
    );

    if req.persist && !conflicts.is_empty() {
        return Err(AppError::Conflict(format!(
            "Generated timetable has {} conflicting bookings; nothing was saved",
            conflicts.len()
        )));
    }

    let entries = if req.persist {
        let mut conn = pool.get()?;
        replace_for_classes(&mut conn, &index.class_ids, &mapped.rows)?
    } else {
        Vec::new()
    };

    Ok(GenerationReport {
        fitness_score: response.fitness_score,
        generation_count: response.generation_count,
        persisted: req.persist,
        proposed: mapped.rows.len(),
        entries,
        free_cells: mapped.free_cells,
        skipped_cells: mapped.skipped_cells,
        conflicts,
    })
}
