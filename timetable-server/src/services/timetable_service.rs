use chrono::NaiveTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::models::{NewTimetableEntry, TimeSlot, TimetableEntry, UpdateTimetableEntry, Weekday};
use crate::schema::{time_slots, timetable_entries};

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct EntryFilter {
    #[serde(alias = "classId")]
    pub class_id: Option<i32>,
    #[serde(alias = "teacherId")]
    pub teacher_id: Option<i32>,
    #[serde(alias = "roomId")]
    pub room_id: Option<i32>,
    #[serde(alias = "timeSlotId")]
    pub time_slot_id: Option<i32>,
    #[serde(alias = "subjectId")]
    pub subject_id: Option<i32>,
    #[serde(default = "default_true", alias = "includeTimeSlot")]
    pub include_time_slot: bool,
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self {
            class_id: None,
            teacher_id: None,
            room_id: None,
            time_slot_id: None,
            subject_id: None,
            include_time_slot: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotSummary {
    pub id: i32,
    pub day: Weekday,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl From<&TimeSlot> for SlotSummary {
    fn from(slot: &TimeSlot) -> Self {
        Self {
            id: slot.id,
            day: slot.day,
            start_time: slot.start_time,
            end_time: slot.end_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntryView {
    #[serde(flatten)]
    pub entry: TimetableEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<SlotSummary>,
}

/// Ordered by time slot id, then creation time, then id.
pub fn list_entries(
    conn: &mut SqliteConnection,
    filter: &EntryFilter,
) -> AppResult<Vec<EntryView>> {
    let mut query = timetable_entries::table
        .select(TimetableEntry::as_select())
        .into_boxed();

    if let Some(v) = filter.class_id {
        query = query.filter(timetable_entries::class_id.eq(v));
    }
    if let Some(v) = filter.teacher_id {
        query = query.filter(timetable_entries::teacher_id.eq(v));
    }
    if let Some(v) = filter.room_id {
        query = query.filter(timetable_entries::room_id.eq(v));
    }
    if let Some(v) = filter.time_slot_id {
        query = query.filter(timetable_entries::time_slot_id.eq(v));
    }
    if let Some(v) = filter.subject_id {
        query = query.filter(timetable_entries::subject_id.eq(v));
    }

    let entries: Vec<TimetableEntry> = query
        .order((
            timetable_entries::time_slot_id.asc(),
            timetable_entries::created_at.asc(),
            timetable_entries::id.asc(),
        ))
        .load(conn)?;

    let mut slots: HashMap<i32, SlotSummary> = HashMap::new();
    if filter.include_time_slot && !entries.is_empty() {
        let ids: Vec<i32> = entries.iter().map(|e| e.time_slot_id).collect();
        slots = time_slots::table
            .filter(time_slots::id.eq_any(ids))
            .select(TimeSlot::as_select())
            .load::<TimeSlot>(conn)?
            .iter()
            .map(|s| (s.id, SlotSummary::from(s)))
            .collect();
    }

    Ok(entries
        .into_iter()
        .map(|entry| {
            let time_slot = slots.get(&entry.time_slot_id).cloned();
            EntryView { entry, time_slot }
        })
        .collect())
}

pub fn get_entry(conn: &mut SqliteConnection, entry_id: i32) -> AppResult<TimetableEntry> {
    timetable_entries::table
        .find(entry_id)
        .select(TimetableEntry::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Timetable entry"))
}

pub fn create_entry(
    conn: &mut SqliteConnection,
    new: &NewTimetableEntry,
) -> AppResult<TimetableEntry> {
    Ok(diesel::insert_into(timetable_entries::table)
        .values(new)
        .returning(TimetableEntry::as_returning())
        .get_result(conn)?)
}

/// All-or-nothing insert of several entries.
pub fn create_entries(
    conn: &mut SqliteConnection,
    rows: &[NewTimetableEntry],
) -> AppResult<Vec<TimetableEntry>> {
    conn.immediate_transaction(|conn| insert_all(conn, rows))
}

fn insert_all(
    conn: &mut SqliteConnection,
    rows: &[NewTimetableEntry],
) -> AppResult<Vec<TimetableEntry>> {
    rows.iter().map(|row| create_entry(conn, row)).collect()
}

pub fn update_entry(
    conn: &mut SqliteConnection,
    entry_id: i32,
    changes: &UpdateTimetableEntry,
) -> AppResult<TimetableEntry> {
    diesel::update(timetable_entries::table.find(entry_id))
        .set(changes)
        .returning(TimetableEntry::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Timetable entry"))
}

pub fn delete_entry(conn: &mut SqliteConnection, entry_id: i32) -> AppResult<()> {
    let deleted = diesel::delete(timetable_entries::table.find(entry_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("Timetable entry"));
    }
    Ok(())
}

pub fn clear_class(conn: &mut SqliteConnection, class: i32) -> AppResult<usize> {
    Ok(
        diesel::delete(timetable_entries::table.filter(timetable_entries::class_id.eq(class)))
            .execute(conn)?,
    )
}

/// Replaces the entries of every class in `class_ids` with `rows` atomically.
pub fn replace_for_classes(
    conn: &mut SqliteConnection,
    class_ids: &[i32],
    rows: &[NewTimetableEntry],
) -> AppResult<Vec<TimetableEntry>> {
    if let Some(stray) = rows.iter().find(|r| !class_ids.contains(&r.class_id)) {
        return Err(AppError::validation(format!(
            "entry for class {} is outside the classes being replaced",
            stray.class_id
        )));
    }

    conn.immediate_transaction(|conn| {
        let mut removed = 0;
        for class in class_ids {
            removed += clear_class(conn, *class)?;
        }
        let created = insert_all(conn, rows)?;
        tracing::info!(
            "Replaced timetable for classes {:?}: removed {}, inserted {}",
            class_ids,
            removed,
            created.len()
        );
        Ok(created)
    })
}
