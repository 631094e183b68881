use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{NewTimeSlot, TimeSlot, UpdateTimeSlot, Weekday};
use crate::schema::time_slots;

#[derive(Debug, Default, Deserialize)]
pub struct TimeSlotFilter {
    pub department_id: Option<i32>,
    pub day: Option<Weekday>,
}

/// Ordered by weekday (MON first), then slot index.
pub fn list_time_slots(
    conn: &mut SqliteConnection,
    filter: &TimeSlotFilter,
) -> AppResult<Vec<TimeSlot>> {
    let mut query = time_slots::table.select(TimeSlot::as_select()).into_boxed();

    if let Some(dept) = filter.department_id {
        query = query.filter(time_slots::department_id.eq(dept));
    }
    if let Some(day) = filter.day {
        query = query.filter(time_slots::day.eq(day));
    }

    // Weekdays are stored as text, so week order is applied here.
    let mut slots: Vec<TimeSlot> = query.load(conn)?;
    slots.sort_by_key(|s| (s.day, s.slot, s.id));
    Ok(slots)
}

pub fn get_time_slot(conn: &mut SqliteConnection, slot_id: i32) -> AppResult<TimeSlot> {
    time_slots::table
        .find(slot_id)
        .select(TimeSlot::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Time slot"))
}

fn check_range(start: Option<chrono::NaiveTime>, end: Option<chrono::NaiveTime>) -> AppResult<()> {
    if let (Some(s), Some(e)) = (start, end) {
        if e <= s {
            return Err(AppError::validation("end_time must be after start_time"));
        }
    }
    Ok(())
}

pub fn create_time_slot(conn: &mut SqliteConnection, new: &NewTimeSlot) -> AppResult<TimeSlot> {
    check_range(new.start_time, new.end_time)?;
    Ok(diesel::insert_into(time_slots::table)
        .values(new)
        .returning(TimeSlot::as_returning())
        .get_result(conn)?)
}

pub fn update_time_slot(
    conn: &mut SqliteConnection,
    slot_id: i32,
    changes: &UpdateTimeSlot,
) -> AppResult<TimeSlot> {
    check_range(changes.start_time.flatten(), changes.end_time.flatten())?;
    diesel::update(time_slots::table.find(slot_id))
        .set(changes)
        .returning(TimeSlot::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Time slot"))
}

pub fn delete_time_slot(conn: &mut SqliteConnection, slot_id: i32) -> AppResult<()> {
    let deleted = diesel::delete(time_slots::table.find(slot_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("Time slot"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::NaiveTime;

    fn slot(day: Weekday, index: i32) -> NewTimeSlot {
        NewTimeSlot {
            day,
            slot: index,
            start_time: NaiveTime::from_hms_opt(9 + index as u32, 0, 0),
            end_time: NaiveTime::from_hms_opt(10 + index as u32, 0, 0),
            label: None,
            department_id: None,
        }
    }

    #[test]
    fn test_listing_follows_week_order() {
        let (pool, _dir) = test_pool();
        let mut conn = pool.get().unwrap();
        for (day, index) in [
            (Weekday::Wed, 0),
            (Weekday::Mon, 1),
            (Weekday::Fri, 0),
            (Weekday::Mon, 0),
        ] {
            create_time_slot(&mut conn, &slot(day, index)).unwrap();
        }

        let order: Vec<(Weekday, i32)> = list_time_slots(&mut conn, &TimeSlotFilter::default())
            .unwrap()
            .into_iter()
            .map(|s| (s.day, s.slot))
            .collect();
        assert_eq!(
            order,
            vec![
                (Weekday::Mon, 0),
                (Weekday::Mon, 1),
                (Weekday::Wed, 0),
                (Weekday::Fri, 0)
            ]
        );
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let (pool, _dir) = test_pool();
        let mut conn = pool.get().unwrap();
        let mut bad = slot(Weekday::Tue, 0);
        std::mem::swap(&mut bad.start_time, &mut bad.end_time);
        assert!(matches!(
            create_time_slot(&mut conn, &bad),
            Err(AppError::Validation { .. })
        ));
    }
}
