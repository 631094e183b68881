use serde::Serialize;
use std::collections::HashMap;

use super::client::GeneratorResponse;
use super::payload::PayloadIndex;
use crate::models::{NewTimetableEntry, SubjectType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    Teacher,
    Room,
    Class,
}

/// A resource booked more than once in the same time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub resource_id: i32,
    pub time_slot_id: i32,
    pub bookings: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct MappedTimetable {
    pub rows: Vec<NewTimetableEntry>,
    pub free_cells: usize,
    pub skipped_cells: usize,
}

/// Translates positional cells back to database ids. Free cells are dropped;
/// cells whose class, slot, subject, teacher or room index has no counterpart
/// are skipped and counted.
pub fn rows_from_response(
    response: &GeneratorResponse,
    index: &PayloadIndex,
    department_id: Option<i32>,
) -> MappedTimetable {
    let mut mapped = MappedTimetable::default();

    for class in &response.student_timetables {
        for (day_pos, day) in class.timetable.iter().enumerate() {
            for (slot_pos, cell) in day.iter().enumerate() {
                let Some(cell) = cell else {
                    mapped.free_cells += 1;
                    continue;
                };
                if cell.is_free {
                    mapped.free_cells += 1;
                    continue;
                }

                let class_idx = cell.class_id.unwrap_or(class.class_id);
                let row = (|| {
                    let subject_idx = cell.subject_id?;
                    Some(NewTimetableEntry {
                        class_id: *index.class_ids.get(class_idx)?,
                        time_slot_id: index.time_slot_id(day_pos, slot_pos)?,
                        subject_id: *index.subject_ids.get(subject_idx)?,
                        teacher_id: *index.teacher_ids.get(cell.teacher_id?)?,
                        room_id: *index.room_ids.get(cell.room_id?)?,
                        entry_type: entry_type(index.subject_types.get(subject_idx).copied()),
                        department_id,
                    })
                })();

                match row {
                    Some(row) => mapped.rows.push(row),
                    None => {
                        tracing::warn!(
                            "Skipping unmappable generator cell: class {} day {} slot {}",
                            class_idx,
                            day_pos,
                            slot_pos
                        );
                        mapped.skipped_cells += 1;
                    }
                }
            }
        }
    }

    mapped
}

fn entry_type(subject_type: Option<SubjectType>) -> SubjectType {
    match subject_type {
        Some(SubjectType::Lab) => SubjectType::Lab,
        Some(SubjectType::Tutorial) => SubjectType::Tutorial,
        Some(SubjectType::Elective) => SubjectType::Elective,
        _ => SubjectType::Theory,
    }
}

/// Teacher, room and class double bookings per time slot, in a stable order.
pub fn find_conflicts(rows: &[NewTimetableEntry]) -> Vec<Conflict> {
    let mut counts: HashMap<(ConflictKind, i32, i32), usize> = HashMap::new();
    for row in rows {
        for (kind, resource) in [
            (ConflictKind::Teacher, row.teacher_id),
            (ConflictKind::Room, row.room_id),
            (ConflictKind::Class, row.class_id),
        ] {
            *counts.entry((kind, resource, row.time_slot_id)).or_default() += 1;
        }
    }

    let mut conflicts: Vec<Conflict> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|((kind, resource_id, time_slot_id), bookings)| Conflict {
            kind,
            resource_id,
            time_slot_id,
            bookings,
        })
        .collect();
    conflicts.sort_by_key(|c| (c.time_slot_id, c.kind as u8, c.resource_id));
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::generation::client::{ClassTimetable, SlotInfo};

    fn index() -> PayloadIndex {
        PayloadIndex {
            class_ids: vec![100, 101],
            subject_ids: vec![200, 201],
            subject_types: vec![SubjectType::Theory, SubjectType::Lab],
            teacher_ids: vec![300, 301],
            room_ids: vec![400],
            days: vec![crate::models::Weekday::Mon, crate::models::Weekday::Tue],
            slot_grid: vec![vec![10, 11], vec![20, 21]],
        }
    }

    fn busy(day: usize, slot: usize, subject: usize, teacher: usize) -> Option<SlotInfo> {
        Some(SlotInfo {
            subject_id: Some(subject),
            teacher_id: Some(teacher),
            room_id: Some(0),
            day,
            slot,
            ..Default::default()
        })
    }

    fn free(day: usize, slot: usize) -> Option<SlotInfo> {
        Some(SlotInfo {
            day,
            slot,
            is_free: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_maps_indices_to_ids() {
        let response = GeneratorResponse {
            student_timetables: vec![ClassTimetable {
                class_id: 1,
                class_name: Some("B".into()),
                timetable: vec![
                    vec![busy(0, 0, 0, 1), free(0, 1)],
                    vec![None, busy(1, 1, 1, 0)],
                ],
            }],
            ..Default::default()
        };

        let mapped = rows_from_response(&response, &index(), Some(9));
        assert_eq!(mapped.free_cells, 2);
        assert_eq!(mapped.skipped_cells, 0);
        assert_eq!(mapped.rows.len(), 2);

        let first = &mapped.rows[0];
        assert_eq!(
            (first.class_id, first.time_slot_id, first.subject_id, first.teacher_id, first.room_id),
            (101, 10, 200, 301, 400)
        );
        assert_eq!(first.entry_type, SubjectType::Theory);
        assert_eq!(first.department_id, Some(9));

        let second = &mapped.rows[1];
        assert_eq!(second.time_slot_id, 21);
        assert_eq!(second.entry_type, SubjectType::Lab);
    }

    #[test]
    fn test_out_of_range_cells_are_skipped() {
        let response = GeneratorResponse {
            student_timetables: vec![ClassTimetable {
                class_id: 0,
                class_name: None,
                timetable: vec![
                    vec![busy(0, 0, 5, 0), busy(0, 1, 0, 0), busy(0, 2, 0, 0)],
                ],
            }],
            ..Default::default()
        };
        let mapped = rows_from_response(&response, &index(), None);
        // Unknown subject 5, then a valid cell, then slot 2 beyond the grid.
        assert_eq!(mapped.rows.len(), 1);
        assert_eq!(mapped.skipped_cells, 2);
    }

    #[test]
    fn test_find_conflicts_reports_double_bookings() {
        let row = |class_id, teacher_id, room_id, time_slot_id| NewTimetableEntry {
            class_id,
            time_slot_id,
            subject_id: 1,
            teacher_id,
            room_id,
            entry_type: SubjectType::Theory,
            department_id: None,
        };
        let rows = vec![row(1, 7, 50, 10), row(2, 7, 51, 10), row(3, 8, 51, 11)];

        let conflicts = find_conflicts(&rows);
        assert_eq!(
            conflicts,
            vec![Conflict {
                kind: ConflictKind::Teacher,
                resource_id: 7,
                time_slot_id: 10,
                bookings: 2,
            }]
        );
        assert!(find_conflicts(&rows[2..]).is_empty());
    }
}
