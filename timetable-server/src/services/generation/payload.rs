use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use validator::Validate;

use crate::models::{Class, Room, Subject, SubjectType, Teacher, TeacherSubject, TimeSlot, Weekday};

pub const DEFAULT_DAYS: usize = 5;
pub const DEFAULT_SLOTS_PER_DAY: usize = 6;

/// Request body of the external generator's `POST /generate-timetable`.
/// Map keys serialize as strings, which is what the generator expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetablePayload {
    pub num_classes: usize,
    pub days: usize,
    pub slots_per_day: usize,
    pub total_rooms: usize,
    pub total_teachers: usize,
    pub subject_hours: BTreeMap<usize, i32>,
    pub subject_teachers: BTreeMap<usize, Vec<usize>>,
    pub class_names: Vec<String>,
    pub subject_names: Vec<String>,
    pub teacher_names: Vec<String>,
    pub room_names: Vec<String>,
    pub max_hours_per_day: i32,
    pub max_hours_per_week: i32,
    pub mutation_rate: f64,
    pub population_size: u32,
    pub generations: u32,
}

/// Tunables forwarded to the generator untouched.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct SolverSettings {
    #[validate(range(min = 1, max = 24))]
    pub max_hours_per_day: i32,
    #[validate(range(min = 1, max = 168))]
    pub max_hours_per_week: i32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub mutation_rate: f64,
    #[validate(range(min = 2, max = 10000))]
    pub population_size: u32,
    #[validate(range(min = 1, max = 100000))]
    pub generations: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_hours_per_day: 6,
            max_hours_per_week: 20,
            mutation_rate: 0.02,
            population_size: 60,
            generations: 80,
        }
    }
}

/// Everything the payload is built from, as loaded from the database.
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    pub classes: Vec<Class>,
    pub subjects: Vec<Subject>,
    pub teachers: Vec<Teacher>,
    pub rooms: Vec<Room>,
    /// Must already be in week order.
    pub slots: Vec<TimeSlot>,
    pub links: Vec<TeacherSubject>,
}

/// Positional index -> database id tables captured while assembling, used to
/// map the generator's answer back onto rows.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PayloadIndex {
    pub class_ids: Vec<i32>,
    pub subject_ids: Vec<i32>,
    pub subject_types: Vec<SubjectType>,
    pub teacher_ids: Vec<i32>,
    pub room_ids: Vec<i32>,
    pub days: Vec<Weekday>,
    /// `slot_grid[day][slot]` is a time slot id.
    pub slot_grid: Vec<Vec<i32>>,
}

impl PayloadIndex {
    pub fn time_slot_id(&self, day: usize, slot: usize) -> Option<i32> {
        self.slot_grid.get(day).and_then(|d| d.get(slot)).copied()
    }
}

fn subject_hours(subjects: &[Subject]) -> BTreeMap<usize, i32> {
    subjects
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let hours = s
                .hours_per_week
                .filter(|h| *h > 0)
                .unwrap_or(if idx % 2 == 0 { 3 } else { 4 });
            (idx, hours)
        })
        .collect()
}

/// Linked teachers first, then teachers of the subject's department, then teacher 0.
fn subject_teachers(snapshot: &Snapshot) -> BTreeMap<usize, Vec<usize>> {
    let position = |teacher_id: i32| snapshot.teachers.iter().position(|t| t.id == teacher_id);

    snapshot
        .subjects
        .iter()
        .enumerate()
        .map(|(idx, subject)| {
            let mut linked: Vec<usize> = snapshot
                .links
                .iter()
                .filter(|l| l.subject_id == subject.id)
                .filter_map(|l| position(l.teacher_id))
                .collect();
            linked.sort_unstable();
            linked.dedup();

            if linked.is_empty() {
                if let Some(dept) = subject.department_id {
                    linked = snapshot
                        .teachers
                        .iter()
                        .enumerate()
                        .filter(|(_, t)| t.department_id == Some(dept))
                        .map(|(i, _)| i)
                        .collect();
                }
            }
            if linked.is_empty() {
                linked.push(0);
            }
            (idx, linked)
        })
        .collect()
}

fn slot_grid(slots: &[TimeSlot]) -> (Vec<Weekday>, Vec<Vec<i32>>) {
    let days: Vec<Weekday> = slots
        .iter()
        .map(|s| s.day)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let grid = days
        .iter()
        .map(|day| {
            let mut of_day: Vec<&TimeSlot> = slots.iter().filter(|s| s.day == *day).collect();
            of_day.sort_by_key(|s| (s.slot, s.id));
            of_day.iter().map(|s| s.id).collect()
        })
        .collect();

    (days, grid)
}

pub fn assemble_payload(
    snapshot: &Snapshot,
    settings: &SolverSettings,
) -> (TimetablePayload, PayloadIndex) {
    let (days, grid) = slot_grid(&snapshot.slots);
    let slots_per_day = grid.first().map(Vec::len).unwrap_or(0);

    let payload = TimetablePayload {
        num_classes: snapshot.classes.len().max(1),
        days: if days.is_empty() { DEFAULT_DAYS } else { days.len() },
        slots_per_day: if slots_per_day == 0 {
            DEFAULT_SLOTS_PER_DAY
        } else {
            slots_per_day
        },
        total_rooms: snapshot.rooms.len().max(1),
        total_teachers: snapshot.teachers.len().max(1),
        subject_hours: subject_hours(&snapshot.subjects),
        subject_teachers: subject_teachers(snapshot),
        class_names: snapshot
            .classes
            .iter()
            .map(|c| c.class_name.clone())
            .collect(),
        subject_names: snapshot
            .subjects
            .iter()
            .map(|s| s.subject_name.clone())
            .collect(),
        teacher_names: snapshot.teachers.iter().map(Teacher::display_name).collect(),
        room_names: snapshot
            .rooms
            .iter()
            .map(|r| r.room_number.clone())
            .collect(),
        max_hours_per_day: settings.max_hours_per_day,
        max_hours_per_week: settings.max_hours_per_week,
        mutation_rate: settings.mutation_rate,
        population_size: settings.population_size,
        generations: settings.generations,
    };

    let index = PayloadIndex {
        class_ids: snapshot.classes.iter().map(|c| c.id).collect(),
        subject_ids: snapshot.subjects.iter().map(|s| s.id).collect(),
        subject_types: snapshot
            .subjects
            .iter()
            .map(|s| s.subject_type.unwrap_or_default())
            .collect(),
        teacher_ids: snapshot.teachers.iter().map(|t| t.id).collect(),
        room_ids: snapshot.rooms.iter().map(|r| r.id).collect(),
        days,
        slot_grid: grid,
    };

    (payload, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn subject(id: i32, hours: Option<i32>, dept: Option<i32>) -> Subject {
        Subject {
            id,
            created_at: Utc::now().naive_utc(),
            subject_name: format!("S{}", id),
            subject_code: format!("C{}", id),
            semester: None,
            subject_type: None,
            credits: None,
            hours_per_week: hours,
            department_id: dept,
        }
    }

    fn teacher(id: i32, dept: Option<i32>) -> Teacher {
        Teacher {
            id,
            created_at: Utc::now().naive_utc(),
            user_id: None,
            emp_id: format!("E{}", id),
            first_name: None,
            last_name: None,
            name: Some(format!("Teacher {}", id)),
            email: format!("t{}@uni.edu", id),
            phone: None,
            designation: None,
            max_hours: None,
            bio: None,
            department_id: dept,
        }
    }

    fn slot(id: i32, day: Weekday, index: i32) -> TimeSlot {
        TimeSlot {
            id,
            day,
            slot: index,
            start_time: None,
            end_time: None,
            label: None,
            department_id: None,
        }
    }

    fn link(teacher_id: i32, subject_id: i32) -> TeacherSubject {
        TeacherSubject {
            id: teacher_id * 100 + subject_id,
            created_at: Utc::now().naive_utc(),
            teacher_id,
            subject_id,
        }
    }

    #[test]
    fn test_empty_snapshot_uses_defaults_and_floors() {
        let (payload, index) = assemble_payload(&Snapshot::default(), &SolverSettings::default());
        assert_eq!(payload.num_classes, 1);
        assert_eq!(payload.days, DEFAULT_DAYS);
        assert_eq!(payload.slots_per_day, DEFAULT_SLOTS_PER_DAY);
        assert_eq!(payload.total_rooms, 1);
        assert_eq!(payload.total_teachers, 1);
        assert_eq!(payload.population_size, 60);
        assert_eq!(payload.generations, 80);
        assert!(index.slot_grid.is_empty());
    }

    #[test]
    fn test_subject_hours_fall_back_to_alternating() {
        let snapshot = Snapshot {
            subjects: vec![
                subject(10, None, None),
                subject(11, None, None),
                subject(12, Some(5), None),
            ],
            ..Default::default()
        };
        let (payload, _) = assemble_payload(&snapshot, &SolverSettings::default());
        assert_eq!(
            payload.subject_hours,
            BTreeMap::from([(0, 3), (1, 4), (2, 5)])
        );
    }

    #[test]
    fn test_subject_teachers_resolution_order() {
        let snapshot = Snapshot {
            subjects: vec![
                subject(1, None, Some(7)),
                subject(2, None, Some(7)),
                subject(3, None, None),
            ],
            teachers: vec![teacher(50, Some(9)), teacher(51, Some(7)), teacher(52, Some(7))],
            links: vec![link(50, 1)],
            ..Default::default()
        };
        let (payload, index) = assemble_payload(&snapshot, &SolverSettings::default());

        assert_eq!(payload.subject_teachers[&0], vec![0]); // linked
        assert_eq!(payload.subject_teachers[&1], vec![1, 2]); // same department
        assert_eq!(payload.subject_teachers[&2], vec![0]); // fallback
        assert_eq!(index.teacher_ids, vec![50, 51, 52]);
    }

    #[test]
    fn test_days_and_slot_grid_follow_week_order() {
        let snapshot = Snapshot {
            slots: vec![
                slot(1, Weekday::Mon, 1),
                slot(2, Weekday::Mon, 0),
                slot(3, Weekday::Tue, 0),
                slot(4, Weekday::Tue, 1),
                slot(5, Weekday::Thu, 0),
            ],
            ..Default::default()
        };
        let (payload, index) = assemble_payload(&snapshot, &SolverSettings::default());
        assert_eq!(payload.days, 3);
        assert_eq!(payload.slots_per_day, 2);
        assert_eq!(index.days, vec![Weekday::Mon, Weekday::Tue, Weekday::Thu]);
        assert_eq!(index.time_slot_id(0, 0), Some(2));
        assert_eq!(index.time_slot_id(0, 1), Some(1));
        assert_eq!(index.time_slot_id(2, 1), None);
    }

    #[test]
    fn test_map_keys_serialize_as_strings() {
        let snapshot = Snapshot {
            subjects: vec![subject(1, Some(2), None)],
            ..Default::default()
        };
        let (payload, _) = assemble_payload(&snapshot, &SolverSettings::default());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["subject_hours"]["0"], 2);
        assert_eq!(json["subject_teachers"]["0"], serde_json::json!([0]));
    }
}
