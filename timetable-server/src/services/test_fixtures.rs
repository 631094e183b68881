use chrono::NaiveTime;
use diesel::sqlite::SqliteConnection;

use crate::models::{
    Class, Department, NewClass, NewDepartment, NewRoom, NewSubject, NewTimeSlot, Room, RoomType,
    Subject, SubjectType, Teacher, TimeSlot, Weekday,
};
use crate::services::teacher_service::sample_teacher;
use crate::services::{
    class_service, department_service, room_service, subject_service, teacher_service,
    time_slot_service,
};

/// A small department: 2 classes, 2 teachers, 3 subjects, 2 rooms and a
/// MON..WED x 2-slot grid.
pub struct Campus {
    pub department: Department,
    pub classes: Vec<Class>,
    pub teachers: Vec<Teacher>,
    pub subjects: Vec<Subject>,
    pub rooms: Vec<Room>,
    pub slots: Vec<TimeSlot>,
}

pub fn campus(conn: &mut SqliteConnection) -> Campus {
    let department =
        department_service::create_department(conn, &NewDepartment { name: "CSE".into() })
            .unwrap();
    let dept = Some(department.id);

    let classes = ["CSE-3A", "CSE-3B"]
        .iter()
        .map(|name| {
            class_service::create_class(
                conn,
                &NewClass {
                    class_name: name.to_string(),
                    semester: Some(3),
                    academic_year: Some("2024-25".into()),
                    section: None,
                    students_count: Some(60),
                    department_id: dept,
                },
            )
            .unwrap()
        })
        .collect();

    let teachers = ["E100", "E200"]
        .iter()
        .map(|emp| teacher_service::create_teacher(conn, &sample_teacher(emp, dept)).unwrap())
        .collect();

    let subjects = [
        ("Data Structures", "CS201", SubjectType::Theory, Some(4)),
        ("DS Lab", "CS201L", SubjectType::Lab, Some(2)),
        ("Discrete Maths", "MA201", SubjectType::Theory, None),
    ]
    .iter()
    .map(|(name, code, kind, hours)| {
        subject_service::create_subject(
            conn,
            &NewSubject {
                subject_name: name.to_string(),
                subject_code: code.to_string(),
                semester: Some(3),
                subject_type: Some(*kind),
                credits: Some(3),
                hours_per_week: *hours,
                department_id: dept,
            },
        )
        .unwrap()
    })
    .collect();

    let rooms = [("R-1", RoomType::Classroom), ("L-1", RoomType::Lab)]
        .iter()
        .map(|(number, kind)| {
            room_service::create_room(
                conn,
                &NewRoom {
                    room_number: number.to_string(),
                    room_type: Some(*kind),
                    capacity: Some(60),
                    department_id: dept,
                },
            )
            .unwrap()
        })
        .collect();

    let mut slots = Vec::new();
    for day in [Weekday::Mon, Weekday::Tue, Weekday::Wed] {
        for index in 0..2u32 {
            slots.push(
                time_slot_service::create_time_slot(
                    conn,
                    &NewTimeSlot {
                        day,
                        slot: index as i32,
                        start_time: NaiveTime::from_hms_opt(9 + index, 0, 0),
                        end_time: NaiveTime::from_hms_opt(10 + index, 0, 0),
                        label: None,
                        department_id: dept,
                    },
                )
                .unwrap(),
            );
        }
    }

    Campus {
        department,
        classes,
        teachers,
        subjects,
        rooms,
        slots,
    }
}
