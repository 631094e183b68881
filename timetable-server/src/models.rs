use chrono::{NaiveDateTime, NaiveTime};
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::auth::roles::Role;

/// For changesets on nullable columns: an absent field leaves the column alone,
/// an explicit `null` clears it.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Implements text (de)serialization for an enum stored as a TEXT column.
macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_uppercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!("invalid {}: {}", stringify!($ty), other)),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql<Text, Sqlite> for $ty {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
                out.set_value(self.as_str());
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Sqlite> for $ty {
            fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
                let raw = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
                raw.parse().map_err(Into::into)
            }
        }
    };
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "UPPERCASE")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

text_enum!(Weekday {
    Mon => "MON",
    Tue => "TUE",
    Wed => "WED",
    Thu => "THU",
    Fri => "FRI",
    Sat => "SAT",
});

impl Weekday {
    /// Zero-based position in the teaching week (MON = 0).
    pub fn index(&self) -> usize {
        match self {
            Weekday::Mon => 0,
            Weekday::Tue => 1,
            Weekday::Wed => 2,
            Weekday::Thu => 3,
            Weekday::Fri => 4,
            Weekday::Sat => 5,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubjectType {
    #[default]
    Theory,
    Lab,
    Tutorial,
    Elective,
}

text_enum!(SubjectType {
    Theory => "THEORY",
    Lab => "LAB",
    Tutorial => "TUTORIAL",
    Elective => "ELECTIVE",
});

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoomType {
    Classroom,
    Lab,
    Seminar,
    Other,
}

text_enum!(RoomType {
    Classroom => "CLASSROOM",
    Lab => "LAB",
    Seminar => "SEMINAR",
    Other => "OTHER",
});

// User models
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: i32,
    pub uid: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub department_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub uid: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub department_id: Option<i32>,
}

// Role catalog models
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::roles)]
pub struct RoleEntry {
    pub id: i32,
    pub created_at: NaiveDateTime,
    pub role_name: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::user_roles)]
pub struct UserRole {
    pub id: i32,
    pub created_at: NaiveDateTime,
    pub user_id: String,
    pub role_id: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::user_roles)]
pub struct NewUserRole {
    pub user_id: String,
    pub role_id: i32,
}

// Department models
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::department)]
pub struct Department {
    pub id: i32,
    pub created_at: NaiveDateTime,
    pub name: String,
}

#[derive(Debug, Insertable, Deserialize, Validate)]
#[diesel(table_name = crate::schema::department)]
pub struct NewDepartment {
    #[validate(length(min = 1, message = "Department name is required"))]
    pub name: String,
}

#[derive(Debug, AsChangeset, Deserialize, Validate)]
#[diesel(table_name = crate::schema::department)]
pub struct UpdateDepartment {
    #[validate(length(min = 1, message = "Department name cannot be empty"))]
    pub name: Option<String>,
}

// Class models
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::classes)]
pub struct Class {
    pub id: i32,
    pub created_at: NaiveDateTime,
    pub class_name: String,
    pub semester: Option<i32>,
    pub academic_year: Option<String>,
    pub section: Option<String>,
    pub students_count: Option<i32>,
    pub department_id: Option<i32>,
}

#[derive(Debug, Insertable, Deserialize, Validate)]
#[diesel(table_name = crate::schema::classes)]
pub struct NewClass {
    #[validate(length(min = 1, message = "Class name is required"))]
    pub class_name: String,
    #[validate(range(min = 1, max = 12, message = "Semester must be between 1 and 12"))]
    pub semester: Option<i32>,
    pub academic_year: Option<String>,
    pub section: Option<String>,
    #[validate(range(min = 0, message = "Student count cannot be negative"))]
    pub students_count: Option<i32>,
    pub department_id: Option<i32>,
}

#[derive(Debug, AsChangeset, Deserialize, Validate)]
#[diesel(table_name = crate::schema::classes)]
pub struct UpdateClass {
    #[validate(length(min = 1, message = "Class name cannot be empty"))]
    pub class_name: Option<String>,
    #[validate(range(min = 1, max = 12, message = "Semester must be between 1 and 12"))]
    pub semester: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub academic_year: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub section: Option<Option<String>>,
    #[validate(range(min = 0, message = "Student count cannot be negative"))]
    pub students_count: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub department_id: Option<Option<i32>>,
}

// Teacher profile models
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::teacher_profile)]
pub struct Teacher {
    pub id: i32,
    pub created_at: NaiveDateTime,
    pub user_id: Option<String>,
    pub emp_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub designation: Option<String>,
    pub max_hours: Option<i32>,
    pub bio: Option<String>,
    pub department_id: Option<i32>,
}

impl Teacher {
    /// Display name, falling back to first/last name and then the employee id.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if joined.trim().is_empty() {
            self.emp_id.clone()
        } else {
            joined
        }
    }
}

#[derive(Debug, Insertable, Deserialize, Validate)]
#[diesel(table_name = crate::schema::teacher_profile)]
pub struct NewTeacher {
    pub user_id: Option<String>,
    #[validate(length(min = 1, message = "Employee id is required"))]
    pub emp_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    pub phone: Option<String>,
    pub designation: Option<String>,
    #[validate(range(min = 1, max = 60, message = "Max hours must be between 1 and 60"))]
    pub max_hours: Option<i32>,
    pub bio: Option<String>,
    pub department_id: Option<i32>,
}

#[derive(Debug, AsChangeset, Deserialize, Validate)]
#[diesel(table_name = crate::schema::teacher_profile)]
pub struct UpdateTeacher {
    #[serde(default, deserialize_with = "nullable")]
    pub user_id: Option<Option<String>>,
    #[validate(length(min = 1, message = "Employee id cannot be empty"))]
    pub emp_id: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub designation: Option<Option<String>>,
    #[validate(range(min = 1, max = 60, message = "Max hours must be between 1 and 60"))]
    pub max_hours: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub department_id: Option<Option<i32>>,
}

// Student profile models
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::student_profile)]
pub struct Student {
    pub id: i32,
    pub created_at: NaiveDateTime,
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub semester: Option<i32>,
    pub roll_number: Option<String>,
    pub class_id: Option<i32>,
    pub bio: Option<String>,
}

#[derive(Debug, Insertable, AsChangeset, Deserialize, Validate)]
#[diesel(table_name = crate::schema::student_profile)]
pub struct StudentPayload {
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    #[validate(range(min = 1, max = 12, message = "Semester must be between 1 and 12"))]
    pub semester: Option<i32>,
    #[validate(length(min = 1, message = "Roll number cannot be empty"))]
    pub roll_number: Option<String>,
    pub class_id: Option<i32>,
    pub bio: Option<String>,
}

// HOD profile models
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::hod_profile)]
pub struct HodProfile {
    pub id: i32,
    pub created_at: NaiveDateTime,
    pub user_id: Option<String>,
    pub teacher_id: Option<i32>,
    pub department_id: Option<i32>,
    pub max_hours: Option<i32>,
    pub bio: Option<String>,
}

#[derive(Debug, Insertable, AsChangeset, Deserialize, Validate)]
#[diesel(table_name = crate::schema::hod_profile)]
pub struct HodPayload {
    pub user_id: Option<String>,
    pub teacher_id: Option<i32>,
    pub department_id: Option<i32>,
    #[validate(range(min = 1, max = 60, message = "Max hours must be between 1 and 60"))]
    pub max_hours: Option<i32>,
    pub bio: Option<String>,
}

// Timetable coordinator models
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::timetable_coordinator_profile)]
pub struct Coordinator {
    pub id: i32,
    pub created_at: NaiveDateTime,
    pub user_id: Option<String>,
    pub teacher_id: Option<i32>,
    pub department_id: Option<i32>,
}

#[derive(Debug, Insertable, AsChangeset, Deserialize, Validate)]
#[diesel(table_name = crate::schema::timetable_coordinator_profile)]
pub struct CoordinatorPayload {
    pub user_id: Option<String>,
    pub teacher_id: Option<i32>,
    pub department_id: Option<i32>,
}

// Subject models
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::subjects)]
pub struct Subject {
    pub id: i32,
    pub created_at: NaiveDateTime,
    pub subject_name: String,
    pub subject_code: String,
    pub semester: Option<i32>,
    #[serde(rename = "type")]
    pub subject_type: Option<SubjectType>,
    pub credits: Option<i32>,
    pub hours_per_week: Option<i32>,
    pub department_id: Option<i32>,
}

#[derive(Debug, Insertable, Deserialize, Validate)]
#[diesel(table_name = crate::schema::subjects)]
pub struct NewSubject {
    #[validate(length(min = 1, message = "Subject name is required"))]
    pub subject_name: String,
    #[validate(length(min = 1, message = "Subject code is required"))]
    pub subject_code: String,
    #[validate(range(min = 1, max = 12, message = "Semester must be between 1 and 12"))]
    pub semester: Option<i32>,
    #[serde(rename = "type")]
    pub subject_type: Option<SubjectType>,
    #[validate(range(min = 0, max = 20, message = "Credits must be between 0 and 20"))]
    pub credits: Option<i32>,
    #[validate(range(min = 0, max = 40, message = "Hours per week must be between 0 and 40"))]
    pub hours_per_week: Option<i32>,
    pub department_id: Option<i32>,
}

#[derive(Debug, AsChangeset, Deserialize, Validate)]
#[diesel(table_name = crate::schema::subjects)]
pub struct UpdateSubject {
    #[validate(length(min = 1, message = "Subject name cannot be empty"))]
    pub subject_name: Option<String>,
    #[validate(length(min = 1, message = "Subject code cannot be empty"))]
    pub subject_code: Option<String>,
    #[validate(range(min = 1, max = 12, message = "Semester must be between 1 and 12"))]
    pub semester: Option<i32>,
    #[serde(rename = "type")]
    #[serde(default, deserialize_with = "nullable")]
    pub subject_type: Option<Option<SubjectType>>,
    #[validate(range(min = 0, max = 20, message = "Credits must be between 0 and 20"))]
    pub credits: Option<i32>,
    #[validate(range(min = 0, max = 40, message = "Hours per week must be between 0 and 40"))]
    pub hours_per_week: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub department_id: Option<Option<i32>>,
}

// Room models
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::room)]
pub struct Room {
    pub id: i32,
    pub created_at: NaiveDateTime,
    pub room_number: String,
    pub room_type: Option<RoomType>,
    pub capacity: Option<i32>,
    pub department_id: Option<i32>,
}

#[derive(Debug, Insertable, Deserialize, Validate)]
#[diesel(table_name = crate::schema::room)]
pub struct NewRoom {
    #[validate(length(min = 1, message = "Room number is required"))]
    pub room_number: String,
    pub room_type: Option<RoomType>,
    #[validate(range(min = 1, max = 1000, message = "Capacity must be between 1 and 1000"))]
    pub capacity: Option<i32>,
    pub department_id: Option<i32>,
}

#[derive(Debug, AsChangeset, Deserialize, Validate)]
#[diesel(table_name = crate::schema::room)]
pub struct UpdateRoom {
    #[validate(length(min = 1, message = "Room number cannot be empty"))]
    pub room_number: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub room_type: Option<Option<RoomType>>,
    #[validate(range(min = 1, max = 1000, message = "Capacity must be between 1 and 1000"))]
    pub capacity: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub department_id: Option<Option<i32>>,
}

// Time slot models
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::time_slots)]
pub struct TimeSlot {
    pub id: i32,
    pub day: Weekday,
    pub slot: i32,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub label: Option<String>,
    pub department_id: Option<i32>,
}

#[derive(Debug, Insertable, Deserialize, Validate)]
#[diesel(table_name = crate::schema::time_slots)]
pub struct NewTimeSlot {
    pub day: Weekday,
    #[validate(range(min = 0, max = 23, message = "Slot index must be between 0 and 23"))]
    pub slot: i32,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub label: Option<String>,
    pub department_id: Option<i32>,
}

#[derive(Debug, AsChangeset, Deserialize, Validate)]
#[diesel(table_name = crate::schema::time_slots)]
pub struct UpdateTimeSlot {
    pub day: Option<Weekday>,
    #[validate(range(min = 0, max = 23, message = "Slot index must be between 0 and 23"))]
    pub slot: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub start_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "nullable")]
    pub label: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub department_id: Option<Option<i32>>,
}

// Teacher <-> subject links
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::teacher_subjects)]
pub struct TeacherSubject {
    pub id: i32,
    pub created_at: NaiveDateTime,
    pub teacher_id: i32,
    pub subject_id: i32,
}

#[derive(Debug, Clone, Insertable, Deserialize, Validate)]
#[diesel(table_name = crate::schema::teacher_subjects)]
pub struct NewTeacherSubject {
    pub teacher_id: i32,
    pub subject_id: i32,
}

#[derive(Debug, AsChangeset, Deserialize, Validate)]
#[diesel(table_name = crate::schema::teacher_subjects)]
pub struct UpdateTeacherSubject {
    pub teacher_id: Option<i32>,
    pub subject_id: Option<i32>,
}

// Teacher-subject pairing assigned to a class
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::teacher_per_class)]
pub struct TeacherPerClass {
    pub id: i32,
    pub created_at: NaiveDateTime,
    pub teacher_subject_id: Option<i32>,
    pub class_id: Option<i32>,
    pub department_id: Option<i32>,
}

#[derive(Debug, Insertable, AsChangeset, Deserialize, Validate)]
#[diesel(table_name = crate::schema::teacher_per_class)]
pub struct TeacherPerClassPayload {
    pub teacher_subject_id: Option<i32>,
    pub class_id: Option<i32>,
    pub department_id: Option<i32>,
}

// Timetable entries
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::timetable_entries)]
pub struct TimetableEntry {
    pub id: i32,
    pub created_at: NaiveDateTime,
    pub class_id: i32,
    pub time_slot_id: i32,
    pub subject_id: i32,
    pub teacher_id: i32,
    pub room_id: i32,
    #[serde(rename = "type")]
    pub entry_type: SubjectType,
    pub department_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Insertable, Serialize, Deserialize, Validate)]
#[diesel(table_name = crate::schema::timetable_entries)]
pub struct NewTimetableEntry {
    pub class_id: i32,
    pub time_slot_id: i32,
    pub subject_id: i32,
    pub teacher_id: i32,
    pub room_id: i32,
    #[serde(rename = "type", default)]
    pub entry_type: SubjectType,
    pub department_id: Option<i32>,
}

#[derive(Debug, AsChangeset, Deserialize, Validate)]
#[diesel(table_name = crate::schema::timetable_entries)]
pub struct UpdateTimetableEntry {
    pub class_id: Option<i32>,
    pub time_slot_id: Option<i32>,
    pub subject_id: Option<i32>,
    pub teacher_id: Option<i32>,
    pub room_id: Option<i32>,
    #[serde(rename = "type")]
    pub entry_type: Option<SubjectType>,
    #[serde(default, deserialize_with = "nullable")]
    pub department_id: Option<Option<i32>>,
}
