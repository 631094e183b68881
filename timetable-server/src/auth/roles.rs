use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Hod,
    Coordinator,
    Teacher,
    Student,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageUsers,
    ManageDepartments,
    ManageTeachers,
    ManageSubjects,
    ManageClasses,
    ManageRooms,
    ManageTimetables,
    ViewAll,
    ManageDepartmentTeachers,
    ManageDepartmentSubjects,
    ManageDepartmentClasses,
    CreateTimetables,
    EditTimetables,
    ViewDepartment,
    ViewSchedule,
    ViewClasses,
    UpdateProfile,
    ViewClassSchedule,
    ViewProfile,
}

impl Permission {
    /// Grants that reach every department. The rest are confined to the
    /// holder's own department.
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            Permission::ManageUsers
                | Permission::ManageDepartments
                | Permission::ManageTeachers
                | Permission::ManageSubjects
                | Permission::ManageClasses
                | Permission::ManageRooms
                | Permission::ManageTimetables
                | Permission::ViewAll
        )
    }
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Role::Admin,
        Role::Hod,
        Role::Coordinator,
        Role::Teacher,
        Role::Student,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Hod => "hod",
            Role::Coordinator => "coordinator",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Admin => &[
                ManageUsers,
                ManageDepartments,
                ManageTeachers,
                ManageSubjects,
                ManageClasses,
                ManageRooms,
                ManageTimetables,
                ViewAll,
            ],
            Role::Hod => &[
                ManageDepartmentTeachers,
                ManageDepartmentSubjects,
                ManageDepartmentClasses,
                CreateTimetables,
                ViewDepartment,
            ],
            Role::Coordinator => &[CreateTimetables, EditTimetables, ViewDepartment],
            Role::Teacher => &[ViewSchedule, ViewClasses, UpdateProfile],
            Role::Student => &[ViewClassSchedule, ViewProfile],
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// True when the role holds at least one of `permissions`.
    pub fn has_any(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(*p))
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "hod" => Ok(Role::Hod),
            "coordinator" => Ok(Role::Coordinator),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql<Text, Sqlite> for Role {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for Role {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        raw.parse().map_err(Into::into)
    }
}

// Permission groups guarding write routes.
pub const DEPARTMENT_WRITE: &[Permission] = &[Permission::ManageDepartments];
pub const TEACHER_WRITE: &[Permission] = &[
    Permission::ManageTeachers,
    Permission::ManageDepartmentTeachers,
];
pub const SUBJECT_WRITE: &[Permission] = &[
    Permission::ManageSubjects,
    Permission::ManageDepartmentSubjects,
];
pub const CLASS_WRITE: &[Permission] = &[
    Permission::ManageClasses,
    Permission::ManageDepartmentClasses,
];
pub const ROOM_WRITE: &[Permission] = &[Permission::ManageRooms];
pub const PEOPLE_WRITE: &[Permission] = &[Permission::ManageUsers];
pub const TIMETABLE_WRITE: &[Permission] = &[
    Permission::ManageTimetables,
    Permission::CreateTimetables,
    Permission::EditTimetables,
];
pub const TIMETABLE_GENERATE: &[Permission] = &[
    Permission::ManageTimetables,
    Permission::CreateTimetables,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_manages_everything_but_department_scoped_perms() {
        assert!(Role::Admin.has_permission(Permission::ManageUsers));
        assert!(Role::Admin.has_any(TIMETABLE_WRITE));
        assert!(!Role::Admin.has_permission(Permission::ManageDepartmentClasses));
    }

    #[test]
    fn test_only_admin_holds_global_write_grants() {
        for group in [TEACHER_WRITE, SUBJECT_WRITE, CLASS_WRITE, TIMETABLE_WRITE] {
            assert!(group
                .iter()
                .any(|p| p.is_global() && Role::Admin.has_permission(*p)));
            for role in [Role::Hod, Role::Coordinator] {
                assert!(!group.iter().any(|p| p.is_global() && role.has_permission(*p)));
            }
        }
    }

    #[test]
    fn test_department_roles() {
        assert!(Role::Hod.has_any(SUBJECT_WRITE));
        assert!(Role::Hod.has_any(TIMETABLE_GENERATE));
        assert!(!Role::Hod.has_any(ROOM_WRITE));
        assert!(Role::Coordinator.has_any(TIMETABLE_WRITE));
        assert!(!Role::Coordinator.has_any(TEACHER_WRITE));
    }

    #[test]
    fn test_teacher_and_student_are_read_only() {
        for role in [Role::Teacher, Role::Student] {
            for group in [
                DEPARTMENT_WRITE,
                TEACHER_WRITE,
                SUBJECT_WRITE,
                CLASS_WRITE,
                ROOM_WRITE,
                PEOPLE_WRITE,
                TIMETABLE_WRITE,
            ] {
                assert!(!role.has_any(group), "{} should not write", role);
            }
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("HOD".parse::<Role>().unwrap(), Role::Hod);
        assert!("superuser".parse::<Role>().is_err());
        assert_eq!(
            serde_json::to_string(&Role::Coordinator).unwrap(),
            "\"coordinator\""
        );
    }
}
