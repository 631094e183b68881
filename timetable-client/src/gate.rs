//! Screen-level access decisions, read from the local session only. The server
//! enforces write permissions on its own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Hod,
    Coordinator,
    Teacher,
    Student,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
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

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Hod => "hod",
            Role::Coordinator => "coordinator",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    /// Same table the server checks writes against.
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    RedirectToLogin,
    AccessDenied,
}

/// An empty `allowed_roles` admits any signed-in user.
pub fn authorize(session: &Session, allowed_roles: &[Role]) -> Access {
    let Some(user) = session.user() else {
        return Access::RedirectToLogin;
    };
    if allowed_roles.is_empty() || allowed_roles.contains(&user.role) {
        Access::Allow
    } else {
        Access::AccessDenied
    }
}

/// Action-level check against the permission table: allowed when the role
/// holds any of `permissions`.
pub fn authorize_action(session: &Session, permissions: &[Permission]) -> Access {
    let Some(user) = session.user() else {
        return Access::RedirectToLogin;
    };
    if permissions.iter().any(|p| user.role.has_permission(*p)) {
        Access::Allow
    } else {
        Access::AccessDenied
    }
}

/// Client screens and the roles they admit.
pub const SCREENS: &[(&str, &[Role])] = &[
    ("dashboard", &[]),
    ("users", &[Role::Admin]),
    ("departments", &[Role::Admin]),
    ("rooms", &[Role::Admin]),
    ("teachers", &[Role::Admin, Role::Hod]),
    ("subjects", &[Role::Admin, Role::Hod]),
    ("classes", &[Role::Admin, Role::Hod]),
    ("timetable", &[Role::Admin, Role::Hod, Role::Coordinator]),
    ("schedule", &[Role::Teacher]),
    ("class-schedule", &[Role::Student]),
];

pub fn screen_roles(screen: &str) -> Option<&'static [Role]> {
    SCREENS
        .iter()
        .find(|(name, _)| *name == screen)
        .map(|(_, roles)| *roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CurrentUser;

    fn session_as(role: Role) -> Session {
        Session::signed_in(
            CurrentUser {
                id: 1,
                uid: "u-1".into(),
                email: "someone@uni.edu".into(),
                first_name: None,
                last_name: None,
                role,
                department_id: None,
            },
            "access".into(),
            Some("refresh".into()),
        )
    }

    #[test]
    fn test_anonymous_is_sent_to_login() {
        assert_eq!(authorize(&Session::default(), &[]), Access::RedirectToLogin);
        assert_eq!(
            authorize(&Session::default(), &[Role::Admin]),
            Access::RedirectToLogin
        );
    }

    #[test]
    fn test_roles_outside_the_list_are_denied() {
        assert_eq!(authorize(&session_as(Role::Admin), &[Role::Admin]), Access::Allow);
        assert_eq!(
            authorize(&session_as(Role::Student), &[Role::Admin, Role::Hod]),
            Access::AccessDenied
        );
        assert_eq!(authorize(&session_as(Role::Student), &[]), Access::Allow);
    }

    #[test]
    fn test_screen_table() {
        let timetable = screen_roles("timetable").unwrap();
        assert_eq!(authorize(&session_as(Role::Coordinator), timetable), Access::Allow);
        assert_eq!(authorize(&session_as(Role::Teacher), timetable), Access::AccessDenied);
        assert!(screen_roles("nowhere").is_none());
    }

    #[test]
    fn test_action_check_uses_permission_table() {
        let generate = [Permission::ManageTimetables, Permission::CreateTimetables];
        assert_eq!(authorize_action(&session_as(Role::Hod), &generate), Access::Allow);
        assert_eq!(authorize_action(&session_as(Role::Admin), &generate), Access::Allow);
        assert_eq!(
            authorize_action(&session_as(Role::Teacher), &generate),
            Access::AccessDenied
        );
        assert_eq!(
            authorize_action(&Session::default(), &generate),
            Access::RedirectToLogin
        );
    }

    #[test]
    fn test_permission_table_matches_role_scope() {
        assert!(Role::Admin.has_permission(Permission::ManageTimetables));
        assert!(!Role::Admin.has_permission(Permission::ManageDepartmentClasses));
        assert!(Role::Hod.has_permission(Permission::CreateTimetables));
        assert!(!Role::Student.has_permission(Permission::ViewSchedule));
        assert_eq!("HOD".parse::<Role>().unwrap(), Role::Hod);
    }
}
