pub mod auth_api;
pub mod classes_api;
pub mod dashboard_api;
pub mod departments_api;
pub mod extract;
pub mod people_api;
pub mod roles_api;
pub mod rooms_api;
pub mod subjects_api;
pub mod teacher_subjects_api;
pub mod teachers_api;
pub mod time_slots_api;
pub mod timetable_api;
pub mod users_api;

#[cfg(test)]
mod api_test;

use crate::middleware::rate_limit::rate_limit;
use crate::AppState;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

pub fn routes(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .route("/auth/me", get(auth_api::me))
        // Departments
        .route(
            "/departments",
            get(departments_api::list_departments).post(departments_api::create_department),
        )
        .route(
            "/departments/:id",
            get(departments_api::get_department)
                .put(departments_api::update_department)
                .delete(departments_api::delete_department),
        )
        // Classes
        .route(
            "/classes",
            get(classes_api::list_classes).post(classes_api::create_class),
        )
        .route(
            "/classes/:id",
            get(classes_api::get_class)
                .put(classes_api::update_class)
                .delete(classes_api::delete_class),
        )
        // Teachers
        .route(
            "/teachers",
            get(teachers_api::list_teachers).post(teachers_api::create_teacher),
        )
        .route(
            "/teachers/:id",
            get(teachers_api::get_teacher)
                .put(teachers_api::update_teacher)
                .delete(teachers_api::delete_teacher),
        )
        .route(
            "/teachers/:id/subjects",
            put(teacher_subjects_api::replace_teacher_subjects),
        )
        // People
        .route(
            "/students",
            get(people_api::list_students).post(people_api::create_student),
        )
        .route(
            "/students/:id",
            get(people_api::get_student)
                .put(people_api::update_student)
                .delete(people_api::delete_student),
        )
        .route(
            "/hods",
            get(people_api::list_hods).post(people_api::create_hod),
        )
        .route(
            "/hods/:id",
            get(people_api::get_hod)
                .put(people_api::update_hod)
                .delete(people_api::delete_hod),
        )
        .route(
            "/coordinators",
            get(people_api::list_coordinators).post(people_api::create_coordinator),
        )
        .route(
            "/coordinators/:id",
            get(people_api::get_coordinator)
                .put(people_api::update_coordinator)
                .delete(people_api::delete_coordinator),
        )
        // Subjects
        .route(
            "/subjects",
            get(subjects_api::list_subjects).post(subjects_api::create_subject),
        )
        .route(
            "/subjects/:id",
            get(subjects_api::get_subject)
                .put(subjects_api::update_subject)
                .delete(subjects_api::delete_subject),
        )
        // Rooms
        .route(
            "/rooms",
            get(rooms_api::list_rooms).post(rooms_api::create_room),
        )
        .route(
            "/rooms/:id",
            get(rooms_api::get_room)
                .put(rooms_api::update_room)
                .delete(rooms_api::delete_room),
        )
        // Time slots
        .route(
            "/time-slots",
            get(time_slots_api::list_time_slots).post(time_slots_api::create_time_slot),
        )
        .route(
            "/time-slots/:id",
            get(time_slots_api::get_time_slot)
                .put(time_slots_api::update_time_slot)
                .delete(time_slots_api::delete_time_slot),
        )
        // Teacher <-> subject links
        .route(
            "/teacher-subjects",
            get(teacher_subjects_api::list_teacher_subjects)
                .post(teacher_subjects_api::create_teacher_subject),
        )
        .route(
            "/teacher-subjects/:id",
            put(teacher_subjects_api::update_teacher_subject)
                .delete(teacher_subjects_api::delete_teacher_subject),
        )
        .route(
            "/teacher-subjects/teacher/:teacher_id/subject/:subject_id",
            delete(teacher_subjects_api::delete_teacher_subject_pair),
        )
        .route(
            "/teacher-per-class",
            get(teacher_subjects_api::list_teacher_per_class)
                .post(teacher_subjects_api::create_teacher_per_class),
        )
        .route(
            "/teacher-per-class/:id",
            put(teacher_subjects_api::update_teacher_per_class)
                .delete(teacher_subjects_api::delete_teacher_per_class),
        )
        // Timetable
        .route(
            "/timetable-entries",
            get(timetable_api::list_entries).post(timetable_api::create_entry),
        )
        .route("/timetable-entries/batch", post(timetable_api::create_entries))
        .route(
            "/timetable-entries/:id",
            get(timetable_api::get_entry)
                .put(timetable_api::update_entry)
                .delete(timetable_api::delete_entry),
        )
        .route(
            "/timetable-entries/class/:class_id",
            put(timetable_api::replace_class).delete(timetable_api::clear_class),
        )
        .route("/timetable/generate", post(timetable_api::generate))
        .route(
            "/timetable/generate/payload",
            get(timetable_api::preview_payload),
        )
        // Roles
        .route(
            "/roles",
            get(roles_api::list_roles).post(roles_api::create_role),
        )
        .route("/roles/:id", delete(roles_api::delete_role))
        .route(
            "/user-roles",
            get(roles_api::list_user_roles).post(roles_api::assign_role),
        )
        .route("/user-roles/:id", delete(roles_api::remove_user_role))
        // Users
        .route(
            "/users",
            get(users_api::list_users).post(users_api::create_user),
        )
        .route(
            "/users/:id",
            get(users_api::get_user)
                .put(users_api::update_user)
                .delete(users_api::delete_user),
        )
        .route("/dashboard/stats", get(dashboard_api::stats))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::middleware::auth_middleware,
        ));

    let auth_routes = Router::new()
        .route("/auth/login", post(auth_api::login))
        .route("/auth/register", post(auth_api::register))
        .route("/auth/refresh", post(auth_api::refresh))
        .route("/auth/logout", post(auth_api::logout))
        .route_layer(middleware::from_fn_with_state(
            state.auth_limiter.clone(),
            rate_limit,
        ));

    Router::new().merge(auth_routes).merge(protected_routes)
}
