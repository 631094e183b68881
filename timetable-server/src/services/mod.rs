pub mod class_service;
pub mod dashboard_service;
pub mod department_service;
pub mod generation;
pub mod people_service;
pub mod role_service;
pub mod room_service;
pub mod subject_service;
pub mod teacher_service;
pub mod teacher_subject_service;
pub mod time_slot_service;
pub mod timetable_service;
pub mod user_service;

#[cfg(test)]
mod teacher_subject_service_test;
#[cfg(test)]
pub(crate) mod test_fixtures;
