use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::models::{
    NewTeacherSubject, Subject, TeacherPerClass, TeacherPerClassPayload, TeacherSubject,
    UpdateTeacherSubject,
};
use crate::schema::{subjects, teacher_per_class, teacher_subjects};

#[derive(Debug, Default, Deserialize)]
pub struct TeacherSubjectFilter {
    pub teacher_id: Option<i32>,
    pub subject_id: Option<i32>,
    #[serde(default)]
    pub include_subject: bool,
}

#[derive(Debug, Serialize)]
pub struct TeacherSubjectView {
    #[serde(flatten)]
    pub link: TeacherSubject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
}

pub fn list_teacher_subjects(
    conn: &mut SqliteConnection,
    filter: &TeacherSubjectFilter,
) -> AppResult<Vec<TeacherSubjectView>> {
    let mut query = teacher_subjects::table
        .select(TeacherSubject::as_select())
        .into_boxed();

    if let Some(teacher) = filter.teacher_id {
        query = query.filter(teacher_subjects::teacher_id.eq(teacher));
    }
    if let Some(subject) = filter.subject_id {
        query = query.filter(teacher_subjects::subject_id.eq(subject));
    }

    let links: Vec<TeacherSubject> = query
        .order((
            teacher_subjects::teacher_id.asc(),
            teacher_subjects::created_at.asc(),
            teacher_subjects::id.asc(),
        ))
        .load(conn)?;

    let mut subjects_by_id: HashMap<i32, Subject> = HashMap::new();
    if filter.include_subject && !links.is_empty() {
        let ids: Vec<i32> = links.iter().map(|l| l.subject_id).collect();
        subjects_by_id = subjects::table
            .filter(subjects::id.eq_any(ids))
            .select(Subject::as_select())
            .load::<Subject>(conn)?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
    }

    Ok(links
        .into_iter()
        .map(|link| {
            let subject = subjects_by_id.get(&link.subject_id).cloned();
            TeacherSubjectView { link, subject }
        })
        .collect())
}

pub fn get_teacher_subject(conn: &mut SqliteConnection, link_id: i32) -> AppResult<TeacherSubject> {
    teacher_subjects::table
        .find(link_id)
        .select(TeacherSubject::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Teacher-subject link"))
}

pub fn create_teacher_subject(
    conn: &mut SqliteConnection,
    new: &NewTeacherSubject,
) -> AppResult<TeacherSubject> {
    Ok(diesel::insert_into(teacher_subjects::table)
        .values(new)
        .returning(TeacherSubject::as_returning())
        .get_result(conn)?)
}

pub fn update_teacher_subject(
    conn: &mut SqliteConnection,
    link_id: i32,
    changes: &UpdateTeacherSubject,
) -> AppResult<TeacherSubject> {
    diesel::update(teacher_subjects::table.find(link_id))
        .set(changes)
        .returning(TeacherSubject::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Teacher-subject link"))
}

pub fn delete_teacher_subject(conn: &mut SqliteConnection, link_id: i32) -> AppResult<()> {
    let deleted = diesel::delete(teacher_subjects::table.find(link_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("Teacher-subject link"));
    }
    Ok(())
}

/// Removes exactly the rows linking `teacher` and `subject`; returns how many went.
pub fn delete_teacher_subject_pair(
    conn: &mut SqliteConnection,
    teacher: i32,
    subject: i32,
) -> AppResult<usize> {
    let deleted = diesel::delete(
        teacher_subjects::table
            .filter(teacher_subjects::teacher_id.eq(teacher))
            .filter(teacher_subjects::subject_id.eq(subject)),
    )
    .execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("Teacher-subject link"));
    }
    Ok(deleted)
}

/// Delete phase of a bulk replace. Not atomic with the insert phase on its own.
pub fn delete_teacher_subjects_for_teacher(
    conn: &mut SqliteConnection,
    teacher: i32,
) -> AppResult<usize> {
    Ok(
        diesel::delete(teacher_subjects::table.filter(teacher_subjects::teacher_id.eq(teacher)))
            .execute(conn)?,
    )
}

/// Insert phase of a bulk replace; stops at the first failing row.
pub fn insert_teacher_subjects(
    conn: &mut SqliteConnection,
    teacher: i32,
    subject_ids: &[i32],
) -> AppResult<Vec<TeacherSubject>> {
    let mut created = Vec::with_capacity(subject_ids.len());
    for subject in subject_ids {
        created.push(create_teacher_subject(
            conn,
            &NewTeacherSubject {
                teacher_id: teacher,
                subject_id: *subject,
            },
        )?);
    }
    Ok(created)
}

/// Swaps a teacher's whole subject set in one transaction: on any failure the
/// previous links are kept.
pub fn replace_teacher_subjects(
    conn: &mut SqliteConnection,
    teacher: i32,
    subject_ids: &[i32],
) -> AppResult<Vec<TeacherSubject>> {
    let mut unique: Vec<i32> = Vec::with_capacity(subject_ids.len());
    for id in subject_ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }

    conn.immediate_transaction(|conn| {
        let removed = delete_teacher_subjects_for_teacher(conn, teacher)?;
        let created = insert_teacher_subjects(conn, teacher, &unique)?;
        tracing::info!(
            "Replaced subjects for teacher {}: removed {}, inserted {}",
            teacher,
            removed,
            created.len()
        );
        Ok(created)
    })
}

// Teacher-subject pairings assigned to classes

#[derive(Debug, Default, Deserialize)]
pub struct TeacherPerClassFilter {
    pub class_id: Option<i32>,
    pub teacher_subject_id: Option<i32>,
    pub department_id: Option<i32>,
}

pub fn list_teacher_per_class(
    conn: &mut SqliteConnection,
    filter: &TeacherPerClassFilter,
) -> AppResult<Vec<TeacherPerClass>> {
    let mut query = teacher_per_class::table
        .select(TeacherPerClass::as_select())
        .into_boxed();

    if let Some(class) = filter.class_id {
        query = query.filter(teacher_per_class::class_id.eq(class));
    }
    if let Some(link) = filter.teacher_subject_id {
        query = query.filter(teacher_per_class::teacher_subject_id.eq(link));
    }
    if let Some(dept) = filter.department_id {
        query = query.filter(teacher_per_class::department_id.eq(dept));
    }

    Ok(query
        .order((
            teacher_per_class::class_id.asc(),
            teacher_per_class::created_at.asc(),
            teacher_per_class::id.asc(),
        ))
        .load(conn)?)
}

pub fn get_teacher_per_class(conn: &mut SqliteConnection, row_id: i32) -> AppResult<TeacherPerClass> {
    teacher_per_class::table
        .find(row_id)
        .select(TeacherPerClass::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Class assignment"))
}

pub fn create_teacher_per_class(
    conn: &mut SqliteConnection,
    new: &TeacherPerClassPayload,
) -> AppResult<TeacherPerClass> {
    Ok(diesel::insert_into(teacher_per_class::table)
        .values(new)
        .returning(TeacherPerClass::as_returning())
        .get_result(conn)?)
}

pub fn update_teacher_per_class(
    conn: &mut SqliteConnection,
    row_id: i32,
    changes: &TeacherPerClassPayload,
) -> AppResult<TeacherPerClass> {
    diesel::update(teacher_per_class::table.find(row_id))
        .set(changes)
        .returning(TeacherPerClass::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Class assignment"))
}

pub fn delete_teacher_per_class(conn: &mut SqliteConnection, row_id: i32) -> AppResult<()> {
    let deleted = diesel::delete(teacher_per_class::table.find(row_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("Class assignment"));
    }
    Ok(())
}
