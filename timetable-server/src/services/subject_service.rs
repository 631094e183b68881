use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{NewSubject, Subject, SubjectType, UpdateSubject};
use crate::schema::subjects;

#[derive(Debug, Default, Deserialize)]
pub struct SubjectFilter {
    pub department_id: Option<i32>,
    pub semester: Option<i32>,
    #[serde(rename = "type")]
    pub subject_type: Option<SubjectType>,
}

pub fn list_subjects(
    conn: &mut SqliteConnection,
    filter: &SubjectFilter,
) -> AppResult<Vec<Subject>> {
    let mut query = subjects::table.select(Subject::as_select()).into_boxed();

    if let Some(dept) = filter.department_id {
        query = query.filter(subjects::department_id.eq(dept));
    }
    if let Some(sem) = filter.semester {
        query = query.filter(subjects::semester.eq(sem));
    }
    if let Some(kind) = filter.subject_type {
        query = query.filter(subjects::subject_type.eq(kind));
    }

    Ok(query.order(subjects::id.asc()).load(conn)?)
}

pub fn get_subject(conn: &mut SqliteConnection, subject_id: i32) -> AppResult<Subject> {
    subjects::table
        .find(subject_id)
        .select(Subject::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Subject"))
}

pub fn create_subject(conn: &mut SqliteConnection, new: &NewSubject) -> AppResult<Subject> {
    Ok(diesel::insert_into(subjects::table)
        .values(new)
        .returning(Subject::as_returning())
        .get_result(conn)?)
}

pub fn update_subject(
    conn: &mut SqliteConnection,
    subject_id: i32,
    changes: &UpdateSubject,
) -> AppResult<Subject> {
    diesel::update(subjects::table.find(subject_id))
        .set(changes)
        .returning(Subject::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Subject"))
}

pub fn delete_subject(conn: &mut SqliteConnection, subject_id: i32) -> AppResult<()> {
    let deleted = diesel::delete(subjects::table.find(subject_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("Subject"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn subject(code: &str, kind: SubjectType) -> NewSubject {
        NewSubject {
            subject_name: format!("Subject {}", code),
            subject_code: code.to_string(),
            semester: Some(3),
            subject_type: Some(kind),
            credits: Some(4),
            hours_per_week: Some(4),
            department_id: None,
        }
    }

    #[test]
    fn test_filter_by_type_reads_enum_back() {
        let (pool, _dir) = test_pool();
        let mut conn = pool.get().unwrap();
        create_subject(&mut conn, &subject("CS301", SubjectType::Theory)).unwrap();
        create_subject(&mut conn, &subject("CS302L", SubjectType::Lab)).unwrap();

        let labs = list_subjects(
            &mut conn,
            &SubjectFilter {
                subject_type: Some(SubjectType::Lab),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(labs.len(), 1);
        assert_eq!(labs[0].subject_code, "CS302L");
        assert_eq!(labs[0].subject_type, Some(SubjectType::Lab));
    }

    #[test]
    fn test_duplicate_code_conflicts() {
        let (pool, _dir) = test_pool();
        let mut conn = pool.get().unwrap();
        create_subject(&mut conn, &subject("MA101", SubjectType::Theory)).unwrap();
        let mut again = subject("MA101", SubjectType::Theory);
        again.subject_name = "Different name".into();
        assert!(matches!(
            create_subject(&mut conn, &again),
            Err(AppError::Conflict(_))
        ));
    }
}
