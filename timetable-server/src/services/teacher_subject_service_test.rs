use crate::db::test_pool;
use crate::error::AppError;
use crate::models::{NewTeacherSubject, TeacherPerClassPayload};
use crate::services::teacher_subject_service::*;
use crate::services::test_fixtures::campus;

fn links_of(conn: &mut diesel::SqliteConnection, teacher: i32) -> Vec<i32> {
    list_teacher_subjects(
        conn,
        &TeacherSubjectFilter {
            teacher_id: Some(teacher),
            ..Default::default()
        },
    )
    .unwrap()
    .into_iter()
    .map(|v| v.link.subject_id)
    .collect()
}

#[test]
fn test_delete_pair_removes_only_matching_row() {
    let (pool, _dir) = test_pool();
    let mut conn = pool.get().unwrap();
    let c = campus(&mut conn);
    let (t1, t2) = (c.teachers[0].id, c.teachers[1].id);
    let (s1, s2) = (c.subjects[0].id, c.subjects[1].id);

    for (teacher_id, subject_id) in [(t1, s1), (t1, s2), (t2, s1)] {
        create_teacher_subject(
            &mut conn,
            &NewTeacherSubject {
                teacher_id,
                subject_id,
            },
        )
        .unwrap();
    }

    assert_eq!(delete_teacher_subject_pair(&mut conn, t1, s1).unwrap(), 1);

    assert_eq!(links_of(&mut conn, t1), vec![s2]);
    assert_eq!(links_of(&mut conn, t2), vec![s1]);

    assert!(matches!(
        delete_teacher_subject_pair(&mut conn, t1, s1),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn test_uncoordinated_replace_leaves_no_links_when_insert_fails() {
    let (pool, _dir) = test_pool();
    let mut conn = pool.get().unwrap();
    let c = campus(&mut conn);
    let teacher = c.teachers[0].id;

    insert_teacher_subjects(&mut conn, teacher, &[c.subjects[0].id, c.subjects[1].id]).unwrap();

    // Delete and insert as two independent calls, with the insert failing.
    delete_teacher_subjects_for_teacher(&mut conn, teacher).unwrap();
    let failed = insert_teacher_subjects(&mut conn, teacher, &[9_999, c.subjects[2].id]);
    assert!(failed.is_err());

    assert!(links_of(&mut conn, teacher).is_empty());
}

#[test]
fn test_transactional_replace_rolls_back_on_failure() {
    let (pool, _dir) = test_pool();
    let mut conn = pool.get().unwrap();
    let c = campus(&mut conn);
    let teacher = c.teachers[0].id;
    let before = vec![c.subjects[0].id, c.subjects[1].id];

    insert_teacher_subjects(&mut conn, teacher, &before).unwrap();

    let result = replace_teacher_subjects(&mut conn, teacher, &[c.subjects[2].id, 9_999]);
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    assert_eq!(links_of(&mut conn, teacher), before);
}

#[test]
fn test_transactional_replace_swaps_set_and_dedups() {
    let (pool, _dir) = test_pool();
    let mut conn = pool.get().unwrap();
    let c = campus(&mut conn);
    let teacher = c.teachers[1].id;

    insert_teacher_subjects(&mut conn, teacher, &[c.subjects[0].id]).unwrap();
    let created = replace_teacher_subjects(
        &mut conn,
        teacher,
        &[c.subjects[2].id, c.subjects[1].id, c.subjects[2].id],
    )
    .unwrap();

    assert_eq!(created.len(), 2);
    assert_eq!(
        links_of(&mut conn, teacher),
        vec![c.subjects[2].id, c.subjects[1].id]
    );
}

#[test]
fn test_include_subject_attaches_details() {
    let (pool, _dir) = test_pool();
    let mut conn = pool.get().unwrap();
    let c = campus(&mut conn);
    insert_teacher_subjects(&mut conn, c.teachers[0].id, &[c.subjects[1].id]).unwrap();

    let views = list_teacher_subjects(
        &mut conn,
        &TeacherSubjectFilter {
            teacher_id: Some(c.teachers[0].id),
            include_subject: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(
        views[0].subject.as_ref().map(|s| s.subject_code.as_str()),
        Some("CS201L")
    );
}

#[test]
fn test_teacher_per_class_filters_by_class() {
    let (pool, _dir) = test_pool();
    let mut conn = pool.get().unwrap();
    let c = campus(&mut conn);
    let link = insert_teacher_subjects(&mut conn, c.teachers[0].id, &[c.subjects[0].id])
        .unwrap()
        .remove(0);

    for class in &c.classes {
        create_teacher_per_class(
            &mut conn,
            &TeacherPerClassPayload {
                teacher_subject_id: Some(link.id),
                class_id: Some(class.id),
                department_id: Some(c.department.id),
            },
        )
        .unwrap();
    }

    let rows = list_teacher_per_class(
        &mut conn,
        &TeacherPerClassFilter {
            class_id: Some(c.classes[1].id),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].teacher_subject_id, Some(link.id));
}

#[test]
fn test_duplicate_link_conflicts() {
    let (pool, _dir) = test_pool();
    let mut conn = pool.get().unwrap();
    let c = campus(&mut conn);
    let pair = NewTeacherSubject {
        teacher_id: c.teachers[0].id,
        subject_id: c.subjects[0].id,
    };

    create_teacher_subject(&mut conn, &pair).unwrap();
    assert!(matches!(
        create_teacher_subject(&mut conn, &pair),
        Err(AppError::Conflict(_))
    ));
    assert_eq!(links_of(&mut conn, c.teachers[0].id), vec![c.subjects[0].id]);
}
