use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::error::{AppError, AppResult};
use crate::models::{Department, NewDepartment, UpdateDepartment};
use crate::schema::department;

pub fn list_departments(conn: &mut SqliteConnection) -> AppResult<Vec<Department>> {
    Ok(department::table
        .select(Department::as_select())
        .order(department::name.asc())
        .load(conn)?)
}

pub fn get_department(conn: &mut SqliteConnection, dept_id: i32) -> AppResult<Department> {
    department::table
        .find(dept_id)
        .select(Department::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Department"))
}

pub fn create_department(
    conn: &mut SqliteConnection,
    new: &NewDepartment,
) -> AppResult<Department> {
    Ok(diesel::insert_into(department::table)
        .values(new)
        .returning(Department::as_returning())
        .get_result(conn)?)
}

pub fn update_department(
    conn: &mut SqliteConnection,
    dept_id: i32,
    changes: &UpdateDepartment,
) -> AppResult<Department> {
    diesel::update(department::table.find(dept_id))
        .set(changes)
        .returning(Department::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Department"))
}

pub fn delete_department(conn: &mut SqliteConnection, dept_id: i32) -> AppResult<()> {
    let deleted = diesel::delete(department::table.find(dept_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("Department"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn test_department_crud() {
        let (pool, _dir) = test_pool();
        let mut conn = pool.get().unwrap();

        let cs = create_department(&mut conn, &NewDepartment { name: "CS".into() }).unwrap();
        create_department(&mut conn, &NewDepartment { name: "Arts".into() }).unwrap();

        let names: Vec<String> = list_departments(&mut conn)
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Arts", "CS"]);

        let renamed = update_department(
            &mut conn,
            cs.id,
            &UpdateDepartment {
                name: Some("Computer Science".into()),
            },
        )
        .unwrap();
        assert_eq!(renamed.name, "Computer Science");

        delete_department(&mut conn, cs.id).unwrap();
        assert!(matches!(
            get_department(&mut conn, cs.id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_name_conflicts_and_empty_update_is_rejected() {
        let (pool, _dir) = test_pool();
        let mut conn = pool.get().unwrap();
        let d = create_department(&mut conn, &NewDepartment { name: "EE".into() }).unwrap();

        assert!(matches!(
            create_department(&mut conn, &NewDepartment { name: "EE".into() }),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            update_department(&mut conn, d.id, &UpdateDepartment { name: None }),
            Err(AppError::BadRequest(_))
        ));
    }
}
