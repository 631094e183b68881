use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Deserialize;
use validator::Validate;

use crate::auth::hash_password;
use crate::auth::roles::Role;
use crate::error::{AppError, AppResult};
use crate::models::{nullable, NewUser, NewUserRole, User};
use crate::schema::{roles, user_roles, users};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: Option<String>,
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "nullable")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub department_id: Option<Option<i32>>,
}

#[derive(AsChangeset)]
#[diesel(table_name = users)]
struct UserChanges {
    email: Option<String>,
    password_hash: Option<String>,
    role: Option<Role>,
    first_name: Option<Option<String>>,
    last_name: Option<Option<String>>,
    department_id: Option<Option<i32>>,
    updated_at: chrono::NaiveDateTime,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub department_id: Option<i32>,
}

pub fn list_users(conn: &mut SqliteConnection, filter: &UserFilter) -> AppResult<Vec<User>> {
    let mut query = users::table.select(User::as_select()).into_boxed();
    if let Some(r) = filter.role {
        query = query.filter(users::role.eq(r));
    }
    if let Some(dept) = filter.department_id {
        query = query.filter(users::department_id.eq(dept));
    }
    Ok(query.order(users::id.asc()).load(conn)?)
}

pub fn get_user(conn: &mut SqliteConnection, user_id: i32) -> AppResult<User> {
    users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("User"))
}

/// Points the user's `user_roles` assignment at `role`.
fn sync_user_role(conn: &mut SqliteConnection, uid: &str, role: Role) -> AppResult<()> {
    diesel::delete(user_roles::table.filter(user_roles::user_id.eq(uid))).execute(conn)?;

    let role_id: Option<i32> = roles::table
        .filter(roles::role_name.eq(role.as_str()))
        .select(roles::id)
        .first(conn)
        .optional()?;

    if let Some(role_id) = role_id {
        diesel::insert_into(user_roles::table)
            .values(&NewUserRole {
                user_id: uid.to_string(),
                role_id,
            })
            .execute(conn)?;
    }
    Ok(())
}

pub fn create_user(
    conn: &mut SqliteConnection,
    req: &CreateUserRequest,
    bcrypt_cost: u32,
) -> AppResult<User> {
    let password_hash = hash_password(&req.password, bcrypt_cost)?;

    conn.immediate_transaction(|conn| {
        let user = diesel::insert_into(users::table)
            .values(&NewUser {
                uid: uuid::Uuid::new_v4().to_string(),
                email: req.email.trim().to_ascii_lowercase(),
                password_hash: password_hash.clone(),
                first_name: req.first_name.clone(),
                last_name: req.last_name.clone(),
                role: req.role,
                department_id: req.department_id,
            })
            .returning(User::as_returning())
            .get_result(conn)?;
        sync_user_role(conn, &user.uid, user.role)?;
        Ok(user)
    })
}

fn ensure_not_last_admin(conn: &mut SqliteConnection, target: &User) -> AppResult<()> {
    if !target.is_admin() {
        return Ok(());
    }
    let admins: i64 = users::table
        .filter(users::role.eq(Role::Admin))
        .count()
        .get_result(conn)?;
    if admins <= 1 {
        return Err(AppError::BadRequest(
            "At least one administrator must remain".to_string(),
        ));
    }
    Ok(())
}

pub fn update_user(
    conn: &mut SqliteConnection,
    user_id: i32,
    req: &UpdateUserRequest,
    bcrypt_cost: u32,
) -> AppResult<User> {
    if req.email.is_none()
        && req.password.is_none()
        && req.role.is_none()
        && req.first_name.is_none()
        && req.last_name.is_none()
        && req.department_id.is_none()
    {
        return Err(AppError::BadRequest(
            "No fields provided to update".to_string(),
        ));
    }

    let password_hash = match &req.password {
        Some(p) => Some(hash_password(p, bcrypt_cost)?),
        None => None,
    };

    conn.immediate_transaction(|conn| {
        let target = get_user(conn, user_id)?;

        // Safeguard: demoting an admin requires another admin to remain
        if matches!(req.role, Some(r) if r != Role::Admin) {
            ensure_not_last_admin(conn, &target)?;
        }

        let changes = UserChanges {
            email: req.email.as_ref().map(|e| e.trim().to_ascii_lowercase()),
            password_hash: password_hash.clone(),
            role: req.role,
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            department_id: req.department_id,
            updated_at: Utc::now().naive_utc(),
        };

        let updated = diesel::update(users::table.find(user_id))
            .set(&changes)
            .returning(User::as_returning())
            .get_result(conn)?;

        if updated.role != target.role {
            sync_user_role(conn, &updated.uid, updated.role)?;
        }
        Ok(updated)
    })
}

pub fn delete_user(conn: &mut SqliteConnection, user_id: i32) -> AppResult<()> {
    conn.immediate_transaction(|conn| {
        let target = get_user(conn, user_id)?;
        ensure_not_last_admin(conn, &target)?;
        diesel::delete(users::table.find(user_id)).execute(conn)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::seeding::seed_defaults;

    fn create(conn: &mut SqliteConnection, email: &str, role: Role) -> User {
        create_user(
            conn,
            &CreateUserRequest {
                email: email.into(),
                password: "password1".into(),
                role,
                first_name: None,
                last_name: None,
                department_id: None,
            },
            4,
        )
        .unwrap()
    }

    #[test]
    fn test_last_admin_cannot_be_demoted_or_deleted() {
        let (pool, _dir) = test_pool();
        let mut conn = pool.get().unwrap();
        let admin = create(&mut conn, "admin@uni.edu", Role::Admin);

        let demote = UpdateUserRequest {
            role: Some(Role::Teacher),
            ..Default::default()
        };
        assert!(matches!(
            update_user(&mut conn, admin.id, &demote, 4),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            delete_user(&mut conn, admin.id),
            Err(AppError::BadRequest(_))
        ));

        create(&mut conn, "second-admin@uni.edu", Role::Admin);
        let demoted = update_user(&mut conn, admin.id, &demote, 4).unwrap();
        assert_eq!(demoted.role, Role::Teacher);
    }

    #[test]
    fn test_role_change_moves_user_role_row() {
        let (pool, _dir) = test_pool();
        seed_defaults(&pool).unwrap();
        let mut conn = pool.get().unwrap();
        let user = create(&mut conn, "t@uni.edu", Role::Teacher);

        update_user(
            &mut conn,
            user.id,
            &UpdateUserRequest {
                role: Some(Role::Hod),
                ..Default::default()
            },
            4,
        )
        .unwrap();

        let names: Vec<String> = user_roles::table
            .inner_join(roles::table)
            .filter(user_roles::user_id.eq(&user.uid))
            .select(roles::role_name)
            .load(&mut conn)
            .unwrap();
        assert_eq!(names, vec!["hod".to_string()]);
    }

    #[test]
    fn test_deleting_user_cascades_role_assignments() {
        let (pool, _dir) = test_pool();
        seed_defaults(&pool).unwrap();
        let mut conn = pool.get().unwrap();
        create(&mut conn, "keep@uni.edu", Role::Admin);
        let student = create(&mut conn, "s@uni.edu", Role::Student);

        delete_user(&mut conn, student.id).unwrap();
        let left: i64 = user_roles::table
            .filter(user_roles::user_id.eq(&student.uid))
            .count()
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(left, 0);
    }
}
