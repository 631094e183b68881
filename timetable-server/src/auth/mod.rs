pub mod jwt;
pub mod middleware;
pub mod roles;

use bcrypt::{hash, verify};
use chrono::Duration;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{create_token, TokenKind};
use crate::auth::roles::{Permission, Role};
use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, NewUserRole, User};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub department_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    Ok(hash(password, cost)?)
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    Ok(verify(password, hash)?)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Unknown email and wrong password are indistinguishable to the caller.
pub fn authenticate_user(
    conn: &mut SqliteConnection,
    email: &str,
    password: &str,
) -> AppResult<User> {
    use crate::schema::users::dsl;

    let user = dsl::users
        .filter(dsl::email.eq(normalize_email(email)))
        .select(User::as_select())
        .first::<User>(conn)
        .optional()?
        .ok_or(AppError::InvalidCredentials)?;

    if verify_password(password, &user.password_hash)? {
        Ok(user)
    } else {
        Err(AppError::InvalidCredentials)
    }
}

/// Creates the account. The first account becomes admin; the user count and
/// the insert share one IMMEDIATE transaction so two first registrations
/// cannot both see an empty table.
pub fn register_user(
    conn: &mut SqliteConnection,
    req: &RegisterRequest,
    bcrypt_cost: u32,
) -> AppResult<User> {
    use crate::schema::{roles, user_roles, users};

    let password_hash = hash_password(&req.password, bcrypt_cost)?;
    let email = normalize_email(&req.email);

    conn.immediate_transaction(|conn| {
        let taken: i64 = users::table
            .filter(users::email.eq(&email))
            .count()
            .get_result(conn)?;
        if taken > 0 {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let existing: i64 = users::table.count().get_result(conn)?;
        let role = if existing == 0 {
            Role::Admin
        } else {
            match req.role {
                Some(Role::Admin) => {
                    return Err(AppError::Forbidden(
                        "Admin accounts can only be created by an administrator".to_string(),
                    ))
                }
                Some(requested) => requested,
                None => Role::Student,
            }
        };

        let new_user = NewUser {
            uid: uuid::Uuid::new_v4().to_string(),
            email: email.clone(),
            password_hash: password_hash.clone(),
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            role,
            department_id: req.department_id,
        };

        let user = diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(conn)?;

        let role_id: Option<i32> = roles::table
            .filter(roles::role_name.eq(role.as_str()))
            .select(roles::id)
            .first(conn)
            .optional()?;

        match role_id {
            Some(role_id) => {
                diesel::insert_into(user_roles::table)
                    .values(&NewUserRole {
                        user_id: user.uid.clone(),
                        role_id,
                    })
                    .execute(conn)?;
            }
            None => tracing::warn!("role '{}' missing from catalog; no user_roles row", role),
        }

        Ok(user)
    })
}

pub fn access_ttl(config: &JwtConfig) -> Duration {
    Duration::minutes(config.access_ttl_minutes)
}

pub fn refresh_ttl(config: &JwtConfig) -> Duration {
    Duration::days(config.refresh_ttl_days)
}

pub fn issue_access_token(user: &User, config: &JwtConfig) -> AppResult<AccessTokenResponse> {
    let access_token = create_token(
        user.id,
        &user.uid,
        &user.email,
        user.role,
        TokenKind::Access,
        &config.secret,
        access_ttl(config),
    )?;
    Ok(AccessTokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: config.access_ttl_minutes * 60,
    })
}

pub fn issue_tokens(user: User, config: &JwtConfig) -> AppResult<AuthResponse> {
    let access = issue_access_token(&user, config)?;
    let refresh_token = create_token(
        user.id,
        &user.uid,
        &user.email,
        user.role,
        TokenKind::Refresh,
        &config.secret,
        refresh_ttl(config),
    )?;
    Ok(AuthResponse {
        user,
        access_token: access.access_token,
        refresh_token,
        token_type: access.token_type,
        expires_in: access.expires_in,
    })
}

/// Fails with 403 unless the user's role carries one of `permissions`.
pub fn ensure_any(user: &User, permissions: &[Permission]) -> AppResult<()> {
    if user.role.has_any(permissions) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Role '{}' is not allowed to perform this action",
            user.role
        )))
    }
}

/// Like `ensure_any`, but a role whose grants from `permissions` are all
/// department-level may only touch rows of its own department. Rows without a
/// department are out of reach for such roles.
pub fn ensure_in_department(
    user: &User,
    permissions: &[Permission],
    department_id: Option<i32>,
) -> AppResult<()> {
    ensure_any(user, permissions)?;
    if permissions
        .iter()
        .any(|p| p.is_global() && user.role.has_permission(*p))
    {
        return Ok(());
    }
    match (user.department_id, department_id) {
        (Some(own), Some(target)) if own == target => Ok(()),
        _ => Err(AppError::Forbidden(format!(
            "Role '{}' may only manage records of its own department",
            user.role
        ))),
    }
}
