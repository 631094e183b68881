use axum::{body::Bytes, extract::State, response::IntoResponse, Extension};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use diesel::prelude::*;
use serde_json::json;
use validator::Validate;

use crate::api::extract::ValidatedJson;
use crate::auth::jwt::{verify_token, TokenKind};
use crate::auth::{
    authenticate_user, issue_access_token, issue_tokens, refresh_ttl, register_user,
    AccessTokenResponse, LoginRequest, RefreshRequest, RegisterRequest,
};
use crate::config::JwtConfig;
use crate::error::{AppError, AppResult, FieldError};
use crate::models::User;
use crate::response::ApiResponse;
use crate::AppState;

pub const REFRESH_COOKIE: &str = "refresh_token";
const REFRESH_COOKIE_PATH: &str = "/api/auth";

fn refresh_cookie(token: String, config: &JwtConfig) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path(REFRESH_COOKIE_PATH)
        .max_age(time::Duration::seconds(refresh_ttl(config).num_seconds()))
        .build()
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = state.db.clone();
    // bcrypt is CPU bound
    let user = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        authenticate_user(&mut conn, &req.email, &req.password)
    })
    .await??;

    let auth = issue_tokens(user, &state.config.jwt)?;
    tracing::info!("User {} logged in", auth.user.id);

    let jar = jar.add(refresh_cookie(auth.refresh_token.clone(), &state.config.jwt));
    Ok((jar, ApiResponse::ok("Login successful", auth)))
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = state.db.clone();
    let cost = state.config.jwt.bcrypt_cost;
    let user = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        register_user(&mut conn, &req, cost)
    })
    .await??;

    tracing::info!("Registered user {} with role {}", user.id, user.role);
    let auth = issue_tokens(user, &state.config.jwt)?;

    let jar = jar.add(refresh_cookie(auth.refresh_token.clone(), &state.config.jwt));
    Ok((jar, ApiResponse::created("User registered successfully", auth)))
}

/// Tokens are stateless: an issued access token stays valid until it expires.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(REFRESH_COOKIE).path(REFRESH_COOKIE_PATH));
    (jar, ApiResponse::ok("Logged out successfully", json!(null)))
}

/// Refresh token from the JSON body, falling back to the `refresh_token` cookie.
/// An empty body is a cookie-only refresh; a body that is not JSON is rejected.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<ApiResponse<AccessTokenResponse>> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        serde_json::from_slice::<RefreshRequest>(&body).map_err(|e| {
            AppError::validation(format!("Failed to parse the request body as JSON: {}", e))
        })?
    };
    req.validate()?;

    let token = req
        .refresh_token
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation {
            message: "Validation failed".to_string(),
            errors: vec![FieldError {
                field: "refresh_token".to_string(),
                message: "Refresh token is required".to_string(),
            }],
        })?;

    let claims = verify_token(&token, &state.config.jwt.secret, TokenKind::Refresh)?;

    let user = {
        use crate::schema::users::dsl::*;
        let mut conn = state.db.get()?;
        users
            .filter(id.eq(claims.user_id))
            .select(User::as_select())
            .first::<User>(&mut conn)
            .optional()?
            .ok_or(AppError::InvalidToken)?
    };

    let access = issue_access_token(&user, &state.config.jwt)?;
    Ok(ApiResponse::ok("Token refreshed successfully", access))
}

pub async fn me(Extension(user): Extension<User>) -> ApiResponse<User> {
    ApiResponse::ok("Current user retrieved successfully", user)
}
