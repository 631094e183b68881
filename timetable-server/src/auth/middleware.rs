use crate::auth::jwt::{verify_token, TokenKind};
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    use crate::models::User;
    use crate::schema::users::dsl::*;
    use diesel::prelude::*;

    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("Access token is required".to_string()))?;

    let claims = verify_token(token, &state.config.jwt.secret, TokenKind::Access)?;

    // Scoped so the pooled connection is released before the handler runs.
    let user = {
        let mut conn = state.db.get().map_err(|e| {
            tracing::error!("Auth Middleware - Failed to get DB connection: {}", e);
            AppError::from(e)
        })?;

        // A token for a since-deleted account is no longer honoured.
        users
            .filter(id.eq(claims.user_id))
            .select(User::as_select())
            .first::<User>(&mut conn)
            .optional()?
            .ok_or_else(|| {
                tracing::warn!("Auth Middleware - user {} no longer exists", claims.user_id);
                AppError::Unauthorized("User no longer exists".to_string())
            })?
    };

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
