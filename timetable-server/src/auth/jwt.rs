use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::roles::Role;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user uid
    pub user_id: i32,
    pub email: String,
    pub role: Role,
    pub token_type: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

pub fn create_token(
    user_id: i32,
    uid: &str,
    email: &str,
    role: Role,
    kind: TokenKind,
    secret: &str,
    ttl: Duration,
) -> AppResult<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal("token expiry out of range".to_string()))?
        .timestamp();

    let claims = Claims {
        sub: uid.to_owned(),
        user_id,
        email: email.to_owned(),
        role,
        token_type: kind,
        iat: now.timestamp(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
}

/// Expired, malformed, badly signed and wrong-kind tokens all yield `InvalidToken`.
pub fn verify_token(token: &str, secret: &str, kind: TokenKind) -> AppResult<Claims> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("token rejected: {}", e);
        AppError::InvalidToken
    })?;

    if claims.token_type != kind {
        return Err(AppError::InvalidToken);
    }
    Ok(claims)
}
