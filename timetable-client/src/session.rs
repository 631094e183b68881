use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, RwLock};

use crate::api::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::gate::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i32,
    pub uid: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub department_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    user: CurrentUser,
    access_token: String,
    refresh_token: String,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<CurrentUser>,
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl Session {
    pub fn signed_in(user: CurrentUser, access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            user: Some(user),
            access_token: Some(access_token),
            refresh_token,
        }
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.access_token.is_some()
    }
}

/// Holds the signed-in user and hands its tokens to the API client, which
/// refreshes the access token on its own.
pub struct SessionStore {
    api: Arc<ApiClient>,
    session: RwLock<Session>,
}

impl SessionStore {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            session: RwLock::new(Session::default()),
        }
    }

    pub fn snapshot(&self) -> Session {
        let mut session = self.session.read().unwrap_or_else(|e| e.into_inner()).clone();
        if session.user.is_some() {
            session.access_token = self.api.token();
        }
        session
    }

    fn replace(&self, session: Session) {
        self.api.set_token(session.access_token.clone());
        self.api.set_refresh_token(session.refresh_token.clone());
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = session;
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<CurrentUser> {
        let auth: AuthResponse = self
            .api
            .post("auth/login", &json!({ "email": email, "password": password }))
            .await?;
        tracing::info!("Signed in as {} ({})", auth.user.email, auth.user.role);

        let user = auth.user.clone();
        self.replace(Session::signed_in(
            auth.user,
            auth.access_token,
            Some(auth.refresh_token),
        ));
        Ok(user)
    }

    /// Re-reads the profile from the server.
    pub async fn whoami(&self) -> ClientResult<CurrentUser> {
        if !self.snapshot().is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        let user: CurrentUser = self.api.get("auth/me", &[]).await?;

        let mut session = self.session.write().unwrap_or_else(|e| e.into_inner());
        session.user = Some(user.clone());
        Ok(user)
    }

    /// The local session is cleared even when the server call fails.
    pub async fn logout(&self) {
        if let Err(e) = self.api.post::<_, Value>("auth/logout", &json!({})).await {
            tracing::warn!("Logout request failed: {}", e);
        }
        self.replace(Session::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::serve;
    use axum::{http::HeaderMap, http::StatusCode, routing::{get, post}, Json, Router};

    fn user_json() -> Value {
        json!({
            "id": 4,
            "uid": "uid-4",
            "email": "hod@uni.edu",
            "first_name": "Asha",
            "last_name": null,
            "role": "hod",
            "department_id": 2,
            "created_at": "2024-09-01T10:00:00",
            "updated_at": "2024-09-01T10:00:00"
        })
    }

    async fn fake_auth_server() -> String {
        let app = Router::new()
            .route(
                "/api/auth/login",
                post(|Json(body): Json<Value>| async move {
                    if body["password"] != "secret" {
                        return (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"success": false, "message": "Invalid email or password"})),
                        );
                    }
                    (
                        StatusCode::OK,
                        Json(json!({
                            "success": true,
                            "message": "Login successful",
                            "data": {
                                "user": user_json(),
                                "access_token": "access-1",
                                "refresh_token": "refresh-1",
                                "token_type": "Bearer",
                                "expires_in": 900
                            }
                        })),
                    )
                }),
            )
            .route(
                "/api/auth/refresh",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["refresh_token"], "refresh-1");
                    Json(json!({
                        "success": true,
                        "message": "Token refreshed successfully",
                        "data": {"access_token": "access-2", "token_type": "Bearer", "expires_in": 900}
                    }))
                }),
            )
            .route(
                "/api/auth/me",
                get(|headers: HeaderMap| async move {
                    if headers.get("authorization").and_then(|v| v.to_str().ok())
                        != Some("Bearer access-2")
                    {
                        return (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"success": false, "message": "Invalid or expired token"})),
                        );
                    }
                    (
                        StatusCode::OK,
                        Json(json!({"success": true, "message": "ok", "data": user_json()})),
                    )
                }),
            );
        serve(app).await
    }

    #[tokio::test]
    async fn test_login_whoami_refreshes_then_logout() {
        let api = Arc::new(ApiClient::new(&fake_auth_server().await, true).unwrap());
        let store = SessionStore::new(api.clone());

        let user = store.login("hod@uni.edu", "secret").await.unwrap();
        assert_eq!(user.role, Role::Hod);
        assert_eq!(api.token().as_deref(), Some("access-1"));

        // The fake server only accepts the refreshed token on /me.
        assert_eq!(store.whoami().await.unwrap().department_id, Some(2));
        assert_eq!(store.snapshot().access_token(), Some("access-2"));

        // No logout route on the fake server; the session still clears.
        store.logout().await;
        assert!(!store.snapshot().is_authenticated());
        assert_eq!(api.token(), None);
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_empty() {
        let api = Arc::new(ApiClient::new(&fake_auth_server().await, true).unwrap());
        let store = SessionStore::new(api.clone());

        let err = store.login("hod@uni.edu", "wrong").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(store.snapshot().user().is_none());
        assert!(matches!(
            api.refresh_access_token().await,
            Err(ClientError::NotAuthenticated)
        ));
        assert!(matches!(store.whoami().await, Err(ClientError::NotAuthenticated)));
    }
}
