use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::RwLock;

use crate::error::{ClientError, ClientResult, FieldError};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: String,
    #[serde(default)]
    errors: Vec<FieldError>,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

/// Thin typed wrapper over the REST API. Every answer is unwrapped from the
/// `{success, message, data}` envelope.
///
/// A 401 on anything outside `auth/` swaps the access token through
/// `auth/refresh` (when a refresh token is held) and replays the request once.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
    refresh_token: RwLock<Option<String>>,
    retry: bool,
}

impl ApiClient {
    pub fn new(base_url: &str, retry: bool) -> ClientResult<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
            refresh_token: RwLock::new(None),
            retry,
        })
    }

    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_refresh_token(&self, token: Option<String>) {
        let mut guard = self.refresh_token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token;
    }

    fn refresh_token(&self) -> Option<String> {
        self.refresh_token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Swaps the access token using the stored refresh token.
    pub async fn refresh_access_token(&self) -> ClientResult<()> {
        let refresh_token = self.refresh_token().ok_or(ClientError::NotAuthenticated)?;
        let response = self
            .http
            .post(self.url("auth/refresh"))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        let fresh: AccessTokenResponse = decode(response).await?;
        tracing::debug!("Access token refreshed");
        self.set_token(Some(fresh.access_token));
        Ok(())
    }

    async fn send<T, F>(&self, method: Method, path: &str, build: F) -> ClientResult<T>
    where
        T: DeserializeOwned,
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let response = build(self.request(method.clone(), path)).send().await?;
        let result = decode(response).await;

        let expired = matches!(
            &result,
            Err(ClientError::Api { status, .. }) if *status == StatusCode::UNAUTHORIZED
        );
        if !expired || path.starts_with("auth/") || self.refresh_token().is_none() {
            return result;
        }

        tracing::info!("{} {} was rejected as unauthenticated, refreshing token", method, path);
        self.refresh_access_token().await?;
        let response = build(self.request(method, path)).send().await?;
        decode(response).await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> ClientResult<T> {
        let first = self.send(Method::GET, path, |b| b.query(query)).await;
        match first {
            Err(e) if self.retry && e.is_retryable() => {
                tracing::warn!("GET {} failed ({}), retrying once", path, e);
                self.send(Method::GET, path, |b| b.query(query)).await
            }
            other => other,
        }
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(Method::POST, path, |b| b.json(body)).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(Method::PUT, path, |b| b.json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(Method::DELETE, path, |b| b).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.is_success() {
        let envelope: Envelope<T> = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Decode(format!("{} ({})", e, status)))?;
        return Ok(envelope.data);
    }

    match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
        Ok(body) => Err(ClientError::Api {
            status,
            message: body.message,
            errors: body.errors,
        }),
        Err(_) => Err(ClientError::Api {
            status,
            message: status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
            errors: Vec::new(),
        }),
    }
}
