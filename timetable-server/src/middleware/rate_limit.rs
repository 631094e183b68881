use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::AppError;

/// In-memory fixed-window limiter keyed by client. Per process only.
#[derive(Debug)]
pub struct RateLimiter {
    name: &'static str,
    enabled: bool,
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, (u32, Instant)>>,
}

impl RateLimiter {
    pub fn new(name: &'static str, max_requests: u32, window: Duration, enabled: bool) -> Self {
        Self {
            name,
            enabled,
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn check(&self, key: &str) -> Result<(), AppError> {
        self.check_at(key, Instant::now())
    }

    /// Counts one request for `key` at `now`. The window starts with the first
    /// request and resets once it has fully elapsed.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), AppError> {
        if !self.enabled {
            return Ok(());
        }

        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if windows.len() > 10_000 {
            let window = self.window;
            windows.retain(|_, (_, started)| now.duration_since(*started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert((0, now));
        if now.duration_since(entry.1) >= self.window {
            *entry = (0, now);
        }

        if entry.0 >= self.max_requests {
            let remaining = self.window.saturating_sub(now.duration_since(entry.1));
            tracing::warn!("{} rate limit exceeded for {}", self.name, key);
            return Err(AppError::RateLimited {
                retry_after_secs: remaining.as_secs().max(1),
            });
        }

        entry.0 += 1;
        Ok(())
    }
}

/// First `x-forwarded-for` hop, then the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if limiter.is_enabled() {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let key = client_key(request.headers(), peer);
        if let Err(err) = limiter.check(&key) {
            return err.into_response();
        }
    }
    next.run(request).await
}
