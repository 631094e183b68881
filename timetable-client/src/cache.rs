//! Query cache keyed by entity and filter parameters.
//!
//! Identical concurrent fetches share one request: each key owns an async lock
//! and the second caller finds the value the first one stored.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::ClientResult;

/// Exact-match cache key: entity name plus sorted filter parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub entity: String,
    pub params: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity)?;
        for (k, v) in &self.params {
            write!(f, " {}={}", k, v)?;
        }
        Ok(())
    }
}

struct Cached<V> {
    value: V,
    fetched_at: Instant,
}

type Slot<V> = Arc<tokio::sync::Mutex<Option<Cached<V>>>>;

pub struct QueryCache<V> {
    stale_time: Duration,
    slots: Mutex<HashMap<QueryKey, Slot<V>>>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &QueryKey) -> Slot<V> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(key.clone()).or_default().clone()
    }

    /// Returns the cached value while fresh, otherwise runs `fetcher` and
    /// stores its result. Failures are not cached.
    pub async fn fetch<F, Fut>(&self, key: &QueryKey, fetcher: F) -> ClientResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<V>>,
    {
        let slot = self.slot(key);
        let mut guard = slot.lock().await;

        if let Some(cached) = guard.as_ref() {
            if cached.fetched_at.elapsed() < self.stale_time {
                tracing::debug!("cache hit: {}", key);
                return Ok(cached.value.clone());
            }
        }

        tracing::debug!("cache miss: {}", key);
        let value = fetcher().await?;
        *guard = Some(Cached {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    /// Fresh cached value without fetching. Returns None while a fetch for
    /// the key is in flight.
    #[cfg(test)]
    pub fn peek(&self, key: &QueryKey) -> Option<V> {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.get(key)?.clone()
        };
        let guard = slot.try_lock().ok()?;
        guard
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.stale_time)
            .map(|c| c.value.clone())
    }

    /// Drops every key of `entity`, whatever its parameters.
    pub fn invalidate(&self, entity: &str) -> usize {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let before = slots.len();
        slots.retain(|key, _| key.entity != entity);
        before - slots.len()
    }

    /// Drops one key, leaving other parameterisations of its entity cached.
    pub fn invalidate_exact(&self, key: &QueryKey) -> bool {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.remove(key).is_some()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
