use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) < ttl
    }
}

/// In-memory TTL cache for upstream responses.
///
/// Expiry is checked on read only: stale entries stay in the map until the
/// same key is written again.
#[derive(Default)]
pub struct RequestCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached payload if it was stored less than `ttl` ago.
    pub fn get(&self, key: &str, ttl: Duration) -> Option<Value> {
        self.get_at(key, ttl, Instant::now())
    }

    pub fn get_at(&self, key: &str, ttl: Duration, now: Instant) -> Option<Value> {
        let entries = self.lock();
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(ttl, now))
            .map(|entry| entry.payload.clone())
    }

    pub fn put(&self, key: &str, payload: Value) {
        self.put_at(key, payload, Instant::now());
    }

    pub fn put_at(&self, key: &str, payload: Value, inserted_at: Instant) {
        let entry = CacheEntry {
            payload,
            inserted_at,
        };
        self.lock().insert(key.to_string(), entry);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave a half-written entry, so a
    // poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
