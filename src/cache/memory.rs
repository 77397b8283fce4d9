//! In-process cache backend.
//!
//! Entries expire after their TTL and the map is bounded by an LRU capacity.
//! Expiry uses `tokio::time::Instant` so paused-clock tests can advance time.

use std::{num::NonZeroUsize, sync::RwLock, time::Duration};

use async_trait::async_trait;
use lru::LruCache;
use tokio::time::Instant;

use super::{
    backend::{CacheBackend, CacheError, ttl_seconds},
    lock::{rw_read, rw_write},
};

const SOURCE: &str = "cache::memory";

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

pub struct MemoryCache {
    entries: RwLock<LruCache<String, Entry>>,
}

impl MemoryCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Number of stored entries, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");

        let lookup = entries
            .get(key)
            .map(|entry| entry.is_live(now).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                entries.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        ttl_seconds(ttl)?;
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        rw_write(&self.entries, SOURCE, "set").put(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let now = Instant::now();
        let removed = rw_write(&self.entries, SOURCE, "delete").pop(key);
        Ok(removed.is_some_and(|entry| entry.is_live(now)))
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "delete_pattern");

        let matching: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.contains(pattern))
            .map(|(key, _)| key.clone())
            .collect();

        let mut deleted = 0;
        for key in matching {
            if entries.pop(&key).is_some_and(|entry| entry.is_live(now)) {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
