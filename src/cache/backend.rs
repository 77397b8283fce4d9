//! Cache service abstraction.
//!
//! The read path only ever talks to `dyn CacheBackend`; the concrete store is
//! chosen once at startup from [`CacheConfig`].

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use super::{
    CacheConfig, config::CacheBackendKind, memory::MemoryCache, redis_store::RedisCache,
};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid ttl {0:?}: must be at least one second")]
    InvalidTtl(Duration),
}

/// Process-wide key-value store with per-entry expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend label used in logs and health output.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Remove `key`; returns whether an entry existed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Remove every key containing `pattern`; returns the number removed.
    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError>;
}

/// Backend used when caching is switched off: never hits, never stores.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCache;

#[async_trait]
impl CacheBackend for DisabledCache {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    async fn delete_pattern(&self, _pattern: &str) -> Result<u64, CacheError> {
        Ok(0)
    }
}

/// Build the backend selected by `config`.
pub fn build_backend(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>, CacheError> {
    if !config.enabled {
        return Ok(Arc::new(DisabledCache));
    }

    match config.backend {
        CacheBackendKind::Memory => Ok(Arc::new(MemoryCache::new(
            config.memory_capacity_non_zero(),
        ))),
        CacheBackendKind::Redis => Ok(Arc::new(RedisCache::new(
            &config.redis_url,
            &config.key_prefix,
        )?)),
    }
}

/// Fetch and decode a JSON value.
pub async fn get_json<T>(backend: &dyn CacheBackend, key: &str) -> Result<Option<T>, CacheError>
where
    T: DeserializeOwned,
{
    match backend.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and store a JSON value.
pub async fn set_json<T>(
    backend: &dyn CacheBackend,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<(), CacheError>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    backend.set(key, &raw, ttl).await
}

pub(crate) fn ttl_seconds(ttl: Duration) -> Result<u64, CacheError> {
    match ttl.as_secs() {
        0 => Err(CacheError::InvalidTtl(ttl)),
        secs => Ok(secs),
    }
}
