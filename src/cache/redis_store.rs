//! Redis cache backend.
//!
//! Keys are namespaced as `{key_prefix}:{key}` so several deployments can
//! share one Redis database. A multiplexed connection does not reconnect on
//! its own, so an I/O or dropped-connection error clears the cached handle and
//! the next call dials again.

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisError, RedisResult, aio::MultiplexedConnection};
use tokio::sync::RwLock;
use tracing::warn;

use super::backend::{CacheBackend, CacheError, ttl_seconds};

#[derive(Clone)]
pub struct RedisCache {
    client: Arc<Client>,
    key_prefix: String,
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let connection = match self.connection.try_read() {
            Ok(slot) if slot.is_some() => "connected",
            Ok(_) => "idle",
            Err(_) => "busy",
        };

        f.debug_struct("RedisCache")
            .field("key_prefix", &self.key_prefix)
            .field("connection", &connection)
            .finish()
    }
}

impl RedisCache {
    /// Parse the connection URL; the connection itself is opened lazily.
    pub fn new(redis_url: &str, key_prefix: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)?;
        Ok(Self {
            client: Arc::new(client),
            key_prefix: key_prefix.to_string(),
            connection: Arc::new(RwLock::new(None)),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        if let Some(connection) = self.connection.read().await.as_ref() {
            return Ok(connection.clone());
        }

        let mut slot = self.connection.write().await;
        if let Some(connection) = slot.as_ref() {
            return Ok(connection.clone());
        }
        let connection = self.client.get_multiplexed_async_connection().await?;
        *slot = Some(connection.clone());
        Ok(connection)
    }

    /// Forget the cached connection when `result` shows it is gone.
    async fn settle<T>(&self, result: RedisResult<T>) -> Result<T, CacheError> {
        if let Err(err) = &result {
            if is_disconnect(err) {
                warn!(
                    cache = "redis",
                    error = %err,
                    "redis connection lost, reconnecting on next use"
                );
                self.connection.write().await.take();
            }
        }
        result.map_err(CacheError::from)
    }

    fn namespaced(&self, key: &str) -> String {
        namespaced_key(&self.key_prefix, key)
    }
}

fn is_disconnect(err: &RedisError) -> bool {
    err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal()
}

fn namespaced_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}:{key}")
    }
}

/// Glob matching every namespaced key that contains `pattern`.
fn contains_glob(prefix: &str, pattern: &str) -> String {
    let escaped: String = pattern
        .chars()
        .flat_map(|ch| match ch {
            '*' | '?' | '[' | ']' | '\\' => vec!['\\', ch],
            other => vec![other],
        })
        .collect();
    namespaced_key(prefix, &format!("*{escaped}*"))
}

#[async_trait]
impl CacheBackend for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: RedisResult<Option<String>> = conn.get(self.namespaced(key)).await;
        self.settle(value).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let seconds = ttl_seconds(ttl)?;
        let mut conn = self.connection().await?;
        let stored: RedisResult<()> = conn.set_ex(self.namespaced(key), value, seconds).await;
        self.settle(stored).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.connection().await?;
        let deleted: RedisResult<u64> = conn.del(self.namespaced(key)).await;
        Ok(self.settle(deleted).await? > 0)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut conn = self.connection().await?;
        let keys: RedisResult<Vec<String>> =
            conn.keys(contains_glob(&self.key_prefix, pattern)).await;
        let keys = self.settle(keys).await?;

        if keys.is_empty() {
            return Ok(0);
        }

        let deleted: RedisResult<u64> = conn.del(keys).await;
        self.settle(deleted).await
    }
}
