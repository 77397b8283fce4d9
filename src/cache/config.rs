//! Cache configuration.
//!
//! Selects the cache backend and the per-endpoint list cache policy via
//! `labmyshare.toml`:
//!
//! ```toml
//! [cache]
//! backend = "redis"
//! redis_url = "redis://127.0.0.1:6379/1"
//! default_timeout_seconds = 3600
//!
//! [cache.endpoints.ProfessionalListView]
//! timeout_seconds = 7200
//! key_prefix = "professionals"
//! ```

use std::{collections::HashMap, num::NonZeroUsize, time::Duration};

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/1";
const DEFAULT_KEY_PREFIX: &str = "labmyshare";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 3600;
const DEFAULT_REGION_TIMEOUT_SECS: u64 = 3600;
const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    Memory,
    Redis,
}

/// Overrides for a single list endpoint, keyed by view name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointCacheConfig {
    pub timeout: Option<Duration>,
    pub key_prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false every lookup misses and nothing is stored.
    pub enabled: bool,
    pub backend: CacheBackendKind,
    pub redis_url: String,
    /// Namespace prepended by shared backends (`{key_prefix}:{key}`).
    pub key_prefix: String,
    /// TTL for list payloads when the endpoint sets none.
    pub default_timeout: Duration,
    /// TTL for region lookups and the active region list.
    pub region_timeout: Duration,
    /// Maximum entries held by the in-process backend.
    pub memory_capacity: usize,
    pub endpoints: HashMap<String, EndpointCacheConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackendKind::Memory,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            default_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            region_timeout: Duration::from_secs(DEFAULT_REGION_TIMEOUT_SECS),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            endpoints: HashMap::new(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            backend: settings.backend,
            redis_url: settings.redis_url.clone(),
            key_prefix: settings.key_prefix.clone(),
            default_timeout: settings.default_timeout,
            region_timeout: settings.region_timeout,
            memory_capacity: settings.memory_capacity.get(),
            endpoints: settings.endpoints.clone(),
        }
    }
}

impl CacheConfig {
    /// Overrides configured for `view`, if any.
    ///
    /// Environment sources lower-case their keys, so names are matched
    /// case-insensitively when no exact entry exists.
    pub fn endpoint(&self, view: &str) -> Option<&EndpointCacheConfig> {
        self.endpoints.get(view).or_else(|| {
            self.endpoints
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(view))
                .map(|(_, endpoint)| endpoint)
        })
    }

    /// Effective TTL for `view`.
    pub fn timeout_for(&self, view: &str) -> Duration {
        self.endpoint(view)
            .and_then(|endpoint| endpoint.timeout)
            .unwrap_or(self.default_timeout)
    }

    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
