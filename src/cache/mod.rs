//! LabMyShare cache layer.
//!
//! - **Backends**: an injected [`CacheBackend`] (in-process LRU map or Redis).
//! - **List cache**: read-through caching of list endpoint payloads keyed by
//!   view, region and query string.
//! - **Regional entries**: region-scoped values such as featured categories.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "memory"   # or "redis"
//! default_timeout_seconds = 3600
//! ```

mod backend;
mod config;
pub mod keys;
mod list;
mod lock;
mod memory;
mod redis_store;
mod regional;

pub use backend::{CacheBackend, CacheError, DisabledCache, build_backend, get_json, set_json};
pub use config::{CacheBackendKind, CacheConfig, EndpointCacheConfig};
pub use keys::{CacheKey, GLOBAL_REGION, build_key};
pub use list::{DEFAULT_CACHE_TIMEOUT, ListCache, ListRequest};
pub use memory::MemoryCache;
pub use redis_store::RedisCache;
pub use regional::{RegionAwareCache, invalidate_pattern, regional_key};

pub(crate) use list::{METRIC_BACKEND_ERROR, METRIC_LIST_HIT, METRIC_LIST_MISS, METRIC_LIST_STORE};
