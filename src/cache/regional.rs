//! Region-scoped cache entries outside the list path.
//!
//! Keys come from templates such as `featured_categories:{}`: the first `{}`
//! receives the region code (or `global`), later ones the extra arguments.

use std::{sync::Arc, time::Duration};

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use super::{
    backend::{CacheBackend, get_json, set_json},
    keys::region_code,
    list::METRIC_BACKEND_ERROR,
};
use crate::domain::regions::Region;

const PLACEHOLDER: &str = "{}";

/// Fill the `{}` placeholders of `template` with the region code, then `args`.
///
/// Placeholders without a matching argument are kept verbatim and surplus
/// arguments are ignored.
pub fn regional_key(region: Option<&Region>, template: &str, args: &[&str]) -> String {
    let mut values = std::iter::once(region_code(region)).chain(args.iter().copied());
    let mut key = String::with_capacity(template.len() + 8);
    let mut rest = template;

    while let Some(index) = rest.find(PLACEHOLDER) {
        key.push_str(&rest[..index]);
        key.push_str(values.next().unwrap_or(PLACEHOLDER));
        rest = &rest[index + PLACEHOLDER.len()..];
    }
    key.push_str(rest);
    key
}

#[derive(Clone)]
pub struct RegionAwareCache {
    backend: Arc<dyn CacheBackend>,
    timeout: Duration,
}

impl RegionAwareCache {
    pub fn new(backend: Arc<dyn CacheBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// Cached value for `region`, or `None` on a miss or backend failure.
    pub async fn get_regional<T>(
        &self,
        region: Option<&Region>,
        template: &str,
        args: &[&str],
    ) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let key = regional_key(region, template, args);
        match get_json(self.backend.as_ref(), &key).await {
            Ok(value) => value,
            Err(err) => {
                counter!(METRIC_BACKEND_ERROR, "op" => "get").increment(1);
                warn!(cache = "regional", key = %key, error = %err, "cache read failed");
                None
            }
        }
    }

    /// Store `value` for `region`; `timeout` falls back to the cache default.
    pub async fn set_regional<T>(
        &self,
        region: Option<&Region>,
        template: &str,
        value: &T,
        timeout: Option<Duration>,
        args: &[&str],
    ) where
        T: Serialize + ?Sized,
    {
        let key = regional_key(region, template, args);
        let ttl = timeout.unwrap_or(self.timeout);
        if let Err(err) = set_json(self.backend.as_ref(), &key, value, ttl).await {
            counter!(METRIC_BACKEND_ERROR, "op" => "set").increment(1);
            warn!(cache = "regional", key = %key, error = %err, "cache write failed");
        }
    }

    pub async fn invalidate_regional(
        &self,
        region: Option<&Region>,
        template: &str,
        args: &[&str],
    ) -> bool {
        let key = regional_key(region, template, args);
        match self.backend.delete(&key).await {
            Ok(deleted) => deleted,
            Err(err) => {
                counter!(METRIC_BACKEND_ERROR, "op" => "delete").increment(1);
                warn!(cache = "regional", key = %key, error = %err, "cache delete failed");
                false
            }
        }
    }
}

/// Delete every key containing `pattern`; `0` when the backend fails.
pub async fn invalidate_pattern(backend: &dyn CacheBackend, pattern: &str) -> u64 {
    match backend.delete_pattern(pattern).await {
        Ok(deleted) => deleted,
        Err(err) => {
            counter!(METRIC_BACKEND_ERROR, "op" => "delete_pattern").increment(1);
            warn!(pattern, error = %err, "pattern invalidation failed");
            0
        }
    }
}
