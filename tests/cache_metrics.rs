use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serde_json::json;

use labmyshare::cache::{
    CacheBackend, CacheError, DEFAULT_CACHE_TIMEOUT, ListCache, ListRequest, MemoryCache,
};

struct UnreachableCache;

#[async_trait]
impl CacheBackend for UnreachableCache {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::InvalidTtl(Duration::ZERO))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::InvalidTtl(Duration::ZERO))
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::InvalidTtl(Duration::ZERO))
    }

    async fn delete_pattern(&self, _pattern: &str) -> Result<u64, CacheError> {
        Err(CacheError::InvalidTtl(Duration::ZERO))
    }
}

fn payload() -> axum::response::Response {
    Json(json!({ "count": 0, "results": [] })).into_response()
}

#[tokio::test]
async fn list_cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let memory = Arc::new(MemoryCache::new(NonZeroUsize::new(16).expect("capacity")));
    let list = ListCache::new(memory, "ServiceListView", DEFAULT_CACHE_TIMEOUT);
    let request = ListRequest::new(None, "page=1");

    // miss + store, then hit
    for _ in 0..2 {
        let response = list.list(&request, || async { payload() }).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // failed read is counted and treated as a miss
    let broken = ListCache::new(
        Arc::new(UnreachableCache),
        "ServiceListView",
        DEFAULT_CACHE_TIMEOUT,
    );
    let response = broken.list(&request, || async { payload() }).await;
    assert_eq!(response.status(), StatusCode::OK);

    let snapshot = snapshotter.snapshot().into_vec();
    let counter = |name: &str| -> u64 {
        snapshot
            .iter()
            .filter(|(key, _, _, _)| key.key().name() == name)
            .map(|(_, _, _, value)| match value {
                DebugValue::Counter(count) => *count,
                _ => 0,
            })
            .sum()
    };

    assert_eq!(counter("labmyshare_list_cache_hit_total"), 1);
    assert_eq!(counter("labmyshare_list_cache_miss_total"), 2);
    assert_eq!(counter("labmyshare_list_cache_store_total"), 1);

    let backend_ops: HashSet<String> = snapshot
        .iter()
        .filter(|(key, _, _, _)| key.key().name() == "labmyshare_cache_backend_error_total")
        .flat_map(|(key, _, _, _)| {
            key.key()
                .labels()
                .filter(|label| label.key() == "op")
                .map(|label| label.value().to_string())
                .collect::<Vec<_>>()
        })
        .collect();
    assert!(backend_ops.contains("get"), "missing op=get: {backend_ops:?}");
    assert!(backend_ops.contains("set"), "missing op=set: {backend_ops:?}");
}
