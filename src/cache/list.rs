//! Read-through cache for list endpoints.
//!
//! A hit answers with the stored JSON body and status 200 without running the
//! retrieval. A miss runs the retrieval once and stores the body only when the
//! status is exactly 200. Backend failures never fail the request: a failed
//! read counts as a miss and a failed write is logged.
//!
//! There is no single-flight: concurrent misses for one key may both run the
//! retrieval and both write, the last write wins.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use metrics::counter;
use tracing::{debug, warn};

use super::{
    backend::CacheBackend,
    config::{CacheConfig, DEFAULT_TIMEOUT_SECS},
    keys::{CacheKey, build_key, view_name},
};
use crate::domain::regions::Region;

pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECS);

pub(crate) const METRIC_LIST_HIT: &str = "labmyshare_list_cache_hit_total";
pub(crate) const METRIC_LIST_MISS: &str = "labmyshare_list_cache_miss_total";
pub(crate) const METRIC_LIST_STORE: &str = "labmyshare_list_cache_store_total";
pub(crate) const METRIC_BACKEND_ERROR: &str = "labmyshare_cache_backend_error_total";

const MAX_CACHED_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Inputs that distinguish one list payload from another.
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub region: Option<Region>,
    /// Raw query string without the leading `?`.
    pub query: String,
}

impl ListRequest {
    pub fn new(region: Option<Region>, query: impl Into<String>) -> Self {
        Self {
            region,
            query: query.into(),
        }
    }
}

#[derive(Clone)]
pub struct ListCache {
    backend: Arc<dyn CacheBackend>,
    prefix: String,
    timeout: Duration,
}

impl ListCache {
    pub fn new(backend: Arc<dyn CacheBackend>, prefix: impl Into<String>, timeout: Duration) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
            timeout,
        }
    }

    /// Cache for the view marker `V`, honouring `cache.endpoints.<V>` overrides.
    pub fn for_view<V: ?Sized>(backend: Arc<dyn CacheBackend>, config: &CacheConfig) -> Self {
        let view = view_name::<V>();
        let prefix = config
            .endpoint(view)
            .and_then(|endpoint| endpoint.key_prefix.clone())
            .unwrap_or_else(|| view.to_string());
        Self::new(backend, prefix, config.timeout_for(view))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn key_for(&self, request: &ListRequest) -> CacheKey {
        build_key(&self.prefix, request.region.as_ref(), &request.query)
    }

    /// Serve `request` from the cache or run `retrieve` and store its result.
    pub async fn list<F, Fut>(&self, request: &ListRequest, retrieve: F) -> Response
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Response>,
    {
        let key = self.key_for(request);

        match self.backend.get(key.as_str()).await {
            Ok(Some(body)) => {
                counter!(METRIC_LIST_HIT).increment(1);
                debug!(cache = "list", outcome = "hit", key = %key, "serving cached list");
                return json_response(StatusCode::OK, Bytes::from(body));
            }
            Ok(None) => {}
            Err(err) => {
                counter!(METRIC_BACKEND_ERROR, "op" => "get").increment(1);
                warn!(
                    cache = "list",
                    backend = self.backend.name(),
                    key = %key,
                    error = %err,
                    "cache read failed, treating as miss"
                );
            }
        }

        counter!(METRIC_LIST_MISS).increment(1);
        debug!(cache = "list", outcome = "miss", key = %key, "running list retrieval");

        let response = retrieve().await;
        if response.status() != StatusCode::OK {
            return response;
        }

        let (parts, body) = response.into_parts();
        let bytes = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(cache = "list", key = %key, error = %err, "failed to collect list body");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        if bytes.len() > MAX_CACHED_BODY_BYTES {
            debug!(
                cache = "list",
                key = %key,
                body_bytes = bytes.len(),
                "list body too large to cache"
            );
        } else {
            match std::str::from_utf8(&bytes) {
                Ok(text) => self.store(&key, text).await,
                Err(_) => warn!(cache = "list", key = %key, "list body is not utf-8, not caching"),
            }
        }

        Response::from_parts(parts, Body::from(bytes))
    }

    async fn store(&self, key: &CacheKey, body: &str) {
        match self.backend.set(key.as_str(), body, self.timeout).await {
            Ok(()) => {
                counter!(METRIC_LIST_STORE).increment(1);
                debug!(
                    cache = "list",
                    key = %key,
                    ttl_secs = self.timeout.as_secs(),
                    "stored list payload"
                );
            }
            Err(err) => {
                counter!(METRIC_BACKEND_ERROR, "op" => "set").increment(1);
                warn!(
                    cache = "list",
                    backend = self.backend.name(),
                    key = %key,
                    error = %err,
                    "cache write failed"
                );
            }
        }
    }
}

fn json_response(status: StatusCode, body: Bytes) -> Response {
    let mut response = (status, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

#[cfg(test)]
mod tests {
    use std::{
        num::NonZeroUsize,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use axum::Json;
    use serde_json::json;

    use super::*;
    use crate::cache::{backend::CacheError, config::EndpointCacheConfig, memory::MemoryCache};

    struct ProfessionalListView;

    struct FailingCache;

    fn backend_failure() -> CacheError {
        CacheError::Serialization(
            serde_json::from_str::<serde_json::Value>("{").expect_err("truncated json"),
        )
    }

    #[async_trait]
    impl CacheBackend for FailingCache {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(backend_failure())
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(backend_failure())
        }

        async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
            Err(backend_failure())
        }

        async fn delete_pattern(&self, _pattern: &str) -> Result<u64, CacheError> {
            Err(backend_failure())
        }
    }

    fn memory() -> Arc<MemoryCache> {
        Arc::new(MemoryCache::new(NonZeroUsize::new(64).expect("capacity")))
    }

    fn cache(backend: Arc<dyn CacheBackend>) -> ListCache {
        ListCache::new(backend, "ProfessionalListView", DEFAULT_CACHE_TIMEOUT)
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf-8")
    }

    fn ok_payload(calls: &AtomicUsize) -> Response {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        Json(json!({ "count": 1, "results": [{ "id": n }] })).into_response()
    }

    #[tokio::test]
    async fn hit_returns_cached_payload_without_retrieval() {
        let backend = memory();
        let list = cache(backend.clone());
        let request = ListRequest::new(None, "page=2");
        backend
            .set(
                "ProfessionalListView:global:46589c7a",
                r#"{"count":0,"results":[]}"#,
                DEFAULT_CACHE_TIMEOUT,
            )
            .await
            .expect("seed");

        let calls = AtomicUsize::new(0);
        let response = list.list(&request, || async { ok_payload(&calls) }).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("application/json")
        );
        assert_eq!(body_string(response).await, r#"{"count":0,"results":[]}"#);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn miss_stores_ok_payload_until_ttl_elapses() {
        let list = cache(memory());
        let request = ListRequest::new(None, "page=1");
        let calls = AtomicUsize::new(0);

        let first = list.list(&request, || async { ok_payload(&calls) }).await;
        assert_eq!(first.status(), StatusCode::OK);
        let first_body = body_string(first).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(3599)).await;
        let second = list.list(&request, || async { ok_payload(&calls) }).await;
        assert_eq!(body_string(second).await, first_body);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        let third = list.list(&request, || async { ok_payload(&calls) }).await;
        assert_eq!(third.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_ne!(body_string(third).await, first_body);
    }

    #[tokio::test]
    async fn non_ok_responses_are_not_stored() {
        let backend = memory();
        let list = cache(backend.clone());
        let request = ListRequest::new(None, "page=1");
        let calls = AtomicUsize::new(0);

        for expected in 1..=2 {
            let response = list
                .list(&request, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::FORBIDDEN, Json(json!({ "error": true }))).into_response()
                })
                .await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            assert_eq!(calls.load(Ordering::SeqCst), expected);
        }
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn created_status_is_not_stored() {
        let backend = memory();
        let list = cache(backend.clone());
        let response = list
            .list(&ListRequest::default(), || async {
                (StatusCode::CREATED, Json(json!([]))).into_response()
            })
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn failing_backend_fails_open() {
        let list = cache(Arc::new(FailingCache));
        let request = ListRequest::new(None, "page=1");
        let calls = AtomicUsize::new(0);

        for expected in 1..=2 {
            let response = list.list(&request, || async { ok_payload(&calls) }).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(calls.load(Ordering::SeqCst), expected);
        }
    }

    #[tokio::test]
    async fn oversized_ok_body_passes_through_uncached() {
        let backend = memory();
        let list = cache(backend.clone());
        let payload = "x".repeat(MAX_CACHED_BODY_BYTES + (1 << 20));

        let response = list
            .list(&ListRequest::new(None, "page=1"), || async {
                (StatusCode::OK, payload.clone()).into_response()
            })
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await.len(), payload.len());
        assert!(backend.is_empty());
    }

    #[test]
    fn for_view_uses_type_name_and_endpoint_overrides() {
        let mut config = CacheConfig::default();
        let list = ListCache::for_view::<ProfessionalListView>(memory(), &config);
        assert_eq!(list.prefix(), "ProfessionalListView");
        assert_eq!(list.timeout(), DEFAULT_CACHE_TIMEOUT);
        assert_eq!(
            list.key_for(&ListRequest::new(None, "page=2")).as_str(),
            "ProfessionalListView:global:46589c7a"
        );

        config.endpoints.insert(
            "ProfessionalListView".to_string(),
            EndpointCacheConfig {
                timeout: Some(Duration::from_secs(120)),
                key_prefix: Some("professionals".to_string()),
            },
        );
        let list = ListCache::for_view::<ProfessionalListView>(memory(), &config);
        assert_eq!(list.prefix(), "professionals");
        assert_eq!(list.timeout(), Duration::from_secs(120));
    }
}
