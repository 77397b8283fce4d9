mod catalog;
mod health;
mod middleware;
mod query;
mod regions;

pub use catalog::{CategoryListView, ProfessionalListView, ServiceListView};
pub use middleware::{REGION_HEADER, RequestContext, ResolvedRegion};

use std::sync::Arc;

use axum::{
    Router,
    http::{StatusCode, Uri},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use self::middleware::{log_responses, resolve_region, set_request_context};
use crate::{
    application::{
        catalog::CatalogService, error::HttpError, regions::RegionService, repos::HealthProbe,
    },
    cache::{CacheBackend, CacheConfig, ListCache},
};

/// Read-through caches for the cached list endpoints.
#[derive(Clone)]
pub struct ListCaches {
    pub categories: ListCache,
    pub services: ListCache,
    pub professionals: ListCache,
}

impl ListCaches {
    pub fn new(backend: Arc<dyn CacheBackend>, config: &CacheConfig) -> Self {
        Self {
            categories: ListCache::for_view::<CategoryListView>(backend.clone(), config),
            services: ListCache::for_view::<ServiceListView>(backend.clone(), config),
            professionals: ListCache::for_view::<ProfessionalListView>(backend, config),
        }
    }
}

#[derive(Clone)]
pub struct HttpState {
    pub regions: RegionService,
    pub catalog: CatalogService,
    pub lists: ListCaches,
    pub health: Arc<dyn HealthProbe>,
    pub cache: Arc<dyn CacheBackend>,
}

pub fn build_router(state: HttpState) -> Router {
    let api_routes = Router::new()
        .route("/regions/", get(regions::list_regions))
        .route("/regions/{code}/", get(regions::region_detail))
        .route("/regions/{code}/settings/", get(regions::region_settings))
        .route("/services/", get(catalog::list_services))
        .route("/services/categories/", get(catalog::list_categories))
        .route(
            "/services/categories/featured/",
            get(catalog::featured_categories),
        )
        .route("/professionals/", get(catalog::list_professionals))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            resolve_region,
        ));

    let health_routes = Router::new()
        .route("/health/", get(health::health))
        .route("/health/detailed/", get(health::detailed_health));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .fallback(fallback)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn fallback(uri: Uri) -> Response {
    HttpError::new(
        "infra::http::fallback",
        StatusCode::NOT_FOUND,
        "Resource not found",
        format!("no route for {}", uri.path()),
    )
    .into_response()
}
