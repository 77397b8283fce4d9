//! Catalogue list endpoints.

use axum::{
    Extension, Json,
    extract::{RawQuery, State},
    response::{IntoResponse, Response},
};

use super::{HttpState, middleware::ResolvedRegion, query::QueryParams};
use crate::cache::ListRequest;

/// Cache identity of `GET /api/services/categories/`.
pub struct CategoryListView;

/// Cache identity of `GET /api/services/`.
pub struct ServiceListView;

/// Cache identity of `GET /api/professionals/`.
pub struct ProfessionalListView;

pub(super) async fn list_categories(
    State(state): State<HttpState>,
    Extension(ResolvedRegion(region)): Extension<ResolvedRegion>,
    RawQuery(query): RawQuery,
) -> Response {
    let request = ListRequest::new(region, query.unwrap_or_default());

    state
        .lists
        .categories
        .list(&request, || async {
            let page = match QueryParams::parse(&request.query).page() {
                Ok(page) => page,
                Err(err) => return err.into_response(),
            };
            match state.catalog.categories(request.region.as_ref(), page).await {
                Ok(categories) => Json(categories).into_response(),
                Err(err) => err.into_response(),
            }
        })
        .await
}

pub(super) async fn featured_categories(
    State(state): State<HttpState>,
    Extension(ResolvedRegion(region)): Extension<ResolvedRegion>,
) -> Response {
    match state.catalog.featured_categories(region.as_ref()).await {
        Ok(categories) => Json(categories).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(super) async fn list_services(
    State(state): State<HttpState>,
    Extension(ResolvedRegion(region)): Extension<ResolvedRegion>,
    RawQuery(query): RawQuery,
) -> Response {
    let request = ListRequest::new(region, query.unwrap_or_default());

    state
        .lists
        .services
        .list(&request, || async {
            let params = QueryParams::parse(&request.query);
            let (page, filter) = match params.page().and_then(|page| {
                params.service_filter().map(|filter| (page, filter))
            }) {
                Ok(parsed) => parsed,
                Err(err) => return err.into_response(),
            };
            match state
                .catalog
                .services(request.region.as_ref(), page, &filter)
                .await
            {
                Ok(services) => Json(services).into_response(),
                Err(err) => err.into_response(),
            }
        })
        .await
}

pub(super) async fn list_professionals(
    State(state): State<HttpState>,
    Extension(ResolvedRegion(region)): Extension<ResolvedRegion>,
    RawQuery(query): RawQuery,
) -> Response {
    let request = ListRequest::new(region, query.unwrap_or_default());

    state
        .lists
        .professionals
        .list(&request, || async {
            let params = QueryParams::parse(&request.query);
            let (page, filter) = match params.page().and_then(|page| {
                params.professional_filter().map(|filter| (page, filter))
            }) {
                Ok(parsed) => parsed,
                Err(err) => return err.into_response(),
            };
            match state
                .catalog
                .professionals(request.region.as_ref(), page, &filter)
                .await
            {
                Ok(professionals) => Json(professionals).into_response(),
                Err(err) => err.into_response(),
            }
        })
        .await
}
