use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};
use url::form_urlencoded;
use uuid::Uuid;

use super::HttpState;
use crate::{application::error::ErrorReport, domain::regions::Region};

pub const REGION_HEADER: HeaderName = HeaderName::from_static("x-region");
const REGION_QUERY_PARAM: &str = "region";

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Region resolved for the current request; `None` means global scope.
#[derive(Debug, Clone, Default)]
pub struct ResolvedRegion(pub Option<Region>);

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// Attach a [`ResolvedRegion`] to the request.
///
/// The code comes from the `X-Region` header, then the `region` query
/// parameter; lookups that find nothing fall back to the default region.
pub async fn resolve_region(
    State(state): State<HttpState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let requested = requested_region_code(&request);

    match state.regions.resolve(requested.as_deref()).await {
        Ok(region) => {
            request.extensions_mut().insert(ResolvedRegion(region));
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

fn requested_region_code(request: &Request<Body>) -> Option<String> {
    let from_header = request
        .headers()
        .get(&REGION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    from_header.or_else(|| {
        let query = request.uri().query()?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(name, value)| name == REGION_QUERY_PARAM && !value.trim().is_empty())
            .map(|(_, value)| value.trim().to_string())
    })
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "labmyshare::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "request failed",
            );
        } else {
            warn!(
                target = "labmyshare::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "client request error",
            );
        }
    }

    response
}
