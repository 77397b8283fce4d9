use std::{collections::BTreeMap, time::Duration};

use axum::{Json, extract::State};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::time::Instant;

use super::HttpState;

const SERVICE_NAME: &str = "LabMyShare API";
const PROBE_KEY: &str = "health_check";
const PROBE_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(super) enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub(super) struct CheckResult {
    status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CheckResult {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>, started: Instant) -> Self {
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match result {
            Ok(()) => Self {
                status: HealthStatus::Healthy,
                response_time_ms: Some(elapsed),
                backend: None,
                error: None,
            },
            Err(err) => Self {
                status: HealthStatus::Unhealthy,
                response_time_ms: None,
                backend: None,
                error: Some(err.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct HealthReport {
    status: HealthStatus,
    timestamp: String,
    service: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    checks: Option<BTreeMap<&'static str, CheckResult>>,
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

pub(super) async fn health() -> Json<HealthReport> {
    Json(HealthReport {
        status: HealthStatus::Healthy,
        timestamp: timestamp(),
        service: SERVICE_NAME,
        checks: None,
    })
}

pub(super) async fn detailed_health(State(state): State<HttpState>) -> Json<HealthReport> {
    let mut checks = BTreeMap::new();

    let started = Instant::now();
    let database = state.health.ping().await;
    checks.insert("database", CheckResult::from_result(database, started));

    let started = Instant::now();
    let cache = match state.cache.set(PROBE_KEY, "test", PROBE_TTL).await {
        Ok(()) => state.cache.get(PROBE_KEY).await.map(|_| ()),
        Err(err) => Err(err),
    };
    let mut cache_check = CheckResult::from_result(cache, started);
    cache_check.backend = Some(state.cache.name());
    checks.insert("cache", cache_check);

    let status = if checks
        .values()
        .all(|check| check.status == HealthStatus::Healthy)
    {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };

    Json(HealthReport {
        status,
        timestamp: timestamp(),
        service: SERVICE_NAME,
        checks: Some(checks),
    })
}
