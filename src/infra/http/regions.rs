use axum::{
    Json,
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use super::{HttpState, query::QueryParams};
use crate::{
    application::pagination::Page,
    domain::regions::{RegionalSetting, SettingValueType},
};

#[derive(Debug, Serialize)]
struct RegionalSettingView {
    id: i64,
    key: String,
    value: String,
    /// `null` when the stored text does not match `value_type`.
    value_parsed: Option<Value>,
    value_type: SettingValueType,
    description: String,
}

impl From<RegionalSetting> for RegionalSettingView {
    fn from(setting: RegionalSetting) -> Self {
        Self {
            value_parsed: setting.typed_value().ok(),
            id: setting.id,
            key: setting.key,
            value: setting.value,
            value_type: setting.value_type,
            description: setting.description,
        }
    }
}

pub(super) async fn list_regions(State(state): State<HttpState>) -> Response {
    match state.regions.active_regions().await {
        Ok(regions) => Json(Page::new(regions.len() as u64, regions)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(super) async fn region_detail(
    State(state): State<HttpState>,
    Path(code): Path<String>,
) -> Response {
    match state.regions.region(&code).await {
        Ok(region) => Json(region).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(super) async fn region_settings(
    State(state): State<HttpState>,
    Path(code): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    let page = match QueryParams::parse(query.as_deref().unwrap_or_default()).page() {
        Ok(page) => page,
        Err(err) => return err.into_response(),
    };

    match state.regions.settings_for(&code, page).await {
        Ok(settings) => Json(Page::new(
            settings.count,
            settings
                .results
                .into_iter()
                .map(RegionalSettingView::from)
                .collect::<Vec<_>>(),
        ))
        .into_response(),
        Err(err) => err.into_response(),
    }
}
