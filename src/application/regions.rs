//! Region lookup and resolution.

use std::{sync::Arc, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    application::{
        error::AppError,
        pagination::{Page, PageRequest},
        repos::{RegionsRepo, RepoError},
    },
    cache::{
        CacheBackend, get_json,
        keys::{REGIONS_ALL, region_lookup_key},
        set_json,
    },
    domain::{
        error::DomainError,
        regions::{Region, RegionalSetting, normalize_code},
    },
};

#[derive(Clone)]
pub struct RegionService {
    repo: Arc<dyn RegionsRepo>,
    cache: Arc<dyn CacheBackend>,
    region_timeout: Duration,
    default_region: Option<String>,
}

impl RegionService {
    pub fn new(
        repo: Arc<dyn RegionsRepo>,
        cache: Arc<dyn CacheBackend>,
        region_timeout: Duration,
        default_region: Option<String>,
    ) -> Self {
        Self {
            repo,
            cache,
            region_timeout,
            default_region: default_region.as_deref().and_then(normalize_code),
        }
    }

    pub fn default_region(&self) -> Option<&str> {
        self.default_region.as_deref()
    }

    /// Region for a request that asked for `requested`.
    ///
    /// Unknown or inactive codes fall back to the default region; when that is
    /// unset or unavailable the request is served globally.
    pub async fn resolve(&self, requested: Option<&str>) -> Result<Option<Region>, AppError> {
        let requested = requested.and_then(normalize_code);

        if let Some(code) = requested.as_deref() {
            if let Some(region) = self.lookup(code).await? {
                return Ok(Some(region));
            }
            debug!(region = code, "requested region unavailable, falling back");
        }

        match self.default_region.as_deref() {
            Some(default) if requested.as_deref() != Some(default) => {
                Ok(self.lookup(default).await?)
            }
            _ => Ok(None),
        }
    }

    /// Active region by code, served from `region:code:{CODE}` when cached.
    pub async fn lookup(&self, code: &str) -> Result<Option<Region>, RepoError> {
        let key = region_lookup_key(code);
        if let Some(region) = self.cached::<Region>(&key).await {
            return Ok(Some(region));
        }

        let region = self.repo.find_active_region(code).await?;
        if let Some(region) = region.as_ref() {
            self.store(&key, region).await;
        }
        Ok(region)
    }

    pub async fn region(&self, code: &str) -> Result<Region, AppError> {
        let code = normalize_code(code).ok_or(DomainError::not_found("region"))?;
        self.lookup(&code)
            .await?
            .ok_or_else(|| DomainError::not_found("region").into())
    }

    pub async fn active_regions(&self) -> Result<Vec<Region>, AppError> {
        if let Some(regions) = self.cached::<Vec<Region>>(REGIONS_ALL).await {
            return Ok(regions);
        }

        let regions = self.repo.list_active_regions().await?;
        self.store(REGIONS_ALL, &regions).await;
        Ok(regions)
    }

    /// Settings of an active region; unknown regions have none.
    pub async fn settings_for(
        &self,
        code: &str,
        page: PageRequest,
    ) -> Result<Page<RegionalSetting>, AppError> {
        let Some(region) = self.lookup_normalized(code).await? else {
            return Ok(Page::empty());
        };
        let settings = self.repo.list_regional_settings(region.id).await?;
        Ok(Page::from_vec(settings, page).ensure_in_range(page)?)
    }

    async fn lookup_normalized(&self, code: &str) -> Result<Option<Region>, RepoError> {
        match normalize_code(code) {
            Some(code) => self.lookup(&code).await,
            None => Ok(None),
        }
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match get_json(self.cache.as_ref(), key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(cache = "regions", key, error = %err, "cache read failed");
                None
            }
        }
    }

    async fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(err) = set_json(self.cache.as_ref(), key, value, self.region_timeout).await {
            warn!(cache = "regions", key, error = %err, "cache write failed");
        }
    }
}
