//! Catalogue list retrievals, narrowed to the caller's region.

use std::{sync::Arc, time::Duration};

use crate::{
    application::{
        error::AppError,
        pagination::{Page, PageRequest},
        region_filter,
        repos::{CatalogRepo, ListParams, ProfessionalQueryFilter, ServiceQueryFilter},
    },
    cache::RegionAwareCache,
    domain::{
        catalog::{Category, Professional, Service},
        regions::Region,
    },
};

const FEATURED_CATEGORIES_TEMPLATE: &str = "featured_categories:{}";
const FEATURED_CATEGORIES_TIMEOUT: Duration = Duration::from_secs(3600);

#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepo>,
    regional: RegionAwareCache,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepo>, regional: RegionAwareCache) -> Self {
        Self { repo, regional }
    }

    /// Categories exist only within a region; without one the list is empty.
    pub async fn categories(
        &self,
        region: Option<&Region>,
        page: PageRequest,
    ) -> Result<Page<Category>, AppError> {
        if region.is_none() {
            return Ok(Page::empty());
        }
        let params = region_filter::filter::<Category>(ListParams::new(page), region);
        let result = self.repo.list_categories(&params).await?;
        Ok(result.ensure_in_range(page)?)
    }

    pub async fn featured_categories(
        &self,
        region: Option<&Region>,
    ) -> Result<Vec<Category>, AppError> {
        let Some(current) = region else {
            return Ok(Vec::new());
        };

        if let Some(cached) = self
            .regional
            .get_regional::<Vec<Category>>(region, FEATURED_CATEGORIES_TEMPLATE, &[])
            .await
        {
            return Ok(cached);
        }

        let categories = self.repo.list_featured_categories(current.id).await?;
        self.regional
            .set_regional(
                region,
                FEATURED_CATEGORIES_TEMPLATE,
                &categories,
                Some(FEATURED_CATEGORIES_TIMEOUT),
                &[],
            )
            .await;
        Ok(categories)
    }

    pub async fn services(
        &self,
        region: Option<&Region>,
        page: PageRequest,
        filter: &ServiceQueryFilter,
    ) -> Result<Page<Service>, AppError> {
        let params = region_filter::filter::<Service>(ListParams::new(page), region);
        let result = self.repo.list_services(&params, filter).await?;
        Ok(result.ensure_in_range(page)?)
    }

    pub async fn professionals(
        &self,
        region: Option<&Region>,
        page: PageRequest,
        filter: &ProfessionalQueryFilter,
    ) -> Result<Page<Professional>, AppError> {
        let params = region_filter::filter::<Professional>(ListParams::new(page), region);
        let result = self.repo.list_professionals(&params, filter).await?;
        Ok(result.ensure_in_range(page)?)
    }
}
