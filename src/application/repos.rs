//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::{Page, PageRequest};
use crate::application::region_filter::RegionScope;
use crate::domain::catalog::{Category, Professional, Service};
use crate::domain::regions::{Region, RegionalSetting};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Parameters shared by every list retrieval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListParams {
    /// Set by the region filter; `None` lists across all regions.
    pub region: Option<RegionScope>,
    pub page: PageRequest,
}

impl ListParams {
    pub fn new(page: PageRequest) -> Self {
        Self { region: None, page }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceOrderField {
    Name,
    BasePrice,
    DurationMinutes,
    SortOrder,
}

impl ServiceOrderField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::BasePrice => "base_price_minor",
            Self::DurationMinutes => "duration_minutes",
            Self::SortOrder => "sort_order",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOrdering {
    pub field: ServiceOrderField,
    pub descending: bool,
}

impl ServiceOrdering {
    /// Parse `name`, `-base_price`, ...; unknown fields yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let field = match name {
            "name" => ServiceOrderField::Name,
            "base_price" => ServiceOrderField::BasePrice,
            "duration_minutes" => ServiceOrderField::DurationMinutes,
            "sort_order" => ServiceOrderField::SortOrder,
            _ => return None,
        };
        Some(Self { field, descending })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceQueryFilter {
    pub category: Option<i64>,
    pub is_featured: Option<bool>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
    /// Defaults to `sort_order, name` when unset.
    pub ordering: Option<ServiceOrdering>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfessionalQueryFilter {
    pub search: Option<String>,
    /// Only professionals offering this service.
    pub service: Option<i64>,
}

#[async_trait]
pub trait RegionsRepo: Send + Sync {
    /// Active regions ordered by name.
    async fn list_active_regions(&self) -> Result<Vec<Region>, RepoError>;

    /// Active region with exactly this code.
    async fn find_active_region(&self, code: &str) -> Result<Option<Region>, RepoError>;

    async fn list_regional_settings(
        &self,
        region_id: i64,
    ) -> Result<Vec<RegionalSetting>, RepoError>;
}

#[async_trait]
pub trait CatalogRepo: Send + Sync {
    /// Active categories ordered by `sort_order, name`.
    async fn list_categories(&self, params: &ListParams) -> Result<Page<Category>, RepoError>;

    async fn list_featured_categories(&self, region_id: i64) -> Result<Vec<Category>, RepoError>;

    async fn list_services(
        &self,
        params: &ListParams,
        filter: &ServiceQueryFilter,
    ) -> Result<Page<Service>, RepoError>;

    /// Active professionals ordered by display name.
    async fn list_professionals(
        &self,
        params: &ListParams,
        filter: &ProfessionalQueryFilter,
    ) -> Result<Page<Professional>, RepoError>;
}

#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Round-trip a trivial query.
    async fn ping(&self) -> Result<(), RepoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_parses_known_fields() {
        assert_eq!(
            ServiceOrdering::parse("-base_price"),
            Some(ServiceOrdering {
                field: ServiceOrderField::BasePrice,
                descending: true,
            })
        );
        assert_eq!(
            ServiceOrdering::parse("name").map(|o| o.field.column()),
            Some("name")
        );
        assert_eq!(ServiceOrdering::parse("price"), None);
        assert_eq!(ServiceOrdering::parse("-"), None);
    }
}
