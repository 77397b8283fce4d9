//! Query-string parsing for list endpoints.
//!
//! The raw query string is what the list cache keys on, so handlers keep it
//! intact and parse filters from it here rather than through `Query<T>`.

use url::form_urlencoded;

use crate::application::{
    error::AppError,
    pagination::PageRequest,
    repos::{ProfessionalQueryFilter, ServiceOrdering, ServiceQueryFilter},
};

#[derive(Debug, Default)]
pub(super) struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub(super) fn parse(raw: &str) -> Self {
        Self {
            pairs: form_urlencoded::parse(raw.as_bytes())
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect(),
        }
    }

    /// First non-blank value for `name`.
    pub(super) fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty())
    }

    pub(super) fn page(&self) -> Result<PageRequest, AppError> {
        Ok(PageRequest::from_query(
            self.get("page"),
            self.get("page_size"),
        )?)
    }

    fn id(&self, name: &str) -> Result<Option<i64>, AppError> {
        self.get(name)
            .map(|raw| {
                raw.parse::<i64>()
                    .map_err(|_| AppError::validation(format!("`{name}` must be an integer")))
            })
            .transpose()
    }

    fn flag(&self, name: &str) -> Result<Option<bool>, AppError> {
        self.get(name)
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(AppError::validation(format!("`{name}` must be a boolean"))),
            })
            .transpose()
    }

    pub(super) fn service_filter(&self) -> Result<ServiceQueryFilter, AppError> {
        Ok(ServiceQueryFilter {
            category: self.id("category")?,
            is_featured: self.flag("is_featured")?,
            search: self.get("search").map(str::to_string),
            ordering: self
                .get("ordering")
                .and_then(|raw| raw.split(',').find_map(ServiceOrdering::parse)),
        })
    }

    pub(super) fn professional_filter(&self) -> Result<ProfessionalQueryFilter, AppError> {
        Ok(ProfessionalQueryFilter {
            search: self.get("search").map(str::to_string),
            service: self.id("service")?,
        })
    }
}
