//! Page-number pagination shared by the list endpoints.

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// One-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Result<Self, PaginationError> {
        if page == 0 {
            return Err(PaginationError::InvalidPage(page.to_string()));
        }
        Ok(Self {
            page,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        })
    }

    /// Parse the raw `page` / `page_size` query values.
    ///
    /// A malformed page is an error; a malformed page size falls back to the
    /// default and oversized values are clamped.
    pub fn from_query(page: Option<&str>, page_size: Option<&str>) -> Result<Self, PaginationError> {
        let page = match page.map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| PaginationError::InvalidPage(raw.to_string()))?,
        };
        let page_size = page_size
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self::new(page, page_size)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            count: 0,
            results: Vec::new(),
        }
    }

    pub fn new(count: u64, results: Vec<T>) -> Self {
        Self { count, results }
    }

    /// Slice an already filtered, ordered collection.
    pub fn from_vec(items: Vec<T>, request: PageRequest) -> Self {
        let count = items.len() as u64;
        let results = items
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Self { count, results }
    }

    /// Pages past the last one are rejected, except an empty first page.
    pub fn ensure_in_range(self, request: PageRequest) -> Result<Self, PaginationError> {
        if request.page > 1 && request.offset() >= self.count {
            return Err(PaginationError::InvalidPage(request.page.to_string()));
        }
        Ok(self)
    }
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid page `{0}`")]
    InvalidPage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_absent() {
        let request = PageRequest::from_query(None, None).expect("defaults");
        assert_eq!(request, PageRequest::default());
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn page_size_is_clamped_and_lenient() {
        let request = PageRequest::from_query(Some("3"), Some("500")).unwrap();
        assert_eq!(request.page_size, MAX_PAGE_SIZE);
        assert_eq!(request.offset(), 200);

        let request = PageRequest::from_query(Some("2"), Some("lots")).unwrap();
        assert_eq!(request.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn malformed_or_zero_page_is_rejected() {
        assert!(PageRequest::from_query(Some("abc"), None).is_err());
        assert!(PageRequest::from_query(Some("0"), None).is_err());
        assert!(PageRequest::from_query(Some("-1"), None).is_err());
    }

    #[test]
    fn from_vec_slices_and_counts() {
        let request = PageRequest::new(2, 2).unwrap();
        let page = Page::from_vec(vec![1, 2, 3, 4, 5], request);
        assert_eq!(page.count, 5);
        assert_eq!(page.results, vec![3, 4]);
    }

    #[test]
    fn pages_past_the_end_are_out_of_range() {
        let empty: Page<i32> = Page::empty();
        assert!(empty.clone().ensure_in_range(PageRequest::default()).is_ok());
        assert!(empty.ensure_in_range(PageRequest::new(2, 20).unwrap()).is_err());

        let page = Page::new(21, vec![21]);
        assert!(page.ensure_in_range(PageRequest::new(2, 20).unwrap()).is_ok());
    }
}
