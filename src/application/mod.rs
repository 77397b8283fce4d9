//! Application services: region resolution, catalogue reads, pagination.

pub mod catalog;
pub mod error;
pub mod pagination;
pub mod region_filter;
pub mod regions;
pub mod repos;
