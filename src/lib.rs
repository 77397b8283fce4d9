//! LabMyShare catalogue read API: region-aware list endpoints behind a
//! read-through response cache.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
