//! Catalogue entities served by the list endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::regions::{Region, RegionalSetting};

/// How an entity type is tied to a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionLink {
    /// The row carries (or inherits through its parent) a single `region_id`.
    Column,
    /// The row is linked to any number of regions through a membership table.
    Membership,
}

/// Entity types that can be listed.
///
/// `REGION_LINK` is `None` for entities that are visible in every region.
pub trait ListEntity {
    const REGION_LINK: Option<RegionLink>;
}

impl ListEntity for Region {
    const REGION_LINK: Option<RegionLink> = None;
}

impl ListEntity for RegionalSetting {
    const REGION_LINK: Option<RegionLink> = Some(RegionLink::Column);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub region_id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub is_active: bool,
    pub is_featured: bool,
    pub sort_order: i32,
}

impl ListEntity for Category {
    const REGION_LINK: Option<RegionLink> = Some(RegionLink::Column);
}

/// A bookable service; its region is the region of its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub category_id: i64,
    pub region_id: i64,
    pub name: String,
    pub description: String,
    /// Price in minor currency units of the owning region.
    pub base_price_minor: i64,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub sort_order: i32,
}

impl ListEntity for Service {
    const REGION_LINK: Option<RegionLink> = Some(RegionLink::Column);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professional {
    pub id: i64,
    pub display_name: String,
    pub bio: String,
    pub years_experience: i32,
    pub is_verified: bool,
    pub is_active: bool,
    pub region_ids: Vec<i64>,
    pub service_ids: Vec<i64>,
}

impl ListEntity for Professional {
    const REGION_LINK: Option<RegionLink> = Some(RegionLink::Membership);
}
