//! Narrowing of list retrievals to the caller's region.

use crate::application::repos::ListParams;
use crate::domain::catalog::{ListEntity, RegionLink};
use crate::domain::regions::Region;

/// Restriction of a list retrieval to a single region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionScope {
    pub region_id: i64,
    pub link: RegionLink,
}

/// Narrow `params` to `region` when `E` is tied to regions.
///
/// Entities without a region association, and requests without a resolved
/// region, pass through unchanged.
pub fn filter<E: ListEntity>(params: ListParams, region: Option<&Region>) -> ListParams {
    match (region, E::REGION_LINK) {
        (Some(region), Some(link)) => ListParams {
            region: Some(RegionScope {
                region_id: region.id,
                link,
            }),
            ..params
        },
        _ => params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pagination::PageRequest;
    use crate::domain::catalog::{Category, Professional};

    fn region(id: i64, code: &str) -> Region {
        Region {
            id,
            code: code.to_string(),
            name: code.to_string(),
            currency: "GBP".to_string(),
            currency_symbol: "£".to_string(),
            timezone: "Europe/London".to_string(),
            country_code: "GB".to_string(),
            is_active: true,
            default_tax_rate: "0.2000".to_string(),
            support_email: String::new(),
            support_phone: String::new(),
        }
    }

    #[test]
    fn region_linked_entities_are_narrowed() {
        let uk = region(1, "UK");
        let params = filter::<Category>(ListParams::default(), Some(&uk));
        assert_eq!(
            params.region,
            Some(RegionScope {
                region_id: 1,
                link: RegionLink::Column,
            })
        );

        let params = filter::<Professional>(ListParams::default(), Some(&uk));
        assert_eq!(params.region.map(|scope| scope.link), Some(RegionLink::Membership));
    }

    #[test]
    fn missing_region_passes_through() {
        let params = ListParams::new(PageRequest::new(3, 10).unwrap());
        assert_eq!(filter::<Category>(params, None), params);
    }

    #[test]
    fn unlinked_entities_pass_through() {
        let uk = region(1, "UK");
        let params = ListParams::default();
        assert_eq!(filter::<Region>(params, Some(&uk)), params);
    }

    #[test]
    fn pagination_is_preserved() {
        let uae = region(2, "UAE");
        let page = PageRequest::new(2, 5).unwrap();
        let params = filter::<Category>(ListParams::new(page), Some(&uae));
        assert_eq!(params.page, page);
    }
}
