use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::{
    application::{
        pagination::Page,
        repos::{
            CatalogRepo, ListParams, ProfessionalQueryFilter, RepoError, ServiceQueryFilter,
        },
    },
    domain::catalog::{Category, Professional, Service},
};

use super::{
    PostgresRepositories, map_sqlx_error,
    util::{RegionSql, convert_count, like_pattern, push_page, push_region_scope},
};

/// Categories own their region; services inherit it through the category join.
const CATEGORY_REGION: RegionSql = RegionSql {
    column: Some("c.region_id"),
    membership: None,
};

const PROFESSIONAL_REGION: RegionSql = RegionSql {
    column: None,
    membership: Some("SELECT 1 FROM professional_regions m WHERE m.professional_id = p.id"),
};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    region_id: i64,
    name: String,
    slug: String,
    description: String,
    is_active: bool,
    is_featured: bool,
    sort_order: i32,
    total_count: i64,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            region_id: row.region_id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            is_active: row.is_active,
            is_featured: row.is_featured,
            sort_order: row.sort_order,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: i64,
    category_id: i64,
    region_id: i64,
    name: String,
    description: String,
    base_price_minor: i64,
    duration_minutes: i32,
    is_active: bool,
    is_featured: bool,
    sort_order: i32,
    total_count: i64,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            region_id: row.region_id,
            name: row.name,
            description: row.description,
            base_price_minor: row.base_price_minor,
            duration_minutes: row.duration_minutes,
            is_active: row.is_active,
            is_featured: row.is_featured,
            sort_order: row.sort_order,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProfessionalRow {
    id: i64,
    display_name: String,
    bio: String,
    years_experience: i32,
    is_verified: bool,
    is_active: bool,
    region_ids: Vec<i64>,
    service_ids: Vec<i64>,
    total_count: i64,
}

impl From<ProfessionalRow> for Professional {
    fn from(row: ProfessionalRow) -> Self {
        Self {
            id: row.id,
            display_name: row.display_name,
            bio: row.bio,
            years_experience: row.years_experience,
            is_verified: row.is_verified,
            is_active: row.is_active,
            region_ids: row.region_ids,
            service_ids: row.service_ids,
        }
    }
}

/// Rows carry `COUNT(*) OVER ()`; an empty page reports zero.
fn into_page<R, T>(rows: Vec<R>, total: impl Fn(&R) -> i64) -> Result<Page<T>, RepoError>
where
    T: From<R>,
{
    let count = match rows.first() {
        Some(row) => convert_count(total(row))?,
        None => 0,
    };
    Ok(Page::new(count, rows.into_iter().map(T::from).collect()))
}

impl PostgresRepositories {
    fn apply_service_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ServiceQueryFilter) {
        if let Some(category) = filter.category {
            qb.push(" AND s.category_id = ");
            qb.push_bind(category);
        }

        if let Some(is_featured) = filter.is_featured {
            qb.push(" AND s.is_featured = ");
            qb.push_bind(is_featured);
        }

        if let Some(search) = filter.search.as_deref() {
            let pattern = like_pattern(search);
            qb.push(" AND (s.name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR s.description ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
    }

    fn push_service_ordering(qb: &mut QueryBuilder<'_, Postgres>, filter: &ServiceQueryFilter) {
        match filter.ordering {
            Some(ordering) => {
                qb.push(" ORDER BY s.");
                qb.push(ordering.field.column());
                qb.push(if ordering.descending { " DESC" } else { " ASC" });
                qb.push(", s.id");
            }
            None => {
                qb.push(" ORDER BY s.sort_order, s.name, s.id");
            }
        }
    }

    fn apply_professional_filter(
        qb: &mut QueryBuilder<'_, Postgres>,
        filter: &ProfessionalQueryFilter,
    ) {
        if let Some(search) = filter.search.as_deref() {
            let pattern = like_pattern(search);
            qb.push(" AND (p.display_name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR p.bio ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        if let Some(service) = filter.service {
            qb.push(
                " AND EXISTS (SELECT 1 FROM professional_services ps \
                 WHERE ps.professional_id = p.id AND ps.service_id = ",
            );
            qb.push_bind(service);
            qb.push(")");
        }
    }
}

#[async_trait]
impl CatalogRepo for PostgresRepositories {
    async fn list_categories(&self, params: &ListParams) -> Result<Page<Category>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT c.id, c.region_id, c.name, c.slug, c.description, c.is_active, \
                    c.is_featured, c.sort_order, COUNT(*) OVER () AS total_count \
             FROM categories c \
             WHERE c.is_active",
        );
        push_region_scope(&mut qb, params.region, &CATEGORY_REGION)?;
        qb.push(" ORDER BY c.sort_order, c.name, c.id");
        push_page(&mut qb, params.page.limit(), params.page.offset());

        let rows = qb
            .build_query_as::<CategoryRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        into_page(rows, |row| row.total_count)
    }

    async fn list_featured_categories(&self, region_id: i64) -> Result<Vec<Category>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT c.id, c.region_id, c.name, c.slug, c.description, c.is_active,
                   c.is_featured, c.sort_order, COUNT(*) OVER () AS total_count
            FROM categories c
            WHERE c.region_id = $1 AND c.is_active AND c.is_featured
            ORDER BY c.sort_order, c.name, c.id
            "#,
        )
        .bind(region_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn list_services(
        &self,
        params: &ListParams,
        filter: &ServiceQueryFilter,
    ) -> Result<Page<Service>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT s.id, s.category_id, c.region_id, s.name, s.description, \
                    s.base_price_minor, s.duration_minutes, s.is_active, s.is_featured, \
                    s.sort_order, COUNT(*) OVER () AS total_count \
             FROM services s \
             INNER JOIN categories c ON c.id = s.category_id \
             WHERE s.is_active AND c.is_active",
        );
        push_region_scope(&mut qb, params.region, &CATEGORY_REGION)?;
        Self::apply_service_filter(&mut qb, filter);
        Self::push_service_ordering(&mut qb, filter);
        push_page(&mut qb, params.page.limit(), params.page.offset());

        let rows = qb
            .build_query_as::<ServiceRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        into_page(rows, |row| row.total_count)
    }

    async fn list_professionals(
        &self,
        params: &ListParams,
        filter: &ProfessionalQueryFilter,
    ) -> Result<Page<Professional>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT p.id, p.display_name, p.bio, p.years_experience, p.is_verified, p.is_active, \
                    ARRAY(SELECT pr.region_id FROM professional_regions pr \
                          WHERE pr.professional_id = p.id ORDER BY pr.region_id) AS region_ids, \
                    ARRAY(SELECT ps.service_id FROM professional_services ps \
                          WHERE ps.professional_id = p.id ORDER BY ps.service_id) AS service_ids, \
                    COUNT(*) OVER () AS total_count \
             FROM professionals p \
             WHERE p.is_active",
        );
        push_region_scope(&mut qb, params.region, &PROFESSIONAL_REGION)?;
        Self::apply_professional_filter(&mut qb, filter);
        qb.push(" ORDER BY p.display_name, p.id");
        push_page(&mut qb, params.page.limit(), params.page.offset());

        let rows = qb
            .build_query_as::<ProfessionalRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        into_page(rows, |row| row.total_count)
    }
}
