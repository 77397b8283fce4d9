use async_trait::async_trait;

use crate::{
    application::repos::{RegionsRepo, RepoError},
    domain::regions::{Region, RegionalSetting, SettingValueType},
};

use super::{PostgresRepositories, map_sqlx_error};

const REGION_COLUMNS: &str = "id, code, name, currency, currency_symbol, timezone, country_code, \
     is_active, default_tax_rate::TEXT AS default_tax_rate, support_email, support_phone";

#[derive(sqlx::FromRow)]
struct RegionRow {
    id: i64,
    code: String,
    name: String,
    currency: String,
    currency_symbol: String,
    timezone: String,
    country_code: String,
    is_active: bool,
    default_tax_rate: String,
    support_email: String,
    support_phone: String,
}

impl From<RegionRow> for Region {
    fn from(row: RegionRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
            currency: row.currency,
            currency_symbol: row.currency_symbol,
            timezone: row.timezone,
            country_code: row.country_code,
            is_active: row.is_active,
            default_tax_rate: row.default_tax_rate,
            support_email: row.support_email,
            support_phone: row.support_phone,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RegionalSettingRow {
    id: i64,
    region_id: i64,
    key: String,
    value: String,
    value_type: String,
    description: String,
}

impl TryFrom<RegionalSettingRow> for RegionalSetting {
    type Error = RepoError;

    fn try_from(row: RegionalSettingRow) -> Result<Self, Self::Error> {
        let value_type = SettingValueType::parse(&row.value_type).ok_or_else(|| {
            RepoError::from_persistence(format!(
                "regional setting `{}` has unknown value type `{}`",
                row.key, row.value_type
            ))
        })?;
        Ok(Self {
            id: row.id,
            region_id: row.region_id,
            key: row.key,
            value: row.value,
            value_type,
            description: row.description,
        })
    }
}

#[async_trait]
impl RegionsRepo for PostgresRepositories {
    async fn list_active_regions(&self) -> Result<Vec<Region>, RepoError> {
        let rows = sqlx::query_as::<_, RegionRow>(&format!(
            "SELECT {REGION_COLUMNS} FROM regions WHERE is_active ORDER BY name, id"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Region::from).collect())
    }

    async fn find_active_region(&self, code: &str) -> Result<Option<Region>, RepoError> {
        let row = sqlx::query_as::<_, RegionRow>(&format!(
            "SELECT {REGION_COLUMNS} FROM regions WHERE code = $1 AND is_active"
        ))
        .bind(code)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Region::from))
    }

    async fn list_regional_settings(
        &self,
        region_id: i64,
    ) -> Result<Vec<RegionalSetting>, RepoError> {
        let rows = sqlx::query_as::<_, RegionalSettingRow>(
            r#"
            SELECT id, region_id, key, value, value_type, description
            FROM regional_settings
            WHERE region_id = $1
            ORDER BY key
            "#,
        )
        .bind(region_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(RegionalSetting::try_from).collect()
    }
}
