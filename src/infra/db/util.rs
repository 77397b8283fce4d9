use sqlx::{Postgres, QueryBuilder};

use crate::application::{region_filter::RegionScope, repos::RepoError};
use crate::domain::catalog::RegionLink;

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) if db.message().contains("invalid input syntax") => {
            RepoError::InvalidInput {
                message: db.message().to_string(),
            }
        }
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to statement timeout") =>
        {
            RepoError::Timeout
        }
        other => RepoError::from_persistence(other),
    }
}

/// How a table reaches its region in SQL.
pub(super) struct RegionSql {
    /// Qualified column holding the region id, e.g. `c.region_id`.
    pub column: Option<&'static str>,
    /// Correlated subquery over a membership table aliased `m`; the region
    /// comparison is appended.
    pub membership: Option<&'static str>,
}

pub(super) fn push_region_scope(
    qb: &mut QueryBuilder<'_, Postgres>,
    scope: Option<RegionScope>,
    sql: &RegionSql,
) -> Result<(), RepoError> {
    let Some(scope) = scope else {
        return Ok(());
    };

    match (scope.link, sql.column, sql.membership) {
        (RegionLink::Column, Some(column), _) => {
            qb.push(" AND ");
            qb.push(column);
            qb.push(" = ");
            qb.push_bind(scope.region_id);
        }
        (RegionLink::Membership, _, Some(membership)) => {
            qb.push(" AND EXISTS (");
            qb.push(membership);
            qb.push(" AND m.region_id = ");
            qb.push_bind(scope.region_id);
            qb.push(")");
        }
        (link, _, _) => {
            return Err(RepoError::from_persistence(format!(
                "no SQL mapping for region link {link:?}"
            )));
        }
    }
    Ok(())
}

pub(super) fn push_page(qb: &mut QueryBuilder<'_, Postgres>, limit: u64, offset: u64) {
    qb.push(" LIMIT ");
    qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    qb.push(" OFFSET ");
    qb.push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
}

pub(super) fn convert_count(value: i64) -> Result<u64, RepoError> {
    value
        .try_into()
        .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
}

pub(super) fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQL: RegionSql = RegionSql {
        column: Some("c.region_id"),
        membership: Some("SELECT 1 FROM professional_regions m WHERE m.professional_id = p.id"),
    };

    #[test]
    fn column_scope_compares_region_id() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_region_scope(
            &mut qb,
            Some(RegionScope {
                region_id: 7,
                link: RegionLink::Column,
            }),
            &SQL,
        )
        .unwrap();
        assert_eq!(qb.sql(), "SELECT 1 WHERE TRUE AND c.region_id = $1");
    }

    #[test]
    fn membership_scope_uses_exists() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_region_scope(
            &mut qb,
            Some(RegionScope {
                region_id: 7,
                link: RegionLink::Membership,
            }),
            &SQL,
        )
        .unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT 1 WHERE TRUE AND EXISTS (SELECT 1 FROM professional_regions m \
             WHERE m.professional_id = p.id AND m.region_id = $1)"
        );
    }

    #[test]
    fn global_scope_adds_nothing() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_region_scope(&mut qb, None, &SQL).unwrap();
        assert_eq!(qb.sql(), "SELECT 1 WHERE TRUE");
    }

    #[test]
    fn missing_mapping_is_an_error() {
        let column_only = RegionSql {
            column: Some("c.region_id"),
            membership: None,
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        let scope = RegionScope {
            region_id: 1,
            link: RegionLink::Membership,
        };
        assert!(push_region_scope(&mut qb, Some(scope), &column_only).is_err());
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
