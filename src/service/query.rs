//! Query engine: paged, filtered and latest-per-key reads over registered tables.

use crate::config::{TableDef, TableRegistry};
use crate::error::AppError;
use crate::model::Record;
use crate::sql::{self, Condition, Filter, PgBindValue, QueryBuf, SortType};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{FromRow, PgPool, Postgres};
use std::collections::HashMap;

/// Largest page a caller can ask for. Larger sizes are clamped.
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Validated pagination, ordering and free-text search of one list request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u64,
    pub page_size: u64,
    pub sort: SortType,
    pub search: String,
    offset: u64,
}

impl ListQuery {
    pub fn new(page: i64, page_size: i64, sort: SortType, search: impl Into<String>) -> Result<Self, AppError> {
        if page < 1 {
            return Err(AppError::InvalidArgument("page must be at least 1".into()));
        }
        if page_size < 1 {
            return Err(AppError::InvalidArgument("pageSize must be at least 1".into()));
        }
        let page_size = page_size.min(MAX_PAGE_SIZE as i64);
        let offset = (page - 1)
            .checked_mul(page_size)
            .ok_or_else(|| AppError::InvalidArgument("page is out of range".into()))?;
        Ok(ListQuery {
            page: page as u64,
            page_size: page_size as u64,
            sort,
            search: search.into(),
            offset: offset as u64,
        })
    }

    /// From raw query parameters: `page`, `pageSize` (required), `sortType`, `searchConditions`.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let page = required_int(params, "page")?;
        let page_size = required_int(params, "pageSize")?;
        let sort = SortType::parse_or_default(params.get("sortType").map(String::as_str));
        let search = params.get("searchConditions").cloned().unwrap_or_default();
        Self::new(page, page_size, sort, search)
    }

    pub fn limit(&self) -> u64 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

fn required_int(params: &HashMap<String, String>, name: &str) -> Result<i64, AppError> {
    let raw = params
        .get(name)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::MissingParameter(name.to_string()))?;
    raw.parse::<i64>()
        .map_err(|_| AppError::InvalidFormat(format!("{} '{}' is not an integer", name, raw)))
}

/// One page of typed rows plus the number of rows matching the same predicate.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

fn typed<'q, R>(q: &'q QueryBuf) -> QueryAs<'q, Postgres, R, PgArguments>
where
    R: for<'r> FromRow<'r, PgRow>,
{
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query_as::<_, R>(&q.sql);
    for p in &q.params {
        query = query.bind(PgBindValue::from_json(p));
    }
    query
}

fn scalar(q: &QueryBuf) -> QueryScalar<'_, Postgres, i64, PgArguments> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
    for p in &q.params {
        query = query.bind(PgBindValue::from_json(p));
    }
    query
}

fn as_total(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

/// Read side of the record store. Holds no state of its own.
#[derive(Clone, Copy)]
pub struct QueryEngine<'a> {
    pool: &'a PgPool,
    registry: &'a TableRegistry,
}

impl<'a> QueryEngine<'a> {
    pub fn new(pool: &'a PgPool, registry: &'a TableRegistry) -> Self {
        QueryEngine { pool, registry }
    }

    fn table<R: Record>(&self) -> Result<&'a TableDef, AppError> {
        self.registry
            .table(R::TABLE)
            .ok_or_else(|| AppError::MalformedQuery(format!("table '{}' is not registered", R::TABLE)))
    }

    /// Filtered page in the requested order. `conditions` are AND-ed with the search.
    pub async fn paged<R: Record>(&self, q: &ListQuery, conditions: &[Condition]) -> Result<Page<R>, AppError> {
        let table = self.table::<R>()?;
        let schema = self.registry.schema();
        let filter = Filter {
            search_text: &q.search,
            search_columns: R::SEARCH_COLUMNS,
            conditions,
        };
        let rows_q = sql::select_page(schema, table, &filter, q.sort, q.limit(), q.offset())?;
        let count_q = sql::count(schema, table, &filter)?;
        let (items, total) = tokio::try_join!(
            typed::<R>(&rows_q).fetch_all(self.pool),
            scalar(&count_q).fetch_one(self.pool)
        )?;
        Ok(Page {
            items,
            total: as_total(total),
        })
    }

    /// Newest row per group key among the filtered rows, then sorted and paged.
    /// `total` is the number of distinct keys.
    pub async fn latest_per_key<R: Record>(
        &self,
        q: &ListQuery,
        conditions: &[Condition],
    ) -> Result<Page<R>, AppError> {
        let table = self.table::<R>()?;
        let group_key = table
            .group_key
            .ok_or_else(|| AppError::MalformedQuery(format!("table '{}' has no group key", table.name)))?;
        let schema = self.registry.schema();
        let filter = Filter {
            search_text: &q.search,
            search_columns: R::SEARCH_COLUMNS,
            conditions,
        };
        let rows_q = sql::select_latest_page(schema, table, group_key, &filter, q.sort, q.limit(), q.offset())?;
        let count_q = sql::count_latest(schema, table, group_key, &filter)?;
        let (items, total) = tokio::try_join!(
            typed::<R>(&rows_q).fetch_all(self.pool),
            scalar(&count_q).fetch_one(self.pool)
        )?;
        Ok(Page {
            items,
            total: as_total(total),
        })
    }

    /// Every row with `column = value`, oldest first.
    pub async fn history<R: Record>(&self, column: &str, value: Value) -> Result<Vec<R>, AppError> {
        let table = self.table::<R>()?;
        let conditions = [Condition::Eq(column.to_string(), value)];
        let filter = Filter {
            conditions: &conditions,
            ..Filter::default()
        };
        let q = sql::select_where(self.registry.schema(), table, &filter, SortType::TimeAsc)?;
        Ok(typed::<R>(&q).fetch_all(self.pool).await?)
    }

    /// Most recent row matching `conditions`.
    pub async fn latest_one<R: Record>(&self, conditions: &[Condition]) -> Result<Option<R>, AppError> {
        let table = self.table::<R>()?;
        let filter = Filter {
            conditions,
            ..Filter::default()
        };
        let q = sql::select_page(self.registry.schema(), table, &filter, SortType::Time, 1, 0)?;
        Ok(typed::<R>(&q).fetch_optional(self.pool).await?)
    }

    /// Row count of every registered table, in registration order.
    pub async fn table_counts(&self) -> Result<Vec<(&'a str, u64)>, AppError> {
        let mut out = Vec::with_capacity(self.registry.tables().len());
        for table in self.registry.tables() {
            let q = sql::count_all(self.registry.schema(), table);
            let n = scalar(&q).fetch_one(self.pool).await?;
            out.push((table.name, as_total(n)));
        }
        Ok(out)
    }

    /// Histogram of an enumerated column over the newest row per group key.
    pub async fn latest_counts_by<R: Record>(&self, column: &str) -> Result<Vec<(i16, u64)>, AppError> {
        let table = self.table::<R>()?;
        let group_key = table
            .group_key
            .ok_or_else(|| AppError::MalformedQuery(format!("table '{}' has no group key", table.name)))?;
        let q = sql::count_latest_by(self.registry.schema(), table, group_key, column)?;
        let rows = typed::<(i16, i64)>(&q).fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(|(code, n)| (code, as_total(n))).collect())
    }
}
