//! Builds parameterized SELECT, COUNT and INSERT statements from registered tables.

use crate::config::TableDef;
use crate::error::AppError;
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from the registry).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

/// Result ordering. Unknown names fall back to [`SortType::Time`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortType {
    /// Newest first.
    #[default]
    Time,
    TimeAsc,
    Id,
    IdDesc,
}

impl SortType {
    pub fn parse_or_default(s: Option<&str>) -> Self {
        match s.map(str::trim) {
            Some("time") => SortType::Time,
            Some("time_asc") => SortType::TimeAsc,
            Some("id") => SortType::Id,
            Some("id_desc") => SortType::IdDesc,
            _ => SortType::Time,
        }
    }

    /// Every ordering ends on `id` so pages never overlap for equal timestamps.
    fn order_by(self) -> &'static str {
        match self {
            SortType::Time => "\"created_at\" DESC, \"id\" ASC",
            SortType::TimeAsc => "\"created_at\" ASC, \"id\" ASC",
            SortType::Id => "\"id\" ASC",
            SortType::IdDesc => "\"id\" DESC",
        }
    }
}

/// Column predicate against a bound value.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    Ne(String, Value),
}

impl Condition {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Eq(column.into(), value.into())
    }

    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Ne(column.into(), value.into())
    }
}

/// Row filter shared by page and count statements so both see the same predicate.
#[derive(Clone, Copy, Debug, Default)]
pub struct Filter<'a> {
    pub search_text: &'a str,
    pub search_columns: &'a [&'a str],
    pub conditions: &'a [Condition],
}

/// Escape LIKE metacharacters; the default escape character is backslash.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn check_column(table: &TableDef, column: &str) -> Result<(), AppError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(AppError::MalformedQuery(format!("{} has no column '{}'", table.name, column)))
    }
}

fn select_column_list(table: &TableDef) -> String {
    table.select_columns().map(quoted).collect::<Vec<_>>().join(", ")
}

fn where_clause(q: &mut QueryBuf, table: &TableDef, filter: &Filter<'_>) -> Result<String, AppError> {
    let mut where_parts = Vec::new();

    let search = filter.search_text.trim();
    if !search.is_empty() && !filter.search_columns.is_empty() {
        let param_num = q.push_param(Value::String(format!("%{}%", escape_like(search))));
        let mut ors = Vec::with_capacity(filter.search_columns.len());
        for col in filter.search_columns {
            check_column(table, col)?;
            ors.push(format!("{}::text ILIKE ${}", quoted(col), param_num));
        }
        where_parts.push(format!("({})", ors.join(" OR ")));
    }

    for cond in filter.conditions {
        let (col, val, op) = match cond {
            Condition::Eq(c, v) => (c, v, "="),
            Condition::Ne(c, v) => (c, v, "<>"),
        };
        let ty = table
            .column_type(col)
            .ok_or_else(|| AppError::MalformedQuery(format!("{} has no column '{}'", table.name, col)))?;
        let param_num = q.push_param(val.clone());
        where_parts.push(format!("{} {} ${}::{}", quoted(col), op, param_num, ty.pg_name()));
    }

    Ok(if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    })
}

/// Inner statement keeping only the newest row per group value.
fn distinct_latest(table_sql: &str, group_key: &str, cols: &str, where_sql: &str) -> String {
    format!(
        "SELECT DISTINCT ON ({g}) {cols} FROM {table}{where_sql} ORDER BY {g}, \"created_at\" DESC, \"id\" DESC",
        g = quoted(group_key),
        cols = cols,
        table = table_sql,
        where_sql = where_sql,
    )
}

/// SELECT one page of rows matching the filter.
pub fn select_page(
    schema: &str,
    table: &TableDef,
    filter: &Filter<'_>,
    sort: SortType,
    limit: u64,
    offset: u64,
) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, table, filter)?;
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} LIMIT {} OFFSET {}",
        select_column_list(table),
        qualified_table(schema, table.name),
        where_sql,
        sort.order_by(),
        limit,
        offset
    );
    Ok(q)
}

/// SELECT every row matching the filter, unpaginated. For bounded sets such as one key's history.
pub fn select_where(schema: &str, table: &TableDef, filter: &Filter<'_>, sort: SortType) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, table, filter)?;
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}",
        select_column_list(table),
        qualified_table(schema, table.name),
        where_sql,
        sort.order_by()
    );
    Ok(q)
}

/// COUNT rows matching the filter.
pub fn count(schema: &str, table: &TableDef, filter: &Filter<'_>) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, table, filter)?;
    q.sql = format!("SELECT COUNT(*) FROM {}{}", qualified_table(schema, table.name), where_sql);
    Ok(q)
}

/// SELECT one page of the newest row per `group_key` among rows matching the filter.
/// Collapsing happens in the database before sorting and pagination.
pub fn select_latest_page(
    schema: &str,
    table: &TableDef,
    group_key: &str,
    filter: &Filter<'_>,
    sort: SortType,
    limit: u64,
    offset: u64,
) -> Result<QueryBuf, AppError> {
    check_column(table, group_key)?;
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, table, filter)?;
    let cols = select_column_list(table);
    let inner = distinct_latest(&qualified_table(schema, table.name), group_key, &cols, &where_sql);
    q.sql = format!(
        "SELECT {} FROM ({}) AS latest ORDER BY {} LIMIT {} OFFSET {}",
        cols,
        inner,
        sort.order_by(),
        limit,
        offset
    );
    Ok(q)
}

/// COUNT distinct group values among rows matching the filter.
pub fn count_latest(schema: &str, table: &TableDef, group_key: &str, filter: &Filter<'_>) -> Result<QueryBuf, AppError> {
    check_column(table, group_key)?;
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, table, filter)?;
    let inner = distinct_latest(&qualified_table(schema, table.name), group_key, &quoted("id"), &where_sql);
    q.sql = format!("SELECT COUNT(*) FROM ({}) AS latest", inner);
    Ok(q)
}

/// Histogram of `column` over the newest row per `group_key`: rows of (value, count).
pub fn count_latest_by(schema: &str, table: &TableDef, group_key: &str, column: &str) -> Result<QueryBuf, AppError> {
    check_column(table, group_key)?;
    check_column(table, column)?;
    let mut q = QueryBuf::new();
    let inner = distinct_latest(&qualified_table(schema, table.name), group_key, &quoted(column), "");
    q.sql = format!(
        "SELECT {c}, COUNT(*) FROM ({inner}) AS latest GROUP BY {c} ORDER BY {c}",
        c = quoted(column),
        inner = inner
    );
    Ok(q)
}

/// COUNT every row of a table.
pub fn count_all(schema: &str, table: &TableDef) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT COUNT(*) FROM {}", qualified_table(schema, table.name));
    q
}

/// INSERT one row. Store-managed columns are never accepted from the caller.
/// Each placeholder is cast to the column type so JSON-derived values bind correctly.
pub fn insert(schema: &str, table: &TableDef, values: &[(&str, Value)]) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    for (name, val) in values {
        let column = table
            .columns
            .iter()
            .find(|c| c.name == *name)
            .ok_or_else(|| AppError::MalformedQuery(format!("{} has no writable column '{}'", table.name, name)))?;
        let param_num = q.push_param(val.clone());
        cols.push(quoted(name));
        placeholders.push(format!("${}::{}", param_num, column.sql_type.pg_name()));
    }
    if cols.is_empty() {
        return Err(AppError::MalformedQuery(format!("insert into {} without columns", table.name)));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        qualified_table(schema, table.name),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(table)
    );
    Ok(q)
}
