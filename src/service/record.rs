//! Record store writes: one INSERT per call, returning the stored row.

use crate::config::TableRegistry;
use crate::error::AppError;
use crate::model::{NewRecord, Record};
use crate::sql::{insert, PgBindValue};
use sqlx::PgExecutor;

pub struct RecordStore;

impl RecordStore {
    /// Insert one row. Works against the pool or inside a transaction (`&mut *tx`).
    pub async fn insert<'e, E, N>(executor: E, registry: &TableRegistry, new: &N) -> Result<N::Record, AppError>
    where
        E: PgExecutor<'e>,
        N: NewRecord,
    {
        let table_name = <N::Record as Record>::TABLE;
        let table = registry
            .table(table_name)
            .ok_or_else(|| AppError::MalformedQuery(format!("table '{}' is not registered", table_name)))?;
        let q = insert(registry.schema(), table, &new.values())?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "insert");
        let mut query = sqlx::query_as::<_, N::Record>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        Ok(query.fetch_one(executor).await?)
    }
}
