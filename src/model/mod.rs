//! Typed records: one row type, one insert type and one request type per resource table.

mod audit;
mod debris;
mod enums;
mod instruction;
mod satellite;
mod telemetry;
mod user;

pub use audit::*;
pub use debris::*;
pub use enums::*;
pub use instruction::*;
pub use satellite::*;
pub use telemetry::*;
pub use user::*;

use crate::config::{TableDef, TableRegistry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::FromRow;

/// Store-managed columns carried by every row.
#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row type bound to one registered table.
pub trait Record: for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin {
    const TABLE: &'static str;
    /// Columns matched by the free-text search of list endpoints.
    const SEARCH_COLUMNS: &'static [&'static str];

    fn table_def() -> TableDef;
}

/// Validated values for one insert into `Self::Record`'s table.
pub trait NewRecord {
    type Record: Record;

    /// Column name and value pairs. Timestamps as RFC 3339 text, enums as codes.
    fn values(&self) -> Vec<(&'static str, Value)>;
}

/// Every record table of the service, in creation order.
pub fn registry(schema: &str) -> TableRegistry {
    TableRegistry::new(schema)
        .register(SatelliteState::table_def())
        .register(Orbit::table_def())
        .register(Constellation::table_def())
        .register(SatelliteControl::table_def())
        .register(Fault::table_def())
        .register(NetState::table_def())
        .register(CommState::table_def())
        .register(Debris::table_def())
        .register(Instruction::table_def())
        .register(OperationLog::table_def())
        .register(LoginLog::table_def())
        .register(User::table_def())
}
