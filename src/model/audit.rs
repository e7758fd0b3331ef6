//! Operator actions and logins. Written by the server, never by request bodies.

use super::{NewRecord, Record, RecordMeta};
use crate::config::{ColumnDef, SqlType, TableDef};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::FromRow;

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OperationLog {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub operator: String,
    pub operator_ip: String,
    pub operation_time: DateTime<Utc>,
    pub record: String,
    pub satellite_id: String,
    pub satellite_name: String,
}

impl Record for OperationLog {
    const TABLE: &'static str = "operation_log";
    const SEARCH_COLUMNS: &'static [&'static str] = &["operator", "satellite_id", "satellite_name"];

    fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::new("operator", SqlType::Text),
                ColumnDef::new("operator_ip", SqlType::Text),
                ColumnDef::new("operation_time", SqlType::Timestamptz),
                ColumnDef::new("record", SqlType::Text),
                ColumnDef::new("satellite_id", SqlType::Text),
                ColumnDef::new("satellite_name", SqlType::Text),
            ],
        )
        .group_key("satellite_id")
    }
}

#[derive(Clone, Debug)]
pub struct NewOperationLog {
    pub operator: String,
    pub operator_ip: String,
    pub operation_time: DateTime<Utc>,
    pub record: String,
    pub satellite_id: String,
    pub satellite_name: String,
}

impl NewRecord for NewOperationLog {
    type Record = OperationLog;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("operator", json!(self.operator)),
            ("operator_ip", json!(self.operator_ip)),
            ("operation_time", json!(self.operation_time.to_rfc3339())),
            ("record", json!(self.record)),
            ("satellite_id", json!(self.satellite_id)),
            ("satellite_name", json!(self.satellite_name)),
        ]
    }
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LoginLog {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub user_name: String,
    pub login_ip: String,
    pub login_time: DateTime<Utc>,
}

impl Record for LoginLog {
    const TABLE: &'static str = "login_log";
    const SEARCH_COLUMNS: &'static [&'static str] = &["user_name"];

    fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::new("user_name", SqlType::Text),
                ColumnDef::new("login_ip", SqlType::Text),
                ColumnDef::new("login_time", SqlType::Timestamptz),
            ],
        )
        .group_key("user_name")
    }
}

#[derive(Clone, Debug)]
pub struct NewLoginLog {
    pub user_name: String,
    pub login_ip: String,
    pub login_time: DateTime<Utc>,
}

impl NewRecord for NewLoginLog {
    type Record = LoginLog;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_name", json!(self.user_name)),
            ("login_ip", json!(self.login_ip)),
            ("login_time", json!(self.login_time.to_rfc3339())),
        ]
    }
}
