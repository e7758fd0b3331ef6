//! Faults and link states reported by the execution side.

use super::{FaultType, NewRecord, Record, RecordMeta, State};
use crate::config::{ColumnDef, SqlType, TableDef};
use crate::error::AppError;
use crate::service::RequestValidator as V;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Fault {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub satellite_id: String,
    pub satellite_name: String,
    pub orbit_id: String,
    pub fault_type: FaultType,
    pub description: String,
    pub fault_time: DateTime<Utc>,
    pub repair_state: State,
}

impl Record for Fault {
    const TABLE: &'static str = "fault";
    const SEARCH_COLUMNS: &'static [&'static str] = &["satellite_id", "satellite_name"];

    fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::new("satellite_id", SqlType::Text),
                ColumnDef::new("satellite_name", SqlType::Text),
                ColumnDef::new("orbit_id", SqlType::Text),
                ColumnDef::new("fault_type", SqlType::SmallInt),
                ColumnDef::new("description", SqlType::Text),
                ColumnDef::new("fault_time", SqlType::Timestamptz),
                ColumnDef::new("repair_state", SqlType::SmallInt),
            ],
        )
        .group_key("satellite_id")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddFault {
    pub satellite_id: Option<String>,
    pub satellite_name: Option<String>,
    pub orbit_id: Option<String>,
    pub fault_type: Option<String>,
    pub description: Option<String>,
    /// Defaults to the time the report is received.
    pub fault_time: Option<DateTime<Utc>>,
    pub repair_state: Option<String>,
}

#[derive(Debug)]
pub struct NewFault {
    pub satellite_id: String,
    pub satellite_name: String,
    pub orbit_id: String,
    pub fault_type: FaultType,
    pub description: String,
    pub fault_time: DateTime<Utc>,
    pub repair_state: State,
}

impl AddFault {
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewFault, AppError> {
        Ok(NewFault {
            satellite_id: V::business_key(self.satellite_id, "satelliteId")?,
            satellite_name: V::required_text(self.satellite_name, "satelliteName")?,
            orbit_id: V::required_text(self.orbit_id, "orbitId")?,
            fault_type: V::enumerated(self.fault_type, "faultType")?,
            description: V::required_text(self.description, "description")?,
            fault_time: self.fault_time.unwrap_or(now),
            repair_state: V::enumerated(self.repair_state, "repairState")?,
        })
    }
}

impl NewRecord for NewFault {
    type Record = Fault;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("satellite_id", json!(self.satellite_id)),
            ("satellite_name", json!(self.satellite_name)),
            ("orbit_id", json!(self.orbit_id)),
            ("fault_type", json!(self.fault_type.code())),
            ("description", json!(self.description)),
            ("fault_time", json!(self.fault_time.to_rfc3339())),
            ("repair_state", json!(self.repair_state.code())),
        ]
    }
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NetState {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub satellite_id: String,
    pub satellite_name: String,
    pub orbit_id: String,
    pub segment: String,
    pub state: State,
    pub bandwidth: String,
}

impl Record for NetState {
    const TABLE: &'static str = "net_state";
    const SEARCH_COLUMNS: &'static [&'static str] = &["satellite_id", "satellite_name"];

    fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::new("satellite_id", SqlType::Text),
                ColumnDef::new("satellite_name", SqlType::Text),
                ColumnDef::new("orbit_id", SqlType::Text),
                ColumnDef::new("segment", SqlType::Text),
                ColumnDef::new("state", SqlType::SmallInt),
                ColumnDef::new("bandwidth", SqlType::Text),
            ],
        )
        .group_key("satellite_id")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddNetState {
    pub satellite_id: Option<String>,
    pub satellite_name: Option<String>,
    pub orbit_id: Option<String>,
    pub segment: Option<String>,
    pub state: Option<String>,
    pub bandwidth: Option<String>,
}

#[derive(Debug)]
pub struct NewNetState {
    pub satellite_id: String,
    pub satellite_name: String,
    pub orbit_id: String,
    pub segment: String,
    pub state: State,
    pub bandwidth: String,
}

impl AddNetState {
    pub fn validate(self) -> Result<NewNetState, AppError> {
        Ok(NewNetState {
            satellite_id: V::business_key(self.satellite_id, "satelliteId")?,
            satellite_name: V::required_text(self.satellite_name, "satelliteName")?,
            orbit_id: V::required_text(self.orbit_id, "orbitId")?,
            segment: V::required_text(self.segment, "segment")?,
            state: V::enumerated(self.state, "state")?,
            bandwidth: V::required_text(self.bandwidth, "bandwidth")?,
        })
    }
}

impl NewRecord for NewNetState {
    type Record = NetState;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("satellite_id", json!(self.satellite_id)),
            ("satellite_name", json!(self.satellite_name)),
            ("orbit_id", json!(self.orbit_id)),
            ("segment", json!(self.segment)),
            ("state", json!(self.state.code())),
            ("bandwidth", json!(self.bandwidth)),
        ]
    }
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommState {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub satellite_id: String,
    pub satellite_name: String,
    pub orbit_id: String,
    pub state: State,
    pub bandwidth: String,
    pub delay: String,
    pub port: String,
    pub link_load: String,
}

impl Record for CommState {
    const TABLE: &'static str = "comm_state";
    const SEARCH_COLUMNS: &'static [&'static str] = &["satellite_id", "satellite_name"];

    fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::new("satellite_id", SqlType::Text),
                ColumnDef::new("satellite_name", SqlType::Text),
                ColumnDef::new("orbit_id", SqlType::Text),
                ColumnDef::new("state", SqlType::SmallInt),
                ColumnDef::new("bandwidth", SqlType::Text),
                ColumnDef::new("delay", SqlType::Text),
                ColumnDef::new("port", SqlType::Text),
                ColumnDef::new("link_load", SqlType::Text),
            ],
        )
        .group_key("satellite_id")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddCommState {
    pub satellite_id: Option<String>,
    pub satellite_name: Option<String>,
    pub orbit_id: Option<String>,
    pub state: Option<String>,
    pub bandwidth: Option<String>,
    pub delay: Option<String>,
    pub port: Option<String>,
    pub link_load: Option<String>,
}

#[derive(Debug)]
pub struct NewCommState {
    pub satellite_id: String,
    pub satellite_name: String,
    pub orbit_id: String,
    pub state: State,
    pub bandwidth: String,
    pub delay: String,
    pub port: String,
    pub link_load: String,
}

impl AddCommState {
    pub fn validate(self) -> Result<NewCommState, AppError> {
        Ok(NewCommState {
            satellite_id: V::business_key(self.satellite_id, "satelliteId")?,
            satellite_name: V::required_text(self.satellite_name, "satelliteName")?,
            orbit_id: V::required_text(self.orbit_id, "orbitId")?,
            state: V::enumerated(self.state, "state")?,
            bandwidth: V::required_text(self.bandwidth, "bandwidth")?,
            delay: V::required_text(self.delay, "delay")?,
            port: V::required_text(self.port, "port")?,
            link_load: V::required_text(self.link_load, "linkLoad")?,
        })
    }
}

impl NewRecord for NewCommState {
    type Record = CommState;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("satellite_id", json!(self.satellite_id)),
            ("satellite_name", json!(self.satellite_name)),
            ("orbit_id", json!(self.orbit_id)),
            ("state", json!(self.state.code())),
            ("bandwidth", json!(self.bandwidth)),
            ("delay", json!(self.delay)),
            ("port", json!(self.port)),
            ("link_load", json!(self.link_load)),
        ]
    }
}
