use super::{NewRecord, Record, RecordMeta, ThreatDegree};
use crate::config::{ColumnDef, SqlType, TableDef};
use crate::error::AppError;
use crate::service::RequestValidator as V;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;

/// A tracked debris object and its threat to one satellite.
#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Debris {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub debris_id: String,
    pub debris_name: String,
    pub satellite_id: String,
    pub satellite_name: String,
    pub distance_km: f64,
    pub relative_speed: f64,
    pub threat: ThreatDegree,
}

impl Record for Debris {
    const TABLE: &'static str = "debris";
    const SEARCH_COLUMNS: &'static [&'static str] = &["debris_id", "debris_name", "satellite_id"];

    fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::new("debris_id", SqlType::Text),
                ColumnDef::new("debris_name", SqlType::Text),
                ColumnDef::new("satellite_id", SqlType::Text),
                ColumnDef::new("satellite_name", SqlType::Text),
                ColumnDef::new("distance_km", SqlType::Double),
                ColumnDef::new("relative_speed", SqlType::Double),
                ColumnDef::new("threat", SqlType::SmallInt),
            ],
        )
        .group_key("debris_id")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddDebris {
    pub debris_id: Option<String>,
    pub debris_name: Option<String>,
    pub satellite_id: Option<String>,
    pub satellite_name: Option<String>,
    pub distance_km: f64,
    pub relative_speed: f64,
    pub threat: Option<String>,
}

#[derive(Debug)]
pub struct NewDebris {
    pub debris_id: String,
    pub debris_name: String,
    pub satellite_id: String,
    pub satellite_name: String,
    pub distance_km: f64,
    pub relative_speed: f64,
    pub threat: ThreatDegree,
}

impl AddDebris {
    pub fn validate(self) -> Result<NewDebris, AppError> {
        let debris_id = V::business_key(self.debris_id, "debrisId")?;
        let debris_name = V::required_text(self.debris_name, "debrisName")?;
        let satellite_id = V::business_key(self.satellite_id, "satelliteId")?;
        let satellite_name = V::required_text(self.satellite_name, "satelliteName")?;
        let threat = V::enumerated(self.threat, "threat")?;
        if self.distance_km < 0.0 {
            return Err(AppError::InvalidValue("distanceKm must not be negative".into()));
        }
        Ok(NewDebris {
            debris_id,
            debris_name,
            satellite_id,
            satellite_name,
            distance_km: self.distance_km,
            relative_speed: self.relative_speed,
            threat,
        })
    }
}

impl NewRecord for NewDebris {
    type Record = Debris;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("debris_id", json!(self.debris_id)),
            ("debris_name", json!(self.debris_name)),
            ("satellite_id", json!(self.satellite_id)),
            ("satellite_name", json!(self.satellite_name)),
            ("distance_km", json!(self.distance_km)),
            ("relative_speed", json!(self.relative_speed)),
            ("threat", json!(self.threat.code())),
        ]
    }
}
