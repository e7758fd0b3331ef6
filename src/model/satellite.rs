//! Satellite states, orbits, constellations and attitude/power controls.

use super::{NewRecord, Record, RecordMeta, State};
use crate::config::{ColumnDef, SqlType, TableDef};
use crate::error::AppError;
use crate::service::RequestValidator as V;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SatelliteState {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub satellite_id: String,
    pub satellite_name: String,
    pub orbit_id: String,
    pub run_state: State,
    pub mean_anomaly: f64,
    pub speed: f64,
}

impl Record for SatelliteState {
    const TABLE: &'static str = "satellite_state";
    const SEARCH_COLUMNS: &'static [&'static str] = &["satellite_id", "satellite_name", "orbit_id"];

    fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::new("satellite_id", SqlType::Text),
                ColumnDef::new("satellite_name", SqlType::Text),
                ColumnDef::new("orbit_id", SqlType::Text),
                ColumnDef::new("run_state", SqlType::SmallInt),
                ColumnDef::new("mean_anomaly", SqlType::Double),
                ColumnDef::new("speed", SqlType::Double),
            ],
        )
        .group_key("satellite_id")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddSatelliteState {
    pub satellite_id: Option<String>,
    pub satellite_name: Option<String>,
    pub orbit_id: Option<String>,
    pub run_state: Option<String>,
    pub mean_anomaly: f64,
    pub speed: f64,
}

#[derive(Debug)]
pub struct NewSatelliteState {
    pub satellite_id: String,
    pub satellite_name: String,
    pub orbit_id: String,
    pub run_state: State,
    pub mean_anomaly: f64,
    pub speed: f64,
}

impl AddSatelliteState {
    pub fn validate(self) -> Result<NewSatelliteState, AppError> {
        Ok(NewSatelliteState {
            satellite_id: V::business_key(self.satellite_id, "satelliteId")?,
            satellite_name: V::required_text(self.satellite_name, "satelliteName")?,
            orbit_id: V::required_text(self.orbit_id, "orbitId")?,
            run_state: V::enumerated(self.run_state, "runState")?,
            mean_anomaly: self.mean_anomaly,
            speed: self.speed,
        })
    }
}

impl NewRecord for NewSatelliteState {
    type Record = SatelliteState;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("satellite_id", json!(self.satellite_id)),
            ("satellite_name", json!(self.satellite_name)),
            ("orbit_id", json!(self.orbit_id)),
            ("run_state", json!(self.run_state.code())),
            ("mean_anomaly", json!(self.mean_anomaly)),
            ("speed", json!(self.speed)),
        ]
    }
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Orbit {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub orbit_id: String,
    pub orbit_type: String,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub ascending_node_longitude: f64,
    pub perigee: f64,
}

impl Record for Orbit {
    const TABLE: &'static str = "orbit";
    const SEARCH_COLUMNS: &'static [&'static str] = &["orbit_id"];

    fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::new("orbit_id", SqlType::Text),
                ColumnDef::new("orbit_type", SqlType::Text),
                ColumnDef::new("semi_major_axis", SqlType::Double),
                ColumnDef::new("eccentricity", SqlType::Double),
                ColumnDef::new("inclination", SqlType::Double),
                ColumnDef::new("ascending_node_longitude", SqlType::Double),
                ColumnDef::new("perigee", SqlType::Double),
            ],
        )
        .group_key("orbit_id")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddOrbit {
    pub orbit_id: Option<String>,
    pub orbit_type: Option<String>,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub ascending_node_longitude: f64,
    pub perigee: f64,
}

#[derive(Debug)]
pub struct NewOrbit {
    pub orbit_id: String,
    pub orbit_type: String,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub ascending_node_longitude: f64,
    pub perigee: f64,
}

impl AddOrbit {
    pub fn validate(self) -> Result<NewOrbit, AppError> {
        Ok(NewOrbit {
            orbit_id: V::business_key(self.orbit_id, "orbitId")?,
            orbit_type: V::required_text(self.orbit_type, "orbitType")?,
            semi_major_axis: self.semi_major_axis,
            eccentricity: self.eccentricity,
            inclination: self.inclination,
            ascending_node_longitude: self.ascending_node_longitude,
            perigee: self.perigee,
        })
    }
}

impl NewRecord for NewOrbit {
    type Record = Orbit;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("orbit_id", json!(self.orbit_id)),
            ("orbit_type", json!(self.orbit_type)),
            ("semi_major_axis", json!(self.semi_major_axis)),
            ("eccentricity", json!(self.eccentricity)),
            ("inclination", json!(self.inclination)),
            ("ascending_node_longitude", json!(self.ascending_node_longitude)),
            ("perigee", json!(self.perigee)),
        ]
    }
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Constellation {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub constellation_id: String,
    pub constellation_name: String,
    pub satellite_total: i32,
    pub satellite_up: i32,
    pub satellite_down: i32,
    pub link_state: State,
}

impl Record for Constellation {
    const TABLE: &'static str = "constellation";
    const SEARCH_COLUMNS: &'static [&'static str] = &["constellation_id", "constellation_name"];

    fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::new("constellation_id", SqlType::Text),
                ColumnDef::new("constellation_name", SqlType::Text),
                ColumnDef::new("satellite_total", SqlType::Integer),
                ColumnDef::new("satellite_up", SqlType::Integer),
                ColumnDef::new("satellite_down", SqlType::Integer),
                ColumnDef::new("link_state", SqlType::SmallInt),
            ],
        )
        .group_key("constellation_id")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddConstellation {
    pub constellation_id: Option<String>,
    pub constellation_name: Option<String>,
    pub satellite_total: i32,
    pub satellite_up: i32,
    pub satellite_down: i32,
    pub link_state: Option<String>,
}

#[derive(Debug)]
pub struct NewConstellation {
    pub constellation_id: String,
    pub constellation_name: String,
    pub satellite_total: i32,
    pub satellite_up: i32,
    pub satellite_down: i32,
    pub link_state: State,
}

impl AddConstellation {
    pub fn validate(self) -> Result<NewConstellation, AppError> {
        Ok(NewConstellation {
            constellation_id: V::business_key(self.constellation_id, "constellationId")?,
            constellation_name: V::required_text(self.constellation_name, "constellationName")?,
            satellite_total: V::non_negative(self.satellite_total, "satelliteTotal")?,
            satellite_up: V::non_negative(self.satellite_up, "satelliteUp")?,
            satellite_down: V::non_negative(self.satellite_down, "satelliteDown")?,
            link_state: V::enumerated(self.link_state, "linkState")?,
        })
    }
}

impl NewRecord for NewConstellation {
    type Record = Constellation;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("constellation_id", json!(self.constellation_id)),
            ("constellation_name", json!(self.constellation_name)),
            ("satellite_total", json!(self.satellite_total)),
            ("satellite_up", json!(self.satellite_up)),
            ("satellite_down", json!(self.satellite_down)),
            ("link_state", json!(self.link_state.code())),
        ]
    }
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SatelliteControl {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub satellite_id: String,
    pub satellite_name: String,
    pub attitude: String,
    pub power: String,
    pub temperature: String,
}

impl Record for SatelliteControl {
    const TABLE: &'static str = "satellite_control";
    const SEARCH_COLUMNS: &'static [&'static str] = &["satellite_id", "satellite_name"];

    fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::new("satellite_id", SqlType::Text),
                ColumnDef::new("satellite_name", SqlType::Text),
                ColumnDef::new("attitude", SqlType::Text),
                ColumnDef::new("power", SqlType::Text),
                ColumnDef::new("temperature", SqlType::Text),
            ],
        )
        .group_key("satellite_id")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddSatelliteControl {
    pub satellite_id: Option<String>,
    pub satellite_name: Option<String>,
    pub attitude: Option<String>,
    pub power: Option<String>,
    pub temperature: Option<String>,
}

#[derive(Debug)]
pub struct NewSatelliteControl {
    pub satellite_id: String,
    pub satellite_name: String,
    pub attitude: String,
    pub power: String,
    pub temperature: String,
}

impl AddSatelliteControl {
    pub fn validate(self) -> Result<NewSatelliteControl, AppError> {
        Ok(NewSatelliteControl {
            satellite_id: V::business_key(self.satellite_id, "satelliteId")?,
            satellite_name: V::required_text(self.satellite_name, "satelliteName")?,
            attitude: V::required_text(self.attitude, "attitude")?,
            power: V::required_text(self.power, "power")?,
            temperature: V::required_text(self.temperature, "temperature")?,
        })
    }
}

impl NewRecord for NewSatelliteControl {
    type Record = SatelliteControl;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("satellite_id", json!(self.satellite_id)),
            ("satellite_name", json!(self.satellite_name)),
            ("attitude", json!(self.attitude)),
            ("power", json!(self.power)),
            ("temperature", json!(self.temperature)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satellite_state_request_is_validated_in_order() {
        let req: AddSatelliteState = serde_json::from_value(json!({
            "satelliteId": "S1",
            "satelliteName": "Sat one",
            "orbitId": "O1",
            "runState": "normal",
            "speed": 7.6
        }))
        .unwrap();
        let new = req.validate().unwrap();
        assert_eq!(new.run_state, State::Normal);
        assert_eq!(new.mean_anomaly, 0.0);
        let values = new.values();
        assert_eq!(values[3], ("run_state", json!(1)));
        assert_eq!(values[5], ("speed", json!(7.6)));
    }

    #[test]
    fn satellite_state_missing_name() {
        let req: AddSatelliteState = serde_json::from_value(json!({
            "satelliteId": "S1",
            "orbitId": "O1",
            "runState": "normal"
        }))
        .unwrap();
        let err = req.validate().unwrap_err();
        assert!(matches!(err, AppError::MissingParameter(ref f) if f == "satelliteName"));
    }

    #[test]
    fn constellation_rejects_unknown_link_state() {
        let req = AddConstellation {
            constellation_id: Some("C1".into()),
            constellation_name: Some("Ring".into()),
            satellite_total: 3,
            satellite_up: 2,
            satellite_down: 1,
            link_state: Some("lost".into()),
        };
        assert!(matches!(req.validate(), Err(AppError::InvalidValue(_))));
    }

    #[test]
    fn row_serializes_flat_camel_case() {
        let now = chrono::Utc::now();
        let row = Orbit {
            meta: RecordMeta {
                id: 7,
                created_at: now,
                updated_at: now,
            },
            orbit_id: "O1".into(),
            orbit_type: "LEO".into(),
            semi_major_axis: 6_900.0,
            eccentricity: 0.001,
            inclination: 53.0,
            ascending_node_longitude: 10.0,
            perigee: 500.0,
        };
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["id"], json!(7));
        assert_eq!(v["orbitId"], json!("O1"));
        assert!(v.get("createdAt").is_some());
        assert!(v.get("meta").is_none());
    }
}
