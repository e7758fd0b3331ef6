//! Avoidance instructions. Every lifecycle transition appends a row.

use super::{ExecState, InstructionType, NewRecord, Record, RecordMeta, ThreatDegree};
use crate::config::{ColumnDef, SqlType, TableDef};
use crate::error::AppError;
use crate::service::RequestValidator as V;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub instruction_id: String,
    pub kind: InstructionType,
    pub content: String,
    pub source: String,
    pub debris_id: String,
    pub debris_name: String,
    pub satellite_id: String,
    pub satellite_name: String,
    pub threat: ThreatDegree,
    pub exec_state: ExecState,
    pub generated_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl Record for Instruction {
    const TABLE: &'static str = "instruction";
    const SEARCH_COLUMNS: &'static [&'static str] = &["instruction_id"];

    fn table_def() -> TableDef {
        TableDef::new(
            Self::TABLE,
            vec![
                ColumnDef::new("instruction_id", SqlType::Text),
                ColumnDef::new("kind", SqlType::SmallInt),
                ColumnDef::new("content", SqlType::Text),
                ColumnDef::new("source", SqlType::Text),
                ColumnDef::new("debris_id", SqlType::Text),
                ColumnDef::new("debris_name", SqlType::Text),
                ColumnDef::new("satellite_id", SqlType::Text),
                ColumnDef::new("satellite_name", SqlType::Text),
                ColumnDef::new("threat", SqlType::SmallInt),
                ColumnDef::new("exec_state", SqlType::SmallInt),
                ColumnDef::new("generated_at", SqlType::Timestamptz),
                ColumnDef::nullable("executed_at", SqlType::Timestamptz),
            ],
        )
        .group_key("instruction_id")
    }
}

impl Instruction {
    /// The row recording this instruction's move to `state`.
    pub fn transition(&self, state: ExecState, executed_at: Option<DateTime<Utc>>) -> NewInstruction {
        NewInstruction {
            instruction_id: self.instruction_id.clone(),
            kind: self.kind,
            content: self.content.clone(),
            source: self.source.clone(),
            debris_id: self.debris_id.clone(),
            debris_name: self.debris_name.clone(),
            satellite_id: self.satellite_id.clone(),
            satellite_name: self.satellite_name.clone(),
            threat: self.threat,
            exec_state: state,
            generated_at: self.generated_at,
            executed_at: executed_at.or(self.executed_at),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddInstruction {
    pub instruction_id: Option<String>,
    /// Defaults to `operated_avoidance`.
    pub kind: Option<String>,
    pub content: Option<String>,
    pub debris_id: Option<String>,
    pub debris_name: Option<String>,
    pub satellite_id: Option<String>,
    pub satellite_name: Option<String>,
    /// Defaults to `none`.
    pub threat: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewInstruction {
    pub instruction_id: String,
    pub kind: InstructionType,
    pub content: String,
    pub source: String,
    pub debris_id: String,
    pub debris_name: String,
    pub satellite_id: String,
    pub satellite_name: String,
    pub threat: ThreatDegree,
    pub exec_state: ExecState,
    pub generated_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl AddInstruction {
    /// A not-yet-executed instruction issued by `source`.
    pub fn validate(self, source: &str, now: DateTime<Utc>) -> Result<NewInstruction, AppError> {
        let instruction_id = V::business_key(self.instruction_id, "instructionId")?;
        let content = V::required_text(self.content, "content")?;
        let debris_id = V::required_text(self.debris_id, "debrisId")?;
        let debris_name = V::required_text(self.debris_name, "debrisName")?;
        let satellite_id = V::business_key(self.satellite_id, "satelliteId")?;
        let satellite_name = V::required_text(self.satellite_name, "satelliteName")?;
        let kind = match V::optional_text(self.kind) {
            Some(k) => V::enumerated(Some(k), "kind")?,
            None => InstructionType::OperatedAvoidance,
        };
        let threat = match V::optional_text(self.threat) {
            Some(t) => V::enumerated(Some(t), "threat")?,
            None => ThreatDegree::None,
        };
        Ok(NewInstruction {
            instruction_id,
            kind,
            content,
            source: source.to_string(),
            debris_id,
            debris_name,
            satellite_id,
            satellite_name,
            threat,
            exec_state: ExecState::NotExecuted,
            generated_at: now,
            executed_at: None,
        })
    }
}

impl NewRecord for NewInstruction {
    type Record = Instruction;

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("instruction_id", json!(self.instruction_id)),
            ("kind", json!(self.kind.code())),
            ("content", json!(self.content)),
            ("source", json!(self.source)),
            ("debris_id", json!(self.debris_id)),
            ("debris_name", json!(self.debris_name)),
            ("satellite_id", json!(self.satellite_id)),
            ("satellite_name", json!(self.satellite_name)),
            ("threat", json!(self.threat.code())),
            ("exec_state", json!(self.exec_state.code())),
            ("generated_at", json!(self.generated_at.to_rfc3339())),
            ("executed_at", json!(self.executed_at.map(|t| t.to_rfc3339()))),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AddInstruction {
        AddInstruction {
            instruction_id: Some("I-1".into()),
            kind: None,
            content: Some("raise orbit 2km".into()),
            debris_id: Some("D-104".into()),
            debris_name: Some("rocket body".into()),
            satellite_id: Some("S1".into()),
            satellite_name: Some("Sat one".into()),
            threat: Some("low".into()),
        }
    }

    #[test]
    fn new_instruction_is_not_executed() {
        let now = Utc::now();
        let new = request().validate("alice", now).unwrap();
        assert_eq!(new.exec_state, ExecState::NotExecuted);
        assert_eq!(new.kind, InstructionType::OperatedAvoidance);
        assert_eq!(new.source, "alice");
        assert_eq!(new.generated_at, now);
        assert!(new.executed_at.is_none());
        let values = new.values();
        assert_eq!(values.last(), Some(&("executed_at", Value::Null)));
    }

    #[test]
    fn missing_debris_name() {
        let mut req = request();
        req.debris_name = Some(" ".into());
        let err = req.validate("alice", Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::MissingParameter(ref f) if f == "debrisName"));
    }

    #[test]
    fn transition_keeps_identity_and_execution_time() {
        let generated = Utc::now();
        let row = Instruction {
            meta: RecordMeta {
                id: 1,
                created_at: generated,
                updated_at: generated,
            },
            instruction_id: "I-1".into(),
            kind: InstructionType::OperatedAvoidance,
            content: "raise".into(),
            source: "alice".into(),
            debris_id: "D-1".into(),
            debris_name: "rb".into(),
            satellite_id: "S1".into(),
            satellite_name: "Sat".into(),
            threat: ThreatDegree::High,
            exec_state: ExecState::NotExecuted,
            generated_at: generated,
            executed_at: None,
        };
        let started = generated + chrono::Duration::seconds(1);
        let executing = row.transition(ExecState::Executing, Some(started));
        assert_eq!(executing.exec_state, ExecState::Executing);
        assert_eq!(executing.executed_at, Some(started));
        assert_eq!(executing.generated_at, generated);

        let mut executing_row = row.clone();
        executing_row.exec_state = ExecState::Executing;
        executing_row.executed_at = Some(started);
        let done = executing_row.transition(ExecState::Succeeded, None);
        assert_eq!(done.executed_at, Some(started));
        assert_eq!(done.instruction_id, "I-1");
    }
}
