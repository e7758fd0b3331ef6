//! Monitor group: dashboard summaries open to every signed-in role.

use super::{list_page, query, QueryParams};
use crate::auth::permission::ANY_ROLE;
use crate::error::AppError;
use crate::extractors::Session;
use crate::model::{
    CommState, Debris, Fault, FaultType, Instruction, NetState, Record, SatelliteState, State as LinkState,
    ThreatDegree,
};
use crate::response::success_one_ok;
use crate::service::QueryEngine;
use crate::sql::Condition;
use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Number of keys whose newest row carries `value`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Tally {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    pub run_state: Vec<Tally>,
    pub net_state: Vec<Tally>,
    pub comm_state: Vec<Tally>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultSummary {
    pub by_type: Vec<Tally>,
    pub by_repair_state: Vec<Tally>,
}

#[derive(Debug, Serialize)]
pub struct TableCount {
    pub table: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Uptime {
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: i64,
}

/// Code histogram to labelled tallies. Codes without a label are kept as their number.
pub fn label_counts(counts: Vec<(i16, u64)>, label: impl Fn(i16) -> Option<&'static str>) -> Vec<Tally> {
    counts
        .into_iter()
        .map(|(code, count)| Tally {
            value: label(code).map(str::to_string).unwrap_or_else(|| code.to_string()),
            count,
        })
        .collect()
}

async fn state_tally<R: Record>(queries: &QueryEngine<'_>, column: &str) -> Result<Vec<Tally>, AppError> {
    let counts = queries.latest_counts_by::<R>(column).await?;
    Ok(label_counts(counts, |c| LinkState::from_code(c).map(LinkState::as_str)))
}

/// Satellites by their latest run, network and comm state.
pub async fn state_overview(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse, AppError> {
    session.require(ANY_ROLE)?;
    let queries = state.queries();
    let (run_state, net_state, comm_state) = tokio::try_join!(
        state_tally::<SatelliteState>(&queries, "run_state"),
        state_tally::<NetState>(&queries, "state"),
        state_tally::<CommState>(&queries, "state"),
    )?;
    Ok(success_one_ok(StateSummary {
        run_state,
        net_state,
        comm_state,
    }))
}

pub async fn table_counts(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse, AppError> {
    session.require(ANY_ROLE)?;
    let counts = state
        .queries()
        .table_counts()
        .await?
        .into_iter()
        .map(|(table, count)| TableCount {
            table: table.to_string(),
            count,
        })
        .collect::<Vec<_>>();
    Ok(success_one_ok(counts))
}

/// Latest fault per satellite, tallied by fault type and by repair state.
pub async fn fault_overview(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse, AppError> {
    session.require(ANY_ROLE)?;
    let queries = state.queries();
    let (types, repairs) = tokio::try_join!(
        queries.latest_counts_by::<Fault>("fault_type"),
        queries.latest_counts_by::<Fault>("repair_state"),
    )?;
    Ok(success_one_ok(FaultSummary {
        by_type: label_counts(types, |c| FaultType::from_code(c).map(FaultType::as_str)),
        by_repair_state: label_counts(repairs, |c| LinkState::from_code(c).map(LinkState::as_str)),
    }))
}

/// Debris sightings that threaten a satellite, newest first.
pub async fn early_warnings(
    State(state): State<AppState>,
    session: Session,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    session.require(ANY_ROLE)?;
    let threatening = [Condition::ne("threat", ThreatDegree::None.code())];
    list_page::<Debris>(&state, &query(params)?, &threatening).await
}

/// Most recent high-threat debris, else the most recent low-threat one. `data` is null if neither exists.
pub async fn latest_threat(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse, AppError> {
    session.require(ANY_ROLE)?;
    let queries = state.queries();
    let mut found = None;
    for degree in [ThreatDegree::High, ThreatDegree::Low] {
        found = queries
            .latest_one::<Debris>(&[Condition::eq("threat", degree.code())])
            .await?;
        if found.is_some() {
            break;
        }
    }
    Ok(success_one_ok(found))
}

pub async fn latest_instruction(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    session.require(ANY_ROLE)?;
    let latest = state.queries().latest_one::<Instruction>(&[]).await?;
    Ok(success_one_ok(latest))
}

pub async fn uptime(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse, AppError> {
    session.require(ANY_ROLE)?;
    let now = Utc::now();
    Ok(success_one_ok(Uptime {
        started_at: state.started_at,
        uptime_seconds: (now - state.started_at).num_seconds().max(0),
    }))
}
