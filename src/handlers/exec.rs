//! Exec group: telemetry reported by the execution side and instruction results.

use super::{body, insert_one, list_page, query, QueryParams};
use crate::auth::permission::{ANY_ROLE, EXEC_ONLY, EXEC_OR_TRACE};
use crate::error::AppError;
use crate::extractors::Session;
use crate::model::{
    AddCommState, AddFault, AddNetState, AddSatelliteControl, AddSatelliteState, CommState, Fault, Instruction,
    NetState, SatelliteControl, SatelliteState,
};
use crate::response::success_one_ok;
use crate::service::is_business_key;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

pub async fn add_satellite_state(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<AddSatelliteState>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    session.require(EXEC_ONLY)?;
    insert_one(&state, body(payload)?.validate()?).await
}

pub async fn list_satellite_states(
    State(state): State<AppState>,
    session: Session,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    session.require(EXEC_ONLY)?;
    list_page::<SatelliteState>(&state, &query(params)?, &[]).await
}

pub async fn add_control(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<AddSatelliteControl>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    session.require(EXEC_ONLY)?;
    insert_one(&state, body(payload)?.validate()?).await
}

pub async fn list_controls(
    State(state): State<AppState>,
    session: Session,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    session.require(EXEC_ONLY)?;
    list_page::<SatelliteControl>(&state, &query(params)?, &[]).await
}

pub async fn add_fault(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<AddFault>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    session.require(EXEC_ONLY)?;
    insert_one(&state, body(payload)?.validate(Utc::now())?).await
}

/// Also open to TRACE, which follows repairs.
pub async fn list_faults(
    State(state): State<AppState>,
    session: Session,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    session.require(EXEC_OR_TRACE)?;
    list_page::<Fault>(&state, &query(params)?, &[]).await
}

pub async fn add_net_state(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<AddNetState>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    session.require(EXEC_ONLY)?;
    insert_one(&state, body(payload)?.validate()?).await
}

pub async fn list_net_states(
    State(state): State<AppState>,
    session: Session,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    session.require(EXEC_ONLY)?;
    list_page::<NetState>(&state, &query(params)?, &[]).await
}

pub async fn add_comm_state(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<AddCommState>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    session.require(EXEC_ONLY)?;
    insert_one(&state, body(payload)?.validate()?).await
}

pub async fn list_comm_states(
    State(state): State<AppState>,
    session: Session,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    session.require(EXEC_ONLY)?;
    list_page::<CommState>(&state, &query(params)?, &[]).await
}

/// Every instruction row, each lifecycle transition included.
pub async fn list_results(
    State(state): State<AppState>,
    session: Session,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    session.require(EXEC_ONLY)?;
    list_page::<Instruction>(&state, &query(params)?, &[]).await
}

/// All rows of one instruction, oldest first. NotFound when the id was never issued.
pub async fn instruction_history(
    State(state): State<AppState>,
    session: Session,
    path: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    session.require(ANY_ROLE)?;
    let Path(instruction_id) = path?;
    if !is_business_key(&instruction_id)? {
        return Err(AppError::InvalidFormat(format!("instructionId '{}'", instruction_id)));
    }
    let rows = state
        .queries()
        .history::<Instruction>("instruction_id", json!(instruction_id))
        .await?;
    if rows.is_empty() {
        return Err(AppError::NotFound(format!("instruction '{}'", instruction_id)));
    }
    Ok(success_one_ok(rows))
}
