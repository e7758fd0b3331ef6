//! Control group: orbit and constellation plans, debris, instructions and audit logs.

use super::{body, insert_one, list_page, query, QueryParams};
use crate::auth::permission::{CONTROL_ONLY, CONTROL_OR_TRACE};
use crate::error::AppError;
use crate::extractors::{ClientIp, Session};
use crate::model::{
    AddConstellation, AddDebris, AddInstruction, AddOrbit, Constellation, Debris, ExecState, Instruction, LoginLog,
    NewOperationLog, OperationLog, Orbit,
};
use crate::response::success_one;
use crate::service::{ExecutionJob, RecordStore};
use crate::sql::Condition;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

pub async fn add_orbit(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<AddOrbit>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    session.require(CONTROL_ONLY)?;
    insert_one(&state, body(payload)?.validate()?).await
}

pub async fn list_orbits(
    State(state): State<AppState>,
    session: Session,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    session.require(CONTROL_ONLY)?;
    list_page::<Orbit>(&state, &query(params)?, &[]).await
}

pub async fn add_constellation(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<AddConstellation>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    session.require(CONTROL_ONLY)?;
    insert_one(&state, body(payload)?.validate()?).await
}

pub async fn list_constellations(
    State(state): State<AppState>,
    session: Session,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    session.require(CONTROL_ONLY)?;
    list_page::<Constellation>(&state, &query(params)?, &[]).await
}

pub async fn add_debris(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<AddDebris>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    session.require(CONTROL_ONLY)?;
    insert_one(&state, body(payload)?.validate()?).await
}

pub async fn list_debris(
    State(state): State<AppState>,
    session: Session,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    session.require(CONTROL_ONLY)?;
    list_page::<Debris>(&state, &query(params)?, &[]).await
}

/// Store the instruction and its operation log together, then hand it to the executor.
/// The response does not wait for execution.
pub async fn add_instruction(
    State(state): State<AppState>,
    session: Session,
    ClientIp(ip): ClientIp,
    payload: Result<Json<AddInstruction>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let claims = session.require(CONTROL_ONLY)?;
    let now = Utc::now();
    let new = body(payload)?.validate(&claims.name, now)?;

    let mut tx = state.pool.begin().await?;
    let instruction = RecordStore::insert(&mut *tx, &state.registry, &new).await?;
    RecordStore::insert(
        &mut *tx,
        &state.registry,
        &NewOperationLog {
            operator: claims.name.clone(),
            operator_ip: ip.clone(),
            operation_time: now,
            record: format!("edit instruction {}", instruction.instruction_id),
            satellite_id: instruction.satellite_id.clone(),
            satellite_name: instruction.satellite_name.clone(),
        },
    )
    .await?;
    tx.commit().await?;
    tracing::info!(instruction = %instruction.instruction_id, operator = %claims.name, "instruction accepted");

    state
        .executor
        .enqueue(ExecutionJob {
            instruction: instruction.clone(),
            operator: claims.name.clone(),
            operator_ip: ip,
        })
        .await?;
    Ok(success_one(instruction))
}

/// The issued (`not_executed`) row of every instruction. That row stays after the
/// instruction runs, so executed instructions are listed too.
pub async fn list_pending_instructions(
    State(state): State<AppState>,
    session: Session,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    session.require(CONTROL_ONLY)?;
    let pending = [Condition::eq("exec_state", ExecState::NotExecuted.code())];
    list_page::<Instruction>(&state, &query(params)?, &pending).await
}

pub async fn list_operations(
    State(state): State<AppState>,
    session: Session,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    session.require(CONTROL_ONLY)?;
    list_page::<OperationLog>(&state, &query(params)?, &[]).await
}

pub async fn list_login_logs(
    State(state): State<AppState>,
    session: Session,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    session.require(CONTROL_OR_TRACE)?;
    list_page::<LoginLog>(&state, &query(params)?, &[]).await
}
