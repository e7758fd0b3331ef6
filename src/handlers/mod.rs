//! HTTP handlers, one module per route group.

pub mod control;
pub mod exec;
pub mod monitor;
pub mod trace;
pub mod user;

use crate::error::AppError;
use crate::model::{NewRecord, Record};
use crate::response::{success_one, success_page};
use crate::service::{ListQuery, RecordStore};
use crate::sql::Condition;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::response::IntoResponse;
use axum::Json;
use std::collections::HashMap;

/// Request body, with JSON rejections reported in the error envelope.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    let Json(value) = payload?;
    Ok(value)
}

/// Raw list parameters. Rejections are kept so they can be answered with the envelope.
pub(crate) type QueryParams = Result<Query<HashMap<String, String>>, QueryRejection>;

pub(crate) fn query(params: QueryParams) -> Result<HashMap<String, String>, AppError> {
    let Query(map) = params?;
    Ok(map)
}

/// Insert one validated row and answer 201 with the stored record.
pub(crate) async fn insert_one<N: NewRecord>(state: &AppState, new: N) -> Result<impl IntoResponse, AppError> {
    let row = RecordStore::insert(&state.pool, &state.registry, &new).await?;
    tracing::debug!(table = <N::Record as Record>::TABLE, "record added");
    Ok(success_one(row))
}

/// Plain paged list over every row of `R`'s table.
pub(crate) async fn list_page<R: Record>(
    state: &AppState,
    params: &HashMap<String, String>,
    conditions: &[Condition],
) -> Result<impl IntoResponse, AppError> {
    let q = ListQuery::from_params(params)?;
    let page = state.queries().paged::<R>(&q, conditions).await?;
    Ok(success_page(page.items, page.total))
}

/// Newest row per business key, paged.
pub(crate) async fn list_latest<R: Record>(
    state: &AppState,
    params: &HashMap<String, String>,
) -> Result<impl IntoResponse, AppError> {
    let q = ListQuery::from_params(params)?;
    let page = state.queries().latest_per_key::<R>(&q, &[]).await?;
    Ok(success_page(page.items, page.total))
}
