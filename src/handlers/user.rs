//! Account endpoints: register and login are public, info needs a session.

use super::body;
use crate::auth::SessionService;
use crate::error::AppError;
use crate::extractors::{ClientIp, Session};
use crate::model::{LoginRequest, RegisterRequest};
use crate::response::{success_one, success_one_ok};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

fn sessions(state: &AppState) -> SessionService<'_> {
    SessionService::new(&state.pool, &state.registry, &state.tokens)
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let user = sessions(&state).register(body(payload)?).await?;
    Ok(success_one(user))
}

pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let login = sessions(&state).authenticate(body(payload)?, &ip).await?;
    Ok(success_one_ok(login))
}

pub async fn info(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse, AppError> {
    let info = sessions(&state).user_info(session.claims()).await?;
    Ok(success_one_ok(info))
}
