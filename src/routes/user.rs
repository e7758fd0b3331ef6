use crate::handlers::user::{info, login, register};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

/// Reachable without a token.
pub fn public_user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user/info", get(info))
}
