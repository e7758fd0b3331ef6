use super::token::token_from_headers;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Reject requests without a valid token; otherwise make the claims available to handlers.
pub async fn require_session(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, AppError> {
    let token = token_from_headers(req.headers()).ok_or_else(|| AppError::Unauthenticated("missing token".into()))?;
    let claims = state.tokens.verify(token)?;
    tracing::debug!(user = %claims.name, role = %claims.role, "session");
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
