//! Trace group: the latest known row per business key for every tracked resource.

use super::{list_latest, query, QueryParams};
use crate::auth::permission::TRACE_ONLY;
use crate::error::AppError;
use crate::extractors::Session;
use crate::model::Record;
use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;

/// One handler per resource, instantiated at routing time: `get(latest::<Orbit>)`.
pub async fn latest<R: Record>(
    State(state): State<AppState>,
    session: Session,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    session.require(TRACE_ONLY)?;
    list_latest::<R>(&state, &query(params)?).await
}
