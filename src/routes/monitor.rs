use crate::handlers::monitor::{
    early_warnings, fault_overview, latest_instruction, latest_threat, state_overview, table_counts, uptime,
};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn monitor_routes() -> Router<AppState> {
    Router::new()
        .route("/monitor/state", get(state_overview))
        .route("/monitor/table-counts", get(table_counts))
        .route("/monitor/faults", get(fault_overview))
        .route("/monitor/early-warnings", get(early_warnings))
        .route("/monitor/latest-threat", get(latest_threat))
        .route("/monitor/latest-instruction", get(latest_instruction))
        .route("/monitor/uptime", get(uptime))
}
