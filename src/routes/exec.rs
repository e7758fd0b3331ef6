use crate::handlers::exec::{
    add_comm_state, add_control, add_fault, add_net_state, add_satellite_state, instruction_history, list_comm_states,
    list_controls, list_faults, list_net_states, list_results, list_satellite_states,
};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn exec_routes() -> Router<AppState> {
    Router::new()
        .route("/exec/satellite-states", post(add_satellite_state).get(list_satellite_states))
        .route("/exec/controls", post(add_control).get(list_controls))
        .route("/exec/faults", post(add_fault).get(list_faults))
        .route("/exec/net-states", post(add_net_state).get(list_net_states))
        .route("/exec/comm-states", post(add_comm_state).get(list_comm_states))
        .route("/exec/results", get(list_results))
        .route("/exec/instructions/:instruction_id/history", get(instruction_history))
}
