use crate::handlers::trace::latest;
use crate::model::{
    CommState, Constellation, Debris, Fault, Instruction, NetState, OperationLog, Orbit, SatelliteControl,
    SatelliteState,
};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn trace_routes() -> Router<AppState> {
    Router::new()
        .route("/trace/satellite-states", get(latest::<SatelliteState>))
        .route("/trace/orbits", get(latest::<Orbit>))
        .route("/trace/constellations", get(latest::<Constellation>))
        .route("/trace/controls", get(latest::<SatelliteControl>))
        .route("/trace/faults", get(latest::<Fault>))
        .route("/trace/net-states", get(latest::<NetState>))
        .route("/trace/comm-states", get(latest::<CommState>))
        .route("/trace/debris", get(latest::<Debris>))
        .route("/trace/instructions", get(latest::<Instruction>))
        .route("/trace/operations", get(latest::<OperationLog>))
}
