use crate::handlers::control::{
    add_constellation, add_debris, add_instruction, add_orbit, list_constellations, list_debris, list_login_logs,
    list_operations, list_orbits, list_pending_instructions,
};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn control_routes() -> Router<AppState> {
    Router::new()
        .route("/control/orbits", post(add_orbit).get(list_orbits))
        .route("/control/constellations", post(add_constellation).get(list_constellations))
        .route("/control/debris", post(add_debris).get(list_debris))
        .route("/control/instructions", post(add_instruction).get(list_pending_instructions))
        .route("/control/operations", get(list_operations))
        .route("/control/login-logs", get(list_login_logs))
}
