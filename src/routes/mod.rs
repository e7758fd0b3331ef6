//! Route groups and the assembled application router.

pub mod common;
pub mod control;
pub mod exec;
pub mod monitor;
pub mod trace;
pub mod user;

pub use common::common_routes;
pub use control::control_routes;
pub use exec::exec_routes;
pub use monitor::monitor_routes;
pub use trace::trace_routes;
pub use user::{public_user_routes, user_routes};

use crate::auth::require_session;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

/// Common routes at the root and the API under `/api/v1`. Everything but register and
/// login passes the session middleware before reaching its handler. Bodies over
/// `max_body_bytes` fail in the JSON extractor and are answered with the envelope.
pub fn api_router(state: AppState, max_body_bytes: usize) -> Router {
    let protected = Router::new()
        .merge(user_routes())
        .merge(control_routes())
        .merge(exec_routes())
        .merge(trace_routes())
        .merge(monitor_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let api = Router::new().merge(public_user_routes()).merge(protected);

    Router::new()
        .merge(common_routes())
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenService;
    use crate::model::Role;
    use crate::service::{InstructionExecutor, SimulatedRunner};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::Utc;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const SECRET: &str = "router-test-secret-0123456789";

    /// Router over a pool that never connects. Only paths that fail before the store are exercised.
    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://localhost:1/unused")
            .unwrap();
        let registry = Arc::new(crate::model::registry("satellite"));
        let (executor, _worker) = InstructionExecutor::spawn(
            pool.clone(),
            registry.clone(),
            Arc::new(SimulatedRunner::new(Duration::ZERO)),
            4,
            1,
        );
        let state = AppState {
            pool,
            registry,
            tokens: Arc::new(TokenService::new(SECRET, Duration::from_secs(3600))),
            executor,
            started_at: Utc::now(),
        };
        api_router(state, 64 * 1024)
    }

    fn token(role: Role) -> String {
        TokenService::new(SECRET, Duration::from_secs(3600))
            .issue(7, "alice", role)
            .unwrap()
            .token
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(t) = token {
            req = req.header("token", t);
        }
        req.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn health_needs_no_session() {
        let (status, body) = send(app(), get("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn missing_token_is_unauthenticated() {
        let (status, body) = send(app(), get("/api/v1/control/orbits?page=1&pageSize=10", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 2001);
        assert_eq!(body["data"], Value::Null);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthenticated() {
        let (status, body) = send(app(), get("/api/v1/monitor/uptime", Some("not.a.token"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 2001);
    }

    #[tokio::test]
    async fn expired_token_is_unauthenticated() {
        let past = Utc::now().timestamp() - 7200;
        let expired = TokenService::new(SECRET, Duration::from_secs(60))
            .issue_at(7, "alice", Role::Control, past)
            .unwrap()
            .token;
        let (status, body) = send(app(), get("/api/v1/monitor/uptime", Some(&expired))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 2001);
    }

    #[tokio::test]
    async fn wrong_role_is_forbidden() {
        let t = token(Role::Exec);
        let (status, body) = send(app(), get("/api/v1/control/orbits?page=1&pageSize=10", Some(&t))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], 2003);

        let t = token(Role::Control);
        let (status, _) = send(app(), get("/api/v1/trace/orbits?page=1&pageSize=10", Some(&t))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn list_without_page_is_missing_parameter() {
        let t = token(Role::Control);
        let (status, body) = send(app(), get("/api/v1/control/orbits?pageSize=10", Some(&t))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1001);
    }

    #[tokio::test]
    async fn non_integer_page_is_invalid_format() {
        let t = token(Role::Trace);
        let (status, body) = send(app(), get("/api/v1/trace/debris?page=x&pageSize=10", Some(&t))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1002);
    }

    #[tokio::test]
    async fn zero_page_size_is_invalid_argument() {
        let t = token(Role::Exec);
        let (status, body) = send(app(), get("/api/v1/exec/faults?page=1&pageSize=0", Some(&t))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1004);
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_format() {
        let t = token(Role::Control);
        let (status, body) = send(app(), post_json("/api/v1/control/orbits", Some(&t), "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1002);
    }

    #[tokio::test]
    async fn missing_field_is_rejected_before_the_store() {
        let t = token(Role::Exec);
        let (status, body) = send(
            app(),
            post_json("/api/v1/exec/satellite-states", Some(&t), r#"{"satelliteName":"Sat one"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1001);
    }

    #[tokio::test]
    async fn unknown_enum_is_invalid_value() {
        let t = token(Role::Exec);
        let req = post_json(
            "/api/v1/exec/net-states",
            Some(&t),
            r#"{"satelliteId":"S1","satelliteName":"Sat","orbitId":"O1","segment":"ka","state":"sleepy","bandwidth":"10G"}"#,
        );
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1003);
    }

    #[tokio::test]
    async fn register_validates_without_a_session() {
        let req = post_json(
            "/api/v1/user/register",
            None,
            r#"{"userName":"alice","password":"pw","phone":"12","nickName":"Al","email":"a@b.io","role":"CONTROL"}"#,
        );
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1002);
    }

    #[tokio::test]
    async fn login_requires_user_name() {
        let (status, body) = send(app(), post_json("/api/v1/user/login", None, r#"{"password":"pw"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1001);
    }

    #[tokio::test]
    async fn history_rejects_malformed_instruction_id() {
        let t = token(Role::Trace);
        let (status, body) = send(app(), get("/api/v1/exec/instructions/%20bad%20id/history", Some(&t))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1002);
    }

    #[tokio::test]
    async fn uptime_is_open_to_every_role() {
        for role in [Role::Control, Role::Exec, Role::Trace] {
            let (status, body) = send(app(), get("/api/v1/monitor/uptime", Some(&token(role)))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["code"], 0);
            assert!(body["data"]["uptimeSeconds"].as_i64().unwrap() >= 0);
        }
    }

    #[tokio::test]
    async fn oversized_body_is_invalid_format() {
        let t = token(Role::Control);
        let big = format!(r#"{{"orbitId":"{}"}}"#, "x".repeat(128 * 1024));
        let mut req = post_json("/api/v1/control/orbits", Some(&t), &big);
        req.headers_mut().insert(header::CONTENT_LENGTH, big.len().into());
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1002);
        assert_eq!(body["data"], Value::Null);
    }

    #[tokio::test]
    async fn non_utf8_path_is_invalid_format() {
        let t = token(Role::Exec);
        let (status, body) = send(app(), get("/api/v1/exec/instructions/%FF%FE/history", Some(&t))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1002);
    }
}
