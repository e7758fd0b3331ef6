//! Satellite tracking backend: typed record tables over PostgreSQL behind a role-gated REST API.

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use auth::TokenService;
pub use config::{Settings, TableRegistry};
pub use error::{AppError, ConfigError};
pub use migration::apply_migrations;
pub use response::{success_one, success_one_ok, success_page};
pub use routes::api_router;
pub use state::AppState;
pub use store::{connect_pool, ensure_database_exists};
