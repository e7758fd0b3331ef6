//! Shared application state for all routes. Everything here is read-only after startup.

use crate::auth::TokenService;
use crate::config::TableRegistry;
use crate::service::{InstructionExecutor, QueryEngine};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub registry: Arc<TableRegistry>,
    pub tokens: Arc<TokenService>,
    pub executor: InstructionExecutor,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn queries(&self) -> QueryEngine<'_> {
        QueryEngine::new(&self.pool, &self.registry)
    }
}
