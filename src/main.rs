//! Server: reads settings from the environment (and `.env`), creates the database and
//! tables if needed, starts the instruction executor and serves the API until Ctrl+C or
//! SIGTERM.

use satellite_track::service::{InstructionExecutor, SimulatedRunner};
use satellite_track::{
    api_router, apply_migrations, connect_pool, ensure_database_exists, model, AppState, Settings, TokenService,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("satellite_track=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    ensure_database_exists(&settings.database_url).await?;
    let pool = connect_pool(&settings).await?;

    let registry = Arc::new(model::registry(&settings.schema));
    apply_migrations(&pool, &registry).await?;

    let (executor, worker) = InstructionExecutor::spawn(
        pool.clone(),
        registry.clone(),
        Arc::new(SimulatedRunner::new(settings.exec_delay)),
        settings.exec_queue_capacity,
        settings.exec_concurrency,
    );

    let state = AppState {
        pool,
        registry,
        tokens: Arc::new(TokenService::new(&settings.jwt_secret, settings.token_ttl)),
        executor,
        started_at: chrono::Utc::now(),
    };
    let app = api_router(state, settings.max_body_bytes);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, schema = %settings.schema, "listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last executor handles; the worker now finishes started jobs.
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "instruction executor panicked");
    }
    tracing::info!("server stopped");
    Ok(())
}

/// Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received, draining");
}
