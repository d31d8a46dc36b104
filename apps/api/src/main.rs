mod archive;
mod config;
mod db;
mod errors;
mod intake;
mod jobs;
mod models;
mod pipeline;
mod routes;
mod scoring_client;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::archive::build_archive;
use crate::config::Config;
use crate::db::create_pool;
use crate::pipeline::{Pipeline, PipelineSettings, ScoringQueue, WorkerPool};
use crate::routes::build_router;
use crate::scoring_client::ScoringClient;
use crate::state::AppState;
use crate::store::{IntakeStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recruitment API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let store: Arc<dyn IntakeStore> = Arc::new(PgStore::new(db));

    // Initialize scoring service client
    let scorer = Arc::new(ScoringClient::new(&config.scoring_service_url)?);
    info!("Scoring client initialized ({})", config.scoring_service_url);

    // Initialize resume archive
    let archive = build_archive(&config.archive).await?;
    info!("Archive backend initialized");

    tokio::fs::create_dir_all(&config.staging_dir).await?;

    // Start the background worker pool
    let pipeline = Arc::new(Pipeline::new(
        store.clone(),
        scorer,
        archive,
        PipelineSettings::from_config(&config),
    ));
    let (queue, receiver) = ScoringQueue::bounded(config.queue_capacity);
    let workers = WorkerPool::spawn(receiver, pipeline, config.worker_pool_size);

    // Build app state
    let state = AppState {
        store,
        queue,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the career-page frontend

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and with it the last queue sender) is gone; let queued and
    // in-flight applications finish.
    info!("Waiting for background applications to finish");
    workers.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
