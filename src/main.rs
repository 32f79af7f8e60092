//! Application entry point for the `aarogya-sentinel` service.
//!
//! Startup sequence:
//! - Load `.env` and environment configuration
//! - Initialize structured logging/tracing
//! - Open the selected store (PostgreSQL pool plus schema, or in-memory)
//! - Build the alert deduplicator and mount all routes via the `routes` gateway
//! - Bind the Axum HTTP server and serve until Ctrl-C
//!
//! # Environment Variables
//! - `STORAGE_BACKEND` (optional) – `postgres` (default) or `memory`
//! - `DATABASE_URL` (required for postgres) – PostgreSQL connection string
//! - `APP_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//!
//! Logging keys are documented on `telemetry::LogSettings`, the rest on
//! `config::load_from_env`.
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;

use aarogya_sentinel::alerts::Deduplicator;
use aarogya_sentinel::config::{self, StorageBackend};
use aarogya_sentinel::notify::LogNotifier;
use aarogya_sentinel::routes::{self, AppState};
use aarogya_sentinel::schema;
use aarogya_sentinel::store::{MemoryStore, PgStore, Store};
use aarogya_sentinel::telemetry::{self, LogSettings};
use aarogya_sentinel::Config;

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    telemetry::init(&LogSettings::from_env("debug"));

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let store = open_store(&cfg).await?;
    let dedup = Deduplicator::standard(
        &cfg.risk,
        Arc::new(LogNotifier),
        cfg.notify_recipient.clone(),
    );
    tracing::info!("Alert rules: {:?}", dedup.rule_names());

    let addr = cfg.bind_addr;
    let app = routes::router(AppState::new(store, cfg, dedup));

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Open the store selected by `STORAGE_BACKEND`.
async fn open_store(cfg: &Config) -> Result<Arc<dyn Store>> {
    // ---
    match cfg.storage {
        StorageBackend::Postgres => {
            let db_url = cfg
                .db_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres backend"))?;
            let masked = config::mask_db_url(db_url);
            tracing::info!("Attempting to connect to database: {}", masked);

            let pool = PgPoolOptions::new()
                .max_connections(cfg.db_pool_max)
                .connect(db_url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database '{}': {}", masked, e))?;

            tracing::info!("Successfully connected to database");
            schema::create_schema(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    // ---
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
