use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::alerts::Deduplicator;
use crate::store::Store;
use crate::Config;

mod alerts;
mod dashboard;
mod health;
mod regions;
mod reports;
mod summary;
mod water;

// ---

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub dedup: Arc<Deduplicator>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config, dedup: Deduplicator) -> Self {
        Self {
            store,
            config: Arc::new(config),
            dedup: Arc::new(dedup),
        }
    }
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(water::router())
        .merge(summary::router())
        .merge(alerts::router())
        .merge(reports::router())
        .merge(dashboard::router())
        .merge(regions::router())
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
