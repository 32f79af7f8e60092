//! Alert listing, manual resolution and the externally triggered sweep.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::error::{AppError, Result};
use crate::models::Alert;
use crate::sweep::{self, SweepReport};

// ---

const MAX_ALERTS: u32 = 200;

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/alerts", get(list))
        .route("/api/alerts/{id}/resolve", post(resolve))
        .route("/api/sweep", post(run_sweep))
}

#[derive(Debug, Deserialize)]
struct AlertsQuery {
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct AlertsResponse {
    alerts: Vec<Alert>,
}

/// `GET /api/alerts`: unresolved alerts, newest first.
async fn list(
    State(state): State<AppState>,
    Query(params): Query<AlertsQuery>,
) -> Result<Json<AlertsResponse>> {
    // ---
    let limit = params
        .limit
        .unwrap_or(state.config.alerts_limit)
        .clamp(1, MAX_ALERTS);
    let alerts = state.store.unresolved_alerts(limit).await?;
    Ok(Json(AlertsResponse { alerts }))
}

/// `POST /api/alerts/{id}/resolve`: the only way an alert leaves `unresolved`.
async fn resolve(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Alert>> {
    // ---
    let alert = state
        .store
        .resolve_alert(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Alert {} not found", id)))?;

    info!(village = %alert.village, kind = %alert.kind, "alert resolved");
    Ok(Json(alert))
}

/// `POST /api/sweep`: evaluate all villages once, for external schedulers.
async fn run_sweep(State(state): State<AppState>) -> Result<Json<SweepReport>> {
    // ---
    let report = sweep::sweep_all(
        state.store.as_ref(),
        &state.config.risk,
        &state.dedup,
        Utc::now(),
    )
    .await?;
    Ok(Json(report))
}
