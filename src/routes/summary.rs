use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::AppState;
use crate::error::Result;
use crate::models::VillageSummary;
use crate::sweep;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/api/summary", get(handler))
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    villages: Vec<VillageSummary>,
}

/// `GET /api/summary`: every village, sorted by name, with alerts raised as a side effect.
async fn handler(State(state): State<AppState>) -> Result<Json<SummaryResponse>> {
    // ---
    let villages = sweep::summaries_with_alerts(
        state.store.as_ref(),
        &state.config.risk,
        &state.dedup,
        Utc::now(),
    )
    .await?;

    info!("GET /api/summary - {} villages", villages.len());
    Ok(Json(SummaryResponse { villages }))
}
