//! Reading ingestion and the latest-reading query.

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::{Validate, ValidationError};

use super::AppState;
use crate::error::{AppError, Result};
use crate::extract::AppJson;
use crate::models::{NewReading, Reading};
use crate::sweep;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/water", get(latest))
        .route("/api/water/post", post(ingest))
}

/// Sensor payload. Extra fields sent by producers (e.g. `state`) are ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct ReadingPayload {
    // ---
    #[validate(length(max = 100), custom(function = "not_blank"))]
    pub village: String,
    #[validate(range(min = 0.0, max = 14.0, message = "ph must be between 0 and 14"))]
    pub ph: f64,
    #[validate(range(min = 0.0, message = "turbidity must not be negative"))]
    pub turbidity: f64,
    #[validate(range(min = 0.0, message = "tds must not be negative"))]
    pub tds: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    status: &'static str,
    reading: Reading,
    alerts_created: usize,
}

/// `POST /api/water/post`: store a reading, then evaluate its village.
///
/// A failed alert write fails the request; the reading itself stays stored.
async fn ingest(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ReadingPayload>,
) -> Result<(StatusCode, Json<IngestResponse>)> {
    // ---
    payload.validate()?;

    let now = Utc::now();
    let reading = state
        .store
        .insert_reading(NewReading {
            village: payload.village.trim().to_string(),
            ph: payload.ph,
            turbidity: payload.turbidity,
            tds: payload.tds,
            lat: payload.lat,
            lng: payload.lng,
            timestamp: now,
        })
        .await?;
    debug!(village = %reading.village, ph = reading.ph, turbidity = reading.turbidity, tds = reading.tds, "reading stored");

    let created = sweep::evaluate_village(
        state.store.as_ref(),
        &state.config.risk,
        &state.dedup,
        &reading.village,
        now,
    )
    .await?;
    if !created.is_empty() {
        info!(village = %reading.village, count = created.len(), "alerts raised on ingest");
    }

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            status: "ok",
            reading,
            alerts_created: created.len(),
        }),
    ))
}

/// `GET /api/water`: the most recent reading across all villages.
async fn latest(State(state): State<AppState>) -> Result<Json<Reading>> {
    // ---
    state
        .store
        .latest_reading()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No data yet".to_string()))
}
