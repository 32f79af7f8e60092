use axum::{routing::get, Json, Router};
use serde::Serialize;

use super::AppState;
use crate::regions::STATE_DISTRICTS;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/api/regions", get(handler))
}

#[derive(Debug, Serialize)]
struct StateEntry {
    state: &'static str,
    districts: &'static [&'static str],
}

/// `GET /api/regions`: the state → district table used for form choices.
async fn handler() -> Json<Vec<StateEntry>> {
    Json(
        STATE_DISTRICTS
            .iter()
            .map(|(state, districts)| StateEntry { state, districts })
            .collect(),
    )
}
