//! Read-only dashboard payload: recent activity, open alerts, village map data
//! and a 7-day report chart. Unlike `/api/summary` it never raises alerts.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use super::AppState;
use crate::error::Result;
use crate::models::{Alert, Reading, SymptomReport, VillageSummary};
use crate::rules::Thresholds;
use crate::store::Store;
use crate::village::Aggregator;

// ---

const RECENT_READINGS: u32 = 20;
const RECENT_REPORTS: u32 = 10;
const CHART_DAYS: i64 = 7;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(handler))
}

#[derive(Debug, Serialize)]
pub struct DailyCounts {
    pub labels: Vec<String>,
    pub data: Vec<i64>,
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    water_data: Vec<Reading>,
    recent_reports: Vec<SymptomReport>,
    alerts: Vec<Alert>,
    villages: Vec<VillageSummary>,
    chart: DailyCounts,
    thresholds: Thresholds,
}

/// Reports per UTC calendar day for the last `days` days, oldest first.
pub async fn daily_report_counts(
    store: &dyn Store,
    now: DateTime<Utc>,
    days: i64,
) -> Result<DailyCounts> {
    // ---
    let today = now.date_naive();
    let mut chart = DailyCounts {
        labels: Vec::with_capacity(days as usize),
        data: Vec::with_capacity(days as usize),
    };

    for offset in (0..days).rev() {
        let day = today - Duration::days(offset);
        let start = Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN));
        let count = store
            .count_reports_between(start, start + Duration::days(1))
            .await?;
        chart.labels.push(day.format("%b %d").to_string());
        chart.data.push(count);
    }
    Ok(chart)
}

async fn handler(State(state): State<AppState>) -> Result<Json<DashboardResponse>> {
    // ---
    let store = state.store.as_ref();
    let risk = &state.config.risk;
    let now = Utc::now();

    let villages = Aggregator::new(store, risk)
        .assess_all(risk.windows.dashboard, now)
        .await?
        .into_iter()
        .map(|a| a.summary)
        .collect();

    Ok(Json(DashboardResponse {
        water_data: store.recent_readings(RECENT_READINGS).await?,
        recent_reports: store.recent_reports(RECENT_REPORTS).await?,
        alerts: store.unresolved_alerts(state.config.alerts_limit).await?,
        villages,
        chart: daily_report_counts(store, now, CHART_DAYS).await?,
        thresholds: risk.thresholds,
    }))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::NewSymptomReport;
    use crate::store::MemoryStore;

    fn report(at: DateTime<Utc>) -> NewSymptomReport {
        NewSymptomReport {
            name: None,
            age: None,
            gender: "Other".to_string(),
            contact: None,
            village: "Aizawl".to_string(),
            state: "Mizoram".to_string(),
            district: "Aizawl".to_string(),
            symptoms: "fever".to_string(),
            disease: None,
            water_source: "Tap".to_string(),
            image_name: None,
            remarks: None,
            reported_at: at,
        }
    }

    #[tokio::test]
    async fn test_daily_counts_bucket_by_calendar_day() {
        // ---
        let store = MemoryStore::new();
        let now = Utc.with_ymd_and_hms(2025, 9, 10, 15, 0, 0).unwrap();
        store.insert_report(report(Utc.with_ymd_and_hms(2025, 9, 10, 0, 0, 0).unwrap())).await.unwrap();
        store.insert_report(report(Utc.with_ymd_and_hms(2025, 9, 9, 23, 59, 59).unwrap())).await.unwrap();
        store.insert_report(report(Utc.with_ymd_and_hms(2025, 9, 4, 8, 0, 0).unwrap())).await.unwrap();
        store.insert_report(report(Utc.with_ymd_and_hms(2025, 9, 3, 8, 0, 0).unwrap())).await.unwrap();

        let chart = daily_report_counts(&store, now, 7).await.unwrap();

        assert_eq!(
            chart.labels,
            vec!["Sep 04", "Sep 05", "Sep 06", "Sep 07", "Sep 08", "Sep 09", "Sep 10"]
        );
        assert_eq!(chart.data, vec![1, 0, 0, 0, 0, 1, 1]);
    }
}
