//! Per-village aggregation.
//!
//! Joins the latest reading, symptom-report activity and keyword tallies for
//! a village and runs them through the classifier and disease rules. Results
//! are recomputed on every call and never cached.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::RiskConfig;
use crate::error::Result;
use crate::models::VillageSummary;
use crate::rules::{self, SymptomTally, TRACKED_KEYWORDS};
use crate::store::Store;

// ---

/// Coordinate resolution: reading's own position, then a per-village
/// fallback, then a global default. Latitude and longitude fall back
/// independently.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateTable {
    fallbacks: BTreeMap<String, (f64, f64)>,
    default: (f64, f64),
}

impl Default for CoordinateTable {
    fn default() -> Self {
        Self::new(26.2, 92.9)
            .with_fallback("Village A", 26.0, 92.0)
            .with_fallback("Village B", 26.1, 92.2)
            .with_fallback("Village C", 26.2, 92.4)
    }
}

impl CoordinateTable {
    /// A table with no per-village entries.
    pub fn new(default_lat: f64, default_lng: f64) -> Self {
        Self {
            fallbacks: BTreeMap::new(),
            default: (default_lat, default_lng),
        }
    }

    pub fn with_fallback(mut self, village: &str, lat: f64, lng: f64) -> Self {
        self.fallbacks.insert(village.to_string(), (lat, lng));
        self
    }

    pub fn resolve(&self, village: &str, lat: Option<f64>, lng: Option<f64>) -> (f64, f64) {
        // ---
        let (fallback_lat, fallback_lng) = self
            .fallbacks
            .get(village)
            .copied()
            .unwrap_or(self.default);
        (lat.unwrap_or(fallback_lat), lng.unwrap_or(fallback_lng))
    }
}

/// A village summary plus the inputs alert rules need beyond it.
#[derive(Debug, Clone, PartialEq)]
pub struct VillageAssessment {
    pub summary: VillageSummary,
    /// Reports inside the configured alert window.
    pub alert_window_reports: i64,
}

pub struct Aggregator<'a> {
    store: &'a dyn Store,
    risk: &'a RiskConfig,
}

fn since(now: DateTime<Utc>, window: Option<Duration>) -> Option<DateTime<Utc>> {
    window.map(|w| now - w)
}

impl<'a> Aggregator<'a> {
    pub fn new(store: &'a dyn Store, risk: &'a RiskConfig) -> Self {
        Self { store, risk }
    }

    /// Assess one village. `window` selects how far back `symptom_count` looks.
    pub async fn assess(
        &self,
        village: &str,
        window: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<VillageAssessment> {
        // ---
        let latest = self.store.latest_reading_for(village).await?;

        let symptom_count = self
            .store
            .count_reports(village, since(now, window))
            .await?;
        let alert_window_reports = if window == self.risk.windows.alert {
            symptom_count
        } else {
            self.store
                .count_reports(village, since(now, self.risk.windows.alert))
                .await?
        };

        let mut tally = SymptomTally::new();
        for keyword in TRACKED_KEYWORDS {
            let count = self.store.count_reports_mentioning(village, keyword).await?;
            tally.set(keyword, count);
        }

        let (ph, turbidity, tds) = match &latest {
            Some(r) => (Some(r.ph), Some(r.turbidity), Some(r.tds)),
            None => (None, None, None),
        };
        let (lat, lng) = self.risk.coordinates.resolve(
            village,
            latest.as_ref().and_then(|r| r.lat),
            latest.as_ref().and_then(|r| r.lng),
        );

        let thresholds = &self.risk.thresholds;
        let status = thresholds.classify(ph, turbidity, tds);
        let predicted_disease = rules::predict(
            thresholds,
            self.risk.symptom_keyword_limit,
            ph,
            turbidity,
            tds,
            &tally,
        );

        debug!(
            village,
            %status,
            symptom_count,
            alert_window_reports,
            ?predicted_disease,
            "village assessed"
        );

        Ok(VillageAssessment {
            summary: VillageSummary {
                village: village.to_string(),
                lat,
                lng,
                ph,
                turbidity,
                tds,
                symptom_count,
                status,
                predicted_disease,
            },
            alert_window_reports,
        })
    }

    /// Assess every known village, sorted by village name.
    pub async fn assess_all(
        &self,
        window: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<Vec<VillageAssessment>> {
        // ---
        let villages = self.store.villages().await?;
        let mut out = Vec::with_capacity(villages.len());
        for village in &villages {
            out.push(self.assess(village, window, now).await?);
        }
        Ok(out)
    }
}
