//! Drives the aggregator and the deduplicator across villages.
//!
//! There is no in-process timer. A sweep runs when a reading arrives (for
//! that village), when the summary API is queried, or when an external
//! scheduler calls `POST /api/sweep`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::alerts::Deduplicator;
use crate::config::RiskConfig;
use crate::error::Result;
use crate::models::{Alert, VillageSummary};
use crate::store::Store;
use crate::village::Aggregator;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub villages: usize,
    pub alerts_created: usize,
    /// Villages whose assessment failed or that had at least one failed alert write.
    pub failures: usize,
}

/// Evaluate a single village. Any failure, including the alert write, is
/// returned to the caller.
pub async fn evaluate_village(
    store: &dyn Store,
    risk: &RiskConfig,
    dedup: &Deduplicator,
    village: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Alert>> {
    // ---
    let assessment = Aggregator::new(store, risk)
        .assess(village, risk.windows.alert, now)
        .await?;
    dedup.apply(store, &assessment, now).await
}

/// Evaluate every known village. Per-village failures are logged and
/// counted, never returned; only failing to list villages is an error.
///
/// A failed alert write skips that alert only; the village's other rules
/// still run.
pub async fn sweep_all(
    store: &dyn Store,
    risk: &RiskConfig,
    dedup: &Deduplicator,
    now: DateTime<Utc>,
) -> Result<SweepReport> {
    // ---
    let villages = store.villages().await?;
    let mut report = SweepReport {
        villages: villages.len(),
        ..SweepReport::default()
    };
    let aggregator = Aggregator::new(store, risk);

    for village in &villages {
        let assessment = match aggregator.assess(village, risk.windows.alert, now).await {
            Ok(assessment) => assessment,
            Err(e) => {
                error!(village = %village, "Sweep failed for village: {}", e);
                report.failures += 1;
                continue;
            }
        };

        let outcome = dedup.apply_best_effort(store, &assessment, now).await;
        report.alerts_created += outcome.created.len();
        if outcome.failed > 0 {
            report.failures += 1;
        }
    }

    info!(
        villages = report.villages,
        alerts_created = report.alerts_created,
        failures = report.failures,
        "sweep complete"
    );
    Ok(report)
}

/// Summaries over the summary window, raising alerts on the side.
///
/// Alert creation is best-effort here: a failed write is logged, the other
/// rules still run and the summary is still returned.
pub async fn summaries_with_alerts(
    store: &dyn Store,
    risk: &RiskConfig,
    dedup: &Deduplicator,
    now: DateTime<Utc>,
) -> Result<Vec<VillageSummary>> {
    // ---
    let assessments = Aggregator::new(store, risk)
        .assess_all(risk.windows.summary, now)
        .await?;

    let mut summaries = Vec::with_capacity(assessments.len());
    for assessment in assessments {
        dedup.apply_best_effort(store, &assessment, now).await;
        summaries.push(assessment.summary);
    }
    Ok(summaries)
}
