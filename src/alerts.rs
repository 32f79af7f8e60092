//! Alert rules and the deduplicator that stores their output.
//!
//! Each [`AlertRule`] looks at a [`VillageAssessment`] and may propose an
//! alert. The [`Deduplicator`] runs its rules in order and writes a proposal
//! only if no unresolved alert of the same kind is open for the village.
//! Alerts are resolved manually; nothing here ever closes one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::RiskConfig;
use crate::error::Result;
use crate::models::{Alert, AlertKind, NewAlert};
use crate::notify::Notifier;
use crate::rules;
use crate::store::Store;
use crate::village::VillageAssessment;

pub trait AlertRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, assessment: &VillageAssessment, now: DateTime<Utc>) -> Option<NewAlert>;
}

/// Whole numbers keep their decimal point: `5.0`, not `5`.
fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "None".to_string(), |v| format!("{:?}", v))
}

/// Raises a water alert while the village's water is `warning` or `unsafe`.
#[derive(Debug, Default, Clone)]
pub struct WaterQualityRule;

impl AlertRule for WaterQualityRule {
    fn name(&self) -> &'static str {
        "water-quality"
    }

    fn evaluate(&self, assessment: &VillageAssessment, now: DateTime<Utc>) -> Option<NewAlert> {
        // ---
        let s = &assessment.summary;
        if !s.status.is_alarming() {
            return None;
        }

        Some(NewAlert {
            village: s.village.clone(),
            kind: AlertKind::Water,
            message: format!(
                "Water quality {} in {}. pH={}, Turbidity={}, TDS={}",
                s.status.as_str().to_uppercase(),
                s.village,
                fmt_value(s.ph),
                fmt_value(s.turbidity),
                fmt_value(s.tds)
            ),
            triggered_at: now,
        })
    }
}

/// Raises a disease alert whenever the rule engine predicts any disease.
#[derive(Debug, Default, Clone)]
pub struct PredictedDiseaseRule;

impl AlertRule for PredictedDiseaseRule {
    fn name(&self) -> &'static str {
        "predicted-disease"
    }

    fn evaluate(&self, assessment: &VillageAssessment, now: DateTime<Utc>) -> Option<NewAlert> {
        // ---
        let s = &assessment.summary;
        if !rules::has_risk(&s.predicted_disease) {
            return None;
        }

        Some(NewAlert {
            village: s.village.clone(),
            kind: AlertKind::Disease,
            message: format!(
                "Predicted disease risk in {}: {}",
                s.village,
                s.predicted_disease.join(", ")
            ),
            triggered_at: now,
        })
    }
}

/// Unsafe water combined with a burst of recent symptom reports.
///
/// "Unsafe" here means any threshold violation, i.e. `warning` or worse.
/// Shares the disease dedup key, so it should run before
/// [`PredictedDiseaseRule`] to win when both apply.
#[derive(Debug, Clone)]
pub struct OutbreakRule {
    pub min_reports: i64,
}

impl AlertRule for OutbreakRule {
    fn name(&self) -> &'static str {
        "outbreak"
    }

    fn evaluate(&self, assessment: &VillageAssessment, now: DateTime<Utc>) -> Option<NewAlert> {
        // ---
        let s = &assessment.summary;
        if !s.status.is_alarming() || assessment.alert_window_reports < self.min_reports {
            return None;
        }

        Some(NewAlert {
            village: s.village.clone(),
            kind: AlertKind::Disease,
            message: format!(
                "Potential outbreak risk in {}. Unsafe water + {} symptom reports.",
                s.village, assessment.alert_window_reports
            ),
            triggered_at: now,
        })
    }
}

pub struct Deduplicator {
    rules: Vec<Box<dyn AlertRule>>,
    notifier: Arc<dyn Notifier>,
    recipient: String,
}

/// What a best-effort pass over the rules achieved.
#[derive(Debug, Default)]
pub struct AlertOutcome {
    pub created: Vec<Alert>,
    /// Rules whose alert write failed and was skipped.
    pub failed: usize,
}

impl Deduplicator {
    /// A deduplicator with no rules.
    pub fn new(notifier: Arc<dyn Notifier>, recipient: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            notifier,
            recipient: recipient.into(),
        }
    }

    /// Outbreak, water quality and predicted disease rules, in that order.
    pub fn standard(
        risk: &RiskConfig,
        notifier: Arc<dyn Notifier>,
        recipient: impl Into<String>,
    ) -> Self {
        Self::new(notifier, recipient)
            .with_rule(OutbreakRule {
                min_reports: risk.outbreak_min_reports,
            })
            .with_rule(WaterQualityRule)
            .with_rule(PredictedDiseaseRule)
    }

    pub fn with_rule(mut self, rule: impl AlertRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluate every rule for one village and store the alerts that are not
    /// suppressed by an open alert of the same kind.
    ///
    /// The first failed write is returned and the remaining rules are not
    /// evaluated. A failed notification is logged and does not undo the
    /// stored alert.
    pub async fn apply(
        &self,
        store: &dyn Store,
        assessment: &VillageAssessment,
        now: DateTime<Utc>,
    ) -> Result<Vec<Alert>> {
        // ---
        let mut created = Vec::new();

        for rule in &self.rules {
            let Some(draft) = rule.evaluate(assessment, now) else {
                continue;
            };
            if let Some(alert) = self.raise(&**rule, store, draft).await? {
                created.push(alert);
            }
        }

        Ok(created)
    }

    /// Like [`apply`](Self::apply), but a failed write is logged and the
    /// remaining rules still run.
    pub async fn apply_best_effort(
        &self,
        store: &dyn Store,
        assessment: &VillageAssessment,
        now: DateTime<Utc>,
    ) -> AlertOutcome {
        // ---
        let mut outcome = AlertOutcome::default();

        for rule in &self.rules {
            let Some(draft) = rule.evaluate(assessment, now) else {
                continue;
            };
            let village = draft.village.clone();
            match self.raise(&**rule, store, draft).await {
                Ok(Some(alert)) => outcome.created.push(alert),
                Ok(None) => {}
                Err(e) => {
                    error!(rule = rule.name(), village = %village, "Skipping alert write: {}", e);
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }

    /// Write one proposed alert unless an open one blocks it, then notify.
    async fn raise(
        &self,
        rule: &dyn AlertRule,
        store: &dyn Store,
        draft: NewAlert,
    ) -> Result<Option<Alert>> {
        // ---
        let village = draft.village.clone();
        let kind = draft.kind;

        let Some(alert) = store.create_alert_if_none_open(draft).await? else {
            let blocking = store.open_alert(&village, kind).await?.map(|a| a.id);
            debug!(rule = rule.name(), village = %village, %kind, ?blocking, "suppressed, alert already open");
            return Ok(None);
        };

        info!(rule = rule.name(), village = %alert.village, kind = %alert.kind, "alert raised");
        if let Err(e) = self.notifier.notify(&self.recipient, &alert.message).await {
            warn!(village = %alert.village, "Failed to send alert notification: {}", e);
        }
        Ok(Some(alert))
    }
}

#[cfg(test)]
mod tests {
    // ---
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::AppError;
    use crate::models::{AlertStatus, VillageSummary, WaterStatus};
    use crate::store::testing::FailingAlertStore;
    use crate::store::MemoryStore;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, _recipient: &str, body: &str) -> Result<()> {
            self.sent.lock().unwrap().push(body.to_string());
            if self.fail {
                return Err(AppError::Internal("gateway down".into()));
            }
            Ok(())
        }
    }

    fn assessment(
        village: &str,
        status: WaterStatus,
        diseases: &[&str],
        reports: i64,
    ) -> VillageAssessment {
        VillageAssessment {
            summary: VillageSummary {
                village: village.to_string(),
                lat: 26.2,
                lng: 92.9,
                ph: Some(5.0),
                turbidity: Some(12.0),
                tds: Some(600.0),
                symptom_count: reports,
                status,
                predicted_disease: diseases.iter().map(|d| d.to_string()).collect(),
            },
            alert_window_reports: reports,
        }
    }

    fn dedup(notifier: Arc<RecordingNotifier>) -> Deduplicator {
        Deduplicator::standard(&RiskConfig::default(), notifier, "ADMIN_NUMBER")
    }

    #[test]
    fn test_standard_rule_order() {
        // ---
        let d = dedup(Arc::new(RecordingNotifier::default()));
        assert_eq!(d.rule_names(), vec!["outbreak", "water-quality", "predicted-disease"]);
    }

    #[test]
    fn test_water_message_embeds_readings() {
        // ---
        let a = assessment("Kamrup", WaterStatus::Unsafe, &["None"], 0);
        let alert = WaterQualityRule.evaluate(&a, Utc::now()).unwrap();
        assert_eq!(alert.kind, AlertKind::Water);
        assert_eq!(
            alert.message,
            "Water quality UNSAFE in Kamrup. pH=5.0, Turbidity=12.0, TDS=600.0"
        );
    }

    #[test]
    fn test_rules_stay_quiet_for_safe_village() {
        // ---
        let a = assessment("Tura", WaterStatus::Safe, &["None"], 10);
        let now = Utc::now();
        assert!(WaterQualityRule.evaluate(&a, now).is_none());
        assert!(PredictedDiseaseRule.evaluate(&a, now).is_none());
        assert!(OutbreakRule { min_reports: 3 }.evaluate(&a, now).is_none());

        let unknown = assessment("Tura", WaterStatus::Unknown, &["None"], 10);
        assert!(WaterQualityRule.evaluate(&unknown, now).is_none());
    }

    #[test]
    fn test_outbreak_needs_enough_reports() {
        // ---
        let rule = OutbreakRule { min_reports: 3 };
        let now = Utc::now();
        assert!(rule
            .evaluate(&assessment("Ziro", WaterStatus::Warning, &["Diarrhea"], 2), now)
            .is_none());

        let alert = rule
            .evaluate(&assessment("Ziro", WaterStatus::Warning, &["Diarrhea"], 3), now)
            .unwrap();
        assert_eq!(alert.kind, AlertKind::Disease);
        assert_eq!(
            alert.message,
            "Potential outbreak risk in Ziro. Unsafe water + 3 symptom reports."
        );
    }

    #[tokio::test]
    async fn test_repeated_triggers_create_one_alert_per_kind() {
        // ---
        let store = MemoryStore::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let d = dedup(notifier.clone());
        let a = assessment("Kamrup", WaterStatus::Unsafe, &["Gastroenteritis", "Diarrhea"], 0);

        let first = d.apply(&store, &a, Utc::now()).await.unwrap();
        let second = d.apply(&store, &a, Utc::now()).await.unwrap();

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);

        let open = store.unresolved_alerts(10).await.unwrap();
        assert_eq!(open.len(), 2);
        assert!(open.iter().all(|a| a.status == AlertStatus::Unresolved));
        assert!(open.iter().any(|a| a.kind == AlertKind::Water));
        assert!(open.iter().any(|a| a.message == "Predicted disease risk in Kamrup: Gastroenteritis, Diarrhea"));
    }

    #[tokio::test]
    async fn test_outbreak_takes_the_disease_slot() {
        // ---
        let store = MemoryStore::new();
        let d = dedup(Arc::new(RecordingNotifier::default()));
        let a = assessment("Tura", WaterStatus::Warning, &["Diarrhea"], 4);

        let created = d.apply(&store, &a, Utc::now()).await.unwrap();
        assert_eq!(created.len(), 2);

        let disease = store.open_alert("Tura", AlertKind::Disease).await.unwrap().unwrap();
        assert!(disease.message.starts_with("Potential outbreak risk in Tura"));
    }

    #[tokio::test]
    async fn test_resolved_alert_allows_new_one() {
        // ---
        let store = MemoryStore::new();
        let d = dedup(Arc::new(RecordingNotifier::default()));
        let a = assessment("Tura", WaterStatus::Unsafe, &["None"], 0);

        let created = d.apply(&store, &a, Utc::now()).await.unwrap();
        assert_eq!(created.len(), 1);
        store.resolve_alert(created[0].id).await.unwrap();

        let again = d.apply(&store, &a, Utc::now()).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_ne!(again[0].id, created[0].id);
    }

    #[tokio::test]
    async fn test_notifier_failure_keeps_alert() {
        // ---
        let store = MemoryStore::new();
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let d = dedup(notifier);
        let a = assessment("Tura", WaterStatus::Unsafe, &["None"], 0);

        let created = d.apply(&store, &a, Utc::now()).await.unwrap();
        assert_eq!(created.len(), 1);
        assert!(store.open_alert("Tura", AlertKind::Water).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_apply_stops_at_first_failed_write() {
        // ---
        let store = FailingAlertStore::new(AlertKind::Disease);
        let d = dedup(Arc::new(RecordingNotifier::default()));
        let a = assessment("Kamrup", WaterStatus::Unsafe, &["Typhoid"], 3);

        assert!(d.apply(&store, &a, Utc::now()).await.is_err());
        // outbreak runs first, so the water rule never got its turn
        assert!(store.open_alert("Kamrup", AlertKind::Water).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_best_effort_keeps_evaluating_after_failed_write() {
        // ---
        let store = FailingAlertStore::new(AlertKind::Disease);
        let notifier = Arc::new(RecordingNotifier::default());
        let d = dedup(notifier.clone());
        let a = assessment("Kamrup", WaterStatus::Unsafe, &["Typhoid"], 3);

        let outcome = d.apply_best_effort(&store, &a, Utc::now()).await;
        assert_eq!(outcome.failed, 2);
        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.created[0].kind, AlertKind::Water);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }
}
