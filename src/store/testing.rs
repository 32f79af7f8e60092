//! Store wrappers for exercising failure paths in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{MemoryStore, Store};
use crate::error::{AppError, Result};
use crate::models::{
    Alert, AlertKind, NewAlert, NewReading, NewSymptomReport, Reading, SymptomReport,
};

/// A [`MemoryStore`] whose alert writes fail for one alert kind.
#[derive(Debug)]
pub struct FailingAlertStore {
    pub inner: MemoryStore,
    pub fail_kind: AlertKind,
}

impl FailingAlertStore {
    pub fn new(fail_kind: AlertKind) -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_kind,
        }
    }
}

#[async_trait]
impl Store for FailingAlertStore {
    async fn insert_reading(&self, reading: NewReading) -> Result<Reading> {
        self.inner.insert_reading(reading).await
    }

    async fn latest_reading(&self) -> Result<Option<Reading>> {
        self.inner.latest_reading().await
    }

    async fn latest_reading_for(&self, village: &str) -> Result<Option<Reading>> {
        self.inner.latest_reading_for(village).await
    }

    async fn recent_readings(&self, limit: u32) -> Result<Vec<Reading>> {
        self.inner.recent_readings(limit).await
    }

    async fn insert_report(&self, report: NewSymptomReport) -> Result<SymptomReport> {
        self.inner.insert_report(report).await
    }

    async fn recent_reports(&self, limit: u32) -> Result<Vec<SymptomReport>> {
        self.inner.recent_reports(limit).await
    }

    async fn count_reports(&self, village: &str, since: Option<DateTime<Utc>>) -> Result<i64> {
        self.inner.count_reports(village, since).await
    }

    async fn count_reports_mentioning(&self, village: &str, keyword: &str) -> Result<i64> {
        self.inner.count_reports_mentioning(village, keyword).await
    }

    async fn count_reports_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<i64> {
        self.inner.count_reports_between(from, to).await
    }

    async fn villages(&self) -> Result<Vec<String>> {
        self.inner.villages().await
    }

    async fn open_alert(&self, village: &str, kind: AlertKind) -> Result<Option<Alert>> {
        self.inner.open_alert(village, kind).await
    }

    async fn create_alert_if_none_open(&self, alert: NewAlert) -> Result<Option<Alert>> {
        // ---
        if alert.kind == self.fail_kind {
            return Err(AppError::Persistence(format!(
                "{} alert write rejected for {}",
                alert.kind, alert.village
            )));
        }
        self.inner.create_alert_if_none_open(alert).await
    }

    async fn unresolved_alerts(&self, limit: u32) -> Result<Vec<Alert>> {
        self.inner.unresolved_alerts(limit).await
    }

    async fn resolve_alert(&self, id: Uuid) -> Result<Option<Alert>> {
        self.inner.resolve_alert(id).await
    }
}
