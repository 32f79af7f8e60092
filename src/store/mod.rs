//! Persistence boundary.
//!
//! The service never talks to a database directly; handlers, the aggregator
//! and the alert deduplicator go through [`Store`]. Implementations must make
//! [`Store::create_alert_if_none_open`] atomic so that at most one unresolved
//! alert exists per `(village, kind)` even with concurrent writers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Alert, AlertKind, NewAlert, NewReading, NewSymptomReport, Reading, SymptomReport,
};

mod memory;
mod postgres;
#[cfg(test)]
pub(crate) mod testing;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    // --- readings

    async fn insert_reading(&self, reading: NewReading) -> Result<Reading>;

    /// Most recent reading across all villages.
    async fn latest_reading(&self) -> Result<Option<Reading>>;

    async fn latest_reading_for(&self, village: &str) -> Result<Option<Reading>>;

    /// Newest first.
    async fn recent_readings(&self, limit: u32) -> Result<Vec<Reading>>;

    // --- symptom reports

    async fn insert_report(&self, report: NewSymptomReport) -> Result<SymptomReport>;

    /// Newest first.
    async fn recent_reports(&self, limit: u32) -> Result<Vec<SymptomReport>>;

    /// Reports for `village` at or after `since`; all of them when `since` is `None`.
    async fn count_reports(&self, village: &str, since: Option<DateTime<Utc>>) -> Result<i64>;

    /// Reports for `village` whose symptom text contains `keyword`, ignoring case.
    async fn count_reports_mentioning(&self, village: &str, keyword: &str) -> Result<i64>;

    /// Reports across all villages in `[from, to)`.
    async fn count_reports_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<i64>;

    // --- villages

    /// Distinct villages seen in readings or reports, sorted by name.
    async fn villages(&self) -> Result<Vec<String>>;

    // --- alerts

    async fn open_alert(&self, village: &str, kind: AlertKind) -> Result<Option<Alert>>;

    /// Store `alert` unless an unresolved alert with the same village and kind
    /// exists. Returns `None` when suppressed.
    async fn create_alert_if_none_open(&self, alert: NewAlert) -> Result<Option<Alert>>;

    /// Unresolved alerts, newest first.
    async fn unresolved_alerts(&self, limit: u32) -> Result<Vec<Alert>>;

    /// Mark an alert resolved. `None` if no alert has this id.
    async fn resolve_alert(&self, id: Uuid) -> Result<Option<Alert>>;
}
