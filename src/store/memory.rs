//! In-process store backed by mutex-guarded vectors.
//!
//! Selected with `STORAGE_BACKEND=memory` and used throughout the tests.
//! Data lives as long as the process.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Store;
use crate::error::{AppError, Result};
use crate::models::{
    Alert, AlertKind, AlertStatus, NewAlert, NewReading, NewSymptomReport, Reading, SymptomReport,
};

#[derive(Debug, Default)]
struct Tables {
    // Insertion order is preserved; later entries are newer writes.
    readings: Vec<Reading>,
    reports: Vec<SymptomReport>,
    alerts: Vec<Alert>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Persistence("memory store lock poisoned".to_string()))
    }
}

/// Newest-first ordering that keeps later inserts ahead on equal timestamps.
fn newest_first<T: Clone>(items: &[T], limit: u32, ts: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    // ---
    let mut sorted: Vec<T> = items.iter().rev().cloned().collect();
    sorted.sort_by(|a, b| ts(b).cmp(&ts(a)));
    sorted.truncate(limit as usize);
    sorted
}

fn latest<'a>(readings: impl Iterator<Item = &'a Reading>) -> Option<Reading> {
    // ---
    let mut best: Option<&Reading> = None;
    for r in readings {
        if best.map_or(true, |b| r.timestamp >= b.timestamp) {
            best = Some(r);
        }
    }
    best.cloned()
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_reading(&self, reading: NewReading) -> Result<Reading> {
        // ---
        let reading = reading.into_reading(Uuid::new_v4());
        self.lock()?.readings.push(reading.clone());
        Ok(reading)
    }

    async fn latest_reading(&self) -> Result<Option<Reading>> {
        Ok(latest(self.lock()?.readings.iter()))
    }

    async fn latest_reading_for(&self, village: &str) -> Result<Option<Reading>> {
        Ok(latest(
            self.lock()?.readings.iter().filter(|r| r.village == village),
        ))
    }

    async fn recent_readings(&self, limit: u32) -> Result<Vec<Reading>> {
        Ok(newest_first(&self.lock()?.readings, limit, |r| r.timestamp))
    }

    async fn insert_report(&self, report: NewSymptomReport) -> Result<SymptomReport> {
        // ---
        let report = report.into_report(Uuid::new_v4());
        self.lock()?.reports.push(report.clone());
        Ok(report)
    }

    async fn recent_reports(&self, limit: u32) -> Result<Vec<SymptomReport>> {
        Ok(newest_first(&self.lock()?.reports, limit, |r| r.reported_at))
    }

    async fn count_reports(&self, village: &str, since: Option<DateTime<Utc>>) -> Result<i64> {
        // ---
        let tables = self.lock()?;
        let count = tables
            .reports
            .iter()
            .filter(|r| r.village == village)
            .filter(|r| since.map_or(true, |s| r.reported_at >= s))
            .count();
        Ok(count as i64)
    }

    async fn count_reports_mentioning(&self, village: &str, keyword: &str) -> Result<i64> {
        // ---
        let needle = keyword.to_lowercase();
        let tables = self.lock()?;
        let count = tables
            .reports
            .iter()
            .filter(|r| r.village == village && r.symptoms.to_lowercase().contains(&needle))
            .count();
        Ok(count as i64)
    }

    async fn count_reports_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<i64> {
        // ---
        let tables = self.lock()?;
        let count = tables
            .reports
            .iter()
            .filter(|r| r.reported_at >= from && r.reported_at < to)
            .count();
        Ok(count as i64)
    }

    async fn villages(&self) -> Result<Vec<String>> {
        // ---
        let tables = self.lock()?;
        let names: BTreeSet<&str> = tables
            .readings
            .iter()
            .map(|r| r.village.as_str())
            .chain(tables.reports.iter().map(|r| r.village.as_str()))
            .collect();
        Ok(names.into_iter().map(str::to_string).collect())
    }

    async fn open_alert(&self, village: &str, kind: AlertKind) -> Result<Option<Alert>> {
        // ---
        let tables = self.lock()?;
        Ok(tables
            .alerts
            .iter()
            .find(|a| a.village == village && a.kind == kind && a.status == AlertStatus::Unresolved)
            .cloned())
    }

    async fn create_alert_if_none_open(&self, alert: NewAlert) -> Result<Option<Alert>> {
        // ---
        // Check and insert under one lock so concurrent callers cannot both win.
        let mut tables = self.lock()?;
        let exists = tables.alerts.iter().any(|a| {
            a.village == alert.village && a.kind == alert.kind && a.status == AlertStatus::Unresolved
        });
        if exists {
            return Ok(None);
        }

        let alert = alert.into_alert(Uuid::new_v4());
        tables.alerts.push(alert.clone());
        Ok(Some(alert))
    }

    async fn unresolved_alerts(&self, limit: u32) -> Result<Vec<Alert>> {
        // ---
        let tables = self.lock()?;
        let open: Vec<Alert> = tables
            .alerts
            .iter()
            .filter(|a| a.status == AlertStatus::Unresolved)
            .cloned()
            .collect();
        Ok(newest_first(&open, limit, |a| a.triggered_at))
    }

    async fn resolve_alert(&self, id: Uuid) -> Result<Option<Alert>> {
        // ---
        let mut tables = self.lock()?;
        Ok(tables.alerts.iter_mut().find(|a| a.id == id).map(|a| {
            a.status = AlertStatus::Resolved;
            a.clone()
        }))
    }
}
