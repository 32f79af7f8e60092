//! PostgreSQL-backed [`Store`].
//!
//! Enum columns are stored as TEXT and converted through private row types so
//! a corrupt value surfaces as a decode error instead of a silent default.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::Store;
use crate::error::{AppError, Result};
use crate::models::{
    Alert, AlertKind, AlertStatus, NewAlert, NewReading, NewSymptomReport, Reading, SymptomReport,
};

// ---

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReadingRow {
    id: Uuid,
    village: String,
    ph: f64,
    turbidity: f64,
    tds: f64,
    lat: Option<f64>,
    lng: Option<f64>,
    recorded_at: DateTime<Utc>,
}

impl From<ReadingRow> for Reading {
    fn from(row: ReadingRow) -> Self {
        Reading {
            id: row.id,
            village: row.village,
            ph: row.ph,
            turbidity: row.turbidity,
            tds: row.tds,
            lat: row.lat,
            lng: row.lng,
            timestamp: row.recorded_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    id: Uuid,
    name: Option<String>,
    age: Option<i32>,
    gender: String,
    contact: Option<String>,
    village: String,
    state: String,
    district: String,
    symptoms: String,
    disease: Option<String>,
    water_source: String,
    image_name: Option<String>,
    remarks: Option<String>,
    reported_at: DateTime<Utc>,
}

impl From<ReportRow> for SymptomReport {
    fn from(row: ReportRow) -> Self {
        SymptomReport {
            id: row.id,
            name: row.name,
            age: row.age,
            gender: row.gender,
            contact: row.contact,
            village: row.village,
            state: row.state,
            district: row.district,
            symptoms: row.symptoms,
            disease: row.disease,
            water_source: row.water_source,
            image_name: row.image_name,
            remarks: row.remarks,
            reported_at: row.reported_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AlertRow {
    id: Uuid,
    village: String,
    kind: String,
    message: String,
    status: String,
    triggered_at: DateTime<Utc>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = AppError;

    fn try_from(row: AlertRow) -> Result<Self> {
        // ---
        let kind = row
            .kind
            .parse::<AlertKind>()
            .map_err(|e| AppError::Persistence(format!("alert {}: {}", row.id, e)))?;
        let status = row
            .status
            .parse::<AlertStatus>()
            .map_err(|e| AppError::Persistence(format!("alert {}: {}", row.id, e)))?;

        Ok(Alert {
            id: row.id,
            village: row.village,
            kind,
            message: row.message,
            status,
            triggered_at: row.triggered_at,
        })
    }
}

const READING_COLUMNS: &str = "id, village, ph, turbidity, tds, lat, lng, recorded_at";
const REPORT_COLUMNS: &str = "id, name, age, gender, contact, village, state, district, \
     symptoms, disease, water_source, image_name, remarks, reported_at";
const ALERT_COLUMNS: &str = "id, village, kind, message, status, triggered_at";

#[async_trait]
impl Store for PgStore {
    async fn insert_reading(&self, reading: NewReading) -> Result<Reading> {
        // ---
        let row: ReadingRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO readings (id, village, ph, turbidity, tds, lat, lng, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {READING_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&reading.village)
        .bind(reading.ph)
        .bind(reading.turbidity)
        .bind(reading.tds)
        .bind(reading.lat)
        .bind(reading.lng)
        .bind(reading.timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn latest_reading(&self) -> Result<Option<Reading>> {
        // ---
        let row: Option<ReadingRow> = sqlx::query_as(&format!(
            "SELECT {READING_COLUMNS} FROM readings ORDER BY recorded_at DESC, seq DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn latest_reading_for(&self, village: &str) -> Result<Option<Reading>> {
        // ---
        let row: Option<ReadingRow> = sqlx::query_as(&format!(
            r#"
            SELECT {READING_COLUMNS} FROM readings
            WHERE village = $1
            ORDER BY recorded_at DESC, seq DESC
            LIMIT 1
            "#
        ))
        .bind(village)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn recent_readings(&self, limit: u32) -> Result<Vec<Reading>> {
        // ---
        let rows: Vec<ReadingRow> = sqlx::query_as(&format!(
            "SELECT {READING_COLUMNS} FROM readings ORDER BY recorded_at DESC, seq DESC LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_report(&self, report: NewSymptomReport) -> Result<SymptomReport> {
        // ---
        let row: ReportRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO symptom_reports (
                id, name, age, gender, contact, village, state, district,
                symptoms, disease, water_source, image_name, remarks, reported_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&report.name)
        .bind(report.age)
        .bind(&report.gender)
        .bind(&report.contact)
        .bind(&report.village)
        .bind(&report.state)
        .bind(&report.district)
        .bind(&report.symptoms)
        .bind(&report.disease)
        .bind(&report.water_source)
        .bind(&report.image_name)
        .bind(&report.remarks)
        .bind(report.reported_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn recent_reports(&self, limit: u32) -> Result<Vec<SymptomReport>> {
        // ---
        let rows: Vec<ReportRow> = sqlx::query_as(&format!(
            "SELECT {REPORT_COLUMNS} FROM symptom_reports ORDER BY reported_at DESC LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_reports(&self, village: &str, since: Option<DateTime<Utc>>) -> Result<i64> {
        // ---
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM symptom_reports
            WHERE village = $1
              AND ($2::timestamptz IS NULL OR reported_at >= $2)
            "#,
        )
        .bind(village)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_reports_mentioning(&self, village: &str, keyword: &str) -> Result<i64> {
        // ---
        // POSITION avoids having to escape LIKE wildcards in the keyword.
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM symptom_reports
            WHERE village = $1
              AND POSITION(LOWER($2) IN LOWER(symptoms)) > 0
            "#,
        )
        .bind(village)
        .bind(keyword)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_reports_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<i64> {
        // ---
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM symptom_reports WHERE reported_at >= $1 AND reported_at < $2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn villages(&self) -> Result<Vec<String>> {
        // ---
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT village FROM readings
            UNION
            SELECT village FROM symptom_reports
            ORDER BY village
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    async fn open_alert(&self, village: &str, kind: AlertKind) -> Result<Option<Alert>> {
        // ---
        let row: Option<AlertRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ALERT_COLUMNS} FROM alerts
            WHERE village = $1 AND kind = $2 AND status = 'unresolved'
            LIMIT 1
            "#
        ))
        .bind(village)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Alert::try_from).transpose()
    }

    async fn create_alert_if_none_open(&self, alert: NewAlert) -> Result<Option<Alert>> {
        // ---
        // The partial unique index `uq_alerts_open` arbitrates concurrent inserts.
        let row: Option<AlertRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO alerts (id, village, kind, message, status, triggered_at)
            VALUES ($1, $2, $3, $4, 'unresolved', $5)
            ON CONFLICT (village, kind) WHERE status = 'unresolved' DO NOTHING
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&alert.village)
        .bind(alert.kind.as_str())
        .bind(&alert.message)
        .bind(alert.triggered_at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Alert::try_from).transpose()
    }

    async fn unresolved_alerts(&self, limit: u32) -> Result<Vec<Alert>> {
        // ---
        let rows: Vec<AlertRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ALERT_COLUMNS} FROM alerts
            WHERE status = 'unresolved'
            ORDER BY triggered_at DESC, seq DESC
            LIMIT $1
            "#
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Alert::try_from).collect()
    }

    async fn resolve_alert(&self, id: Uuid) -> Result<Option<Alert>> {
        // ---
        let row: Option<AlertRow> = sqlx::query_as(&format!(
            r#"
            UPDATE alerts SET status = 'resolved'
            WHERE id = $1
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Alert::try_from).transpose()
    }
}
