//! Data models for readings, symptom reports, alerts and derived village summaries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---

/// A single persisted water-quality measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    // ---
    pub id: Uuid,
    pub village: String,
    pub ph: f64,
    pub turbidity: f64,
    pub tds: f64,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// A reading that has passed validation but has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    // ---
    pub village: String,
    pub ph: f64,
    pub turbidity: f64,
    pub tds: f64,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl NewReading {
    pub fn into_reading(self, id: Uuid) -> Reading {
        // ---
        Reading {
            id,
            village: self.village,
            ph: self.ph,
            turbidity: self.turbidity,
            tds: self.tds,
            lat: self.lat,
            lng: self.lng,
            timestamp: self.timestamp,
        }
    }
}

/// A field worker's symptom report. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomReport {
    // ---
    pub id: Uuid,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: String,
    pub contact: Option<String>,
    pub village: String,
    pub state: String,
    pub district: String,
    pub symptoms: String,
    pub disease: Option<String>,
    pub water_source: String,
    pub image_name: Option<String>,
    pub remarks: Option<String>,
    pub reported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSymptomReport {
    // ---
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: String,
    pub contact: Option<String>,
    pub village: String,
    pub state: String,
    pub district: String,
    pub symptoms: String,
    pub disease: Option<String>,
    pub water_source: String,
    pub image_name: Option<String>,
    pub remarks: Option<String>,
    pub reported_at: DateTime<Utc>,
}

impl NewSymptomReport {
    pub fn into_report(self, id: Uuid) -> SymptomReport {
        // ---
        SymptomReport {
            id,
            name: self.name,
            age: self.age,
            gender: self.gender,
            contact: self.contact,
            village: self.village,
            state: self.state,
            district: self.district,
            symptoms: self.symptoms,
            disease: self.disease,
            water_source: self.water_source,
            image_name: self.image_name,
            remarks: self.remarks,
            reported_at: self.reported_at,
        }
    }
}

/// Alert category. Deduplication is keyed on `(village, kind)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Water,
    Disease,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::Water => "water",
            AlertKind::Disease => "disease",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Unresolved,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertStatus::Unresolved => "unresolved",
            AlertStatus::Resolved => "resolved",
        }
    }
}

/// Error returned when a stored enum column holds an unexpected value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind} value '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl FromStr for AlertKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "water" => Ok(AlertKind::Water),
            "disease" => Ok(AlertKind::Disease),
            other => Err(ParseEnumError {
                kind: "alert kind",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for AlertStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unresolved" => Ok(AlertStatus::Unresolved),
            "resolved" => Ok(AlertStatus::Resolved),
            other => Err(ParseEnumError {
                kind: "alert status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    // ---
    pub id: Uuid,
    pub village: String,
    #[serde(rename = "alert_type")]
    pub kind: AlertKind,
    pub message: String,
    pub status: AlertStatus,
    pub triggered_at: DateTime<Utc>,
}

/// Alert content produced by a rule, before the deduplicator decides whether to store it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    // ---
    pub village: String,
    pub kind: AlertKind,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
}

impl NewAlert {
    /// New alerts always start unresolved.
    pub fn into_alert(self, id: Uuid) -> Alert {
        // ---
        Alert {
            id,
            village: self.village,
            kind: self.kind,
            message: self.message,
            status: AlertStatus::Unresolved,
            triggered_at: self.triggered_at,
        }
    }
}

/// Water safety classification, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterStatus {
    Unknown,
    Safe,
    Warning,
    Unsafe,
}

impl WaterStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WaterStatus::Unknown => "unknown",
            WaterStatus::Safe => "safe",
            WaterStatus::Warning => "warning",
            WaterStatus::Unsafe => "unsafe",
        }
    }

    /// True for statuses that should raise a water alert.
    pub fn is_alarming(self) -> bool {
        matches!(self, WaterStatus::Warning | WaterStatus::Unsafe)
    }
}

impl fmt::Display for WaterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived, never persisted, per-village view served by the summary and dashboard APIs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VillageSummary {
    // ---
    pub village: String,
    pub lat: f64,
    pub lng: f64,
    pub ph: Option<f64>,
    pub turbidity: Option<f64>,
    pub tds: Option<f64>,
    pub symptom_count: i64,
    pub status: WaterStatus,
    pub predicted_disease: Vec<String>,
}
