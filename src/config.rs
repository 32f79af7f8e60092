//! Configuration loader for the `aarogya-sentinel` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Risk thresholds, symptom windows and coordinate
//! fallbacks live here too so every call site reads one table instead of
//! carrying its own constants.
use std::env;
use std::net::SocketAddr;

use anyhow::{anyhow, Result};
use chrono::Duration;

use crate::rules::Thresholds;
use crate::village::CoordinateTable;

/// Parse an optional environment variable into `$ty`, falling back to a default.
macro_rules! parse_env {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        parse_env_opt!($lookup, $var_name, $ty).unwrap_or($default)
    };
}

/// Parse an optional environment variable into `Option<$ty>`.
macro_rules! parse_env_opt {
    ($lookup:expr, $var_name:expr, $ty:ty) => {
        $lookup($var_name)
            .filter(|v: &String| !v.trim().is_empty())
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
    };
}

/// Which `Store` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self> {
        // ---
        match value.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StorageBackend::Postgres),
            "memory" | "mem" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("Invalid STORAGE_BACKEND: '{}'", other)),
        }
    }
}

/// Symptom-report look-back windows. `None` means unwindowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymptomWindows {
    /// Window counted by the outbreak alert rule.
    pub alert: Option<Duration>,
    /// Window shown on the dashboard.
    pub dashboard: Option<Duration>,
    /// Window reported by the summary API.
    pub summary: Option<Duration>,
}

impl Default for SymptomWindows {
    fn default() -> Self {
        Self {
            alert: Some(Duration::days(2)),
            dashboard: Some(Duration::days(7)),
            summary: None,
        }
    }
}

/// Everything the classifier, rule engine, aggregator and alert rules read.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    // ---
    pub thresholds: Thresholds,
    /// Keyword tally must exceed this before a symptom-driven disease is predicted.
    pub symptom_keyword_limit: i64,
    /// Alert-window report count at which unsafe water becomes an outbreak risk.
    pub outbreak_min_reports: i64,
    pub windows: SymptomWindows,
    pub coordinates: CoordinateTable,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            symptom_keyword_limit: 5,
            outbreak_min_reports: 3,
            windows: SymptomWindows::default(),
            coordinates: CoordinateTable::default(),
        }
    }
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    pub storage: StorageBackend,

    /// PostgreSQL connection string. Required for the postgres backend.
    pub db_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    pub bind_addr: SocketAddr,

    /// Number of unresolved alerts returned by the alert and dashboard APIs.
    pub alerts_limit: u32,

    /// Recipient handed to the notifier for every newly created alert.
    pub notify_recipient: String,

    pub risk: RiskConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Memory,
            db_url: None,
            db_pool_max: 5,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            alerts_limit: 20,
            notify_recipient: "ADMIN_NUMBER".to_string(),
            risk: RiskConfig::default(),
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string (postgres backend only)
///
/// Optional:
/// - `STORAGE_BACKEND` – `postgres` (default) or `memory`
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `BIND_ADDR` – listen address (default: `0.0.0.0:8080`)
/// - `ALERTS_LIMIT` – alerts returned by list endpoints (default: 20)
/// - `NOTIFY_RECIPIENT` – notification target (default: `ADMIN_NUMBER`)
/// - `ALERT_WINDOW_DAYS` / `DASHBOARD_WINDOW_DAYS` / `SUMMARY_WINDOW_DAYS`
/// - `OUTBREAK_MIN_REPORTS`, `SYMPTOM_KEYWORD_LIMIT`
/// - `PH_MIN`, `PH_MAX`, `TURBIDITY_WARNING`, `TURBIDITY_UNSAFE`,
///   `TDS_WARNING`, `TDS_UNSAFE`
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    load_with(|key| env::var(key).ok())
}

/// Same as [`load_from_env`] but reads values through `lookup`.
pub fn load_with<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let defaults = Config::default();
    let risk_defaults = RiskConfig::default();
    let window_defaults = SymptomWindows::default();
    let threshold_defaults = Thresholds::default();

    let storage = match lookup("STORAGE_BACKEND") {
        Some(v) if !v.trim().is_empty() => StorageBackend::parse(v.trim())?,
        _ => StorageBackend::Postgres,
    };

    let db_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
    if storage == StorageBackend::Postgres && db_url.is_none() {
        return Err(anyhow!("DATABASE_URL must be set in .env or environment"));
    }

    let days = |v: Option<u32>| v.map(|d| Duration::days(i64::from(d)));
    let windows = SymptomWindows {
        alert: days(parse_env_opt!(lookup, "ALERT_WINDOW_DAYS", u32)).or(window_defaults.alert),
        dashboard: days(parse_env_opt!(lookup, "DASHBOARD_WINDOW_DAYS", u32))
            .or(window_defaults.dashboard),
        summary: days(parse_env_opt!(lookup, "SUMMARY_WINDOW_DAYS", u32))
            .or(window_defaults.summary),
    };

    let thresholds = Thresholds {
        ph_min: parse_env!(lookup, "PH_MIN", f64, threshold_defaults.ph_min),
        ph_max: parse_env!(lookup, "PH_MAX", f64, threshold_defaults.ph_max),
        turbidity_warning: parse_env!(
            lookup,
            "TURBIDITY_WARNING",
            f64,
            threshold_defaults.turbidity_warning
        ),
        turbidity_unsafe: parse_env!(
            lookup,
            "TURBIDITY_UNSAFE",
            f64,
            threshold_defaults.turbidity_unsafe
        ),
        tds_warning: parse_env!(lookup, "TDS_WARNING", f64, threshold_defaults.tds_warning),
        tds_unsafe: parse_env!(lookup, "TDS_UNSAFE", f64, threshold_defaults.tds_unsafe),
    };
    thresholds.check()?;

    let bind_addr = match lookup("BIND_ADDR") {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| anyhow!("Invalid BIND_ADDR: {}", e))?,
        _ => defaults.bind_addr,
    };

    Ok(Config {
        storage,
        db_url,
        db_pool_max: parse_env!(lookup, "DB_POOL_MAX", u32, defaults.db_pool_max),
        bind_addr,
        alerts_limit: parse_env!(lookup, "ALERTS_LIMIT", u32, defaults.alerts_limit),
        notify_recipient: lookup("NOTIFY_RECIPIENT")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.notify_recipient),
        risk: RiskConfig {
            thresholds,
            symptom_keyword_limit: parse_env!(
                lookup,
                "SYMPTOM_KEYWORD_LIMIT",
                i64,
                risk_defaults.symptom_keyword_limit
            ),
            outbreak_min_reports: parse_env!(
                lookup,
                "OUTBREAK_MIN_REPORTS",
                i64,
                risk_defaults.outbreak_min_reports
            ),
            windows,
            coordinates: risk_defaults.coordinates,
        },
    })
}

/// Replace the password portion of a connection string with `****`.
pub fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            // a colon before `//` belongs to the scheme, not a password
            if db_url[..colon_pos].contains("//") {
                return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
            }
        }
    }
    db_url.to_string()
}

fn describe_window(window: Option<Duration>) -> String {
    match window {
        Some(w) => format!("{} days", w.num_days()),
        None => "unwindowed".to_string(),
    }
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database password while showing all configuration values
    /// that were loaded.
    pub fn log_config(&self) {
        // ---
        let masked_db_url = self
            .db_url
            .as_deref()
            .map(mask_db_url)
            .unwrap_or_else(|| "<unset>".to_string());
        let t = &self.risk.thresholds;

        tracing::info!("Configuration loaded:");
        tracing::info!("  STORAGE_BACKEND      : {:?}", self.storage);
        tracing::info!("  DATABASE_URL         : {}", masked_db_url);
        tracing::info!("  DB_POOL_MAX          : {}", self.db_pool_max);
        tracing::info!("  BIND_ADDR            : {}", self.bind_addr);
        tracing::info!("  ALERTS_LIMIT         : {}", self.alerts_limit);
        tracing::info!("  NOTIFY_RECIPIENT     : {}", self.notify_recipient);
        tracing::info!("  ALERT_WINDOW         : {}", describe_window(self.risk.windows.alert));
        tracing::info!("  DASHBOARD_WINDOW     : {}", describe_window(self.risk.windows.dashboard));
        tracing::info!("  SUMMARY_WINDOW       : {}", describe_window(self.risk.windows.summary));
        tracing::info!("  OUTBREAK_MIN_REPORTS : {}", self.risk.outbreak_min_reports);
        tracing::info!("  SYMPTOM_KEYWORD_LIMIT: {}", self.risk.symptom_keyword_limit);
        tracing::info!(
            "  THRESHOLDS           : pH {}..{}, turbidity {}/{}, TDS {}/{}",
            t.ph_min,
            t.ph_max,
            t.turbidity_warning,
            t.turbidity_unsafe,
            t.tds_warning,
            t.tds_unsafe
        );
    }
}

#[cfg(test)]
mod tests {
    // ---
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_postgres_backend_requires_database_url() {
        // ---
        let err = load_with(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_memory_backend_defaults() {
        // ---
        let cfg = load_with(lookup_from(&[("STORAGE_BACKEND", "memory")])).unwrap();

        assert_eq!(cfg.storage, StorageBackend::Memory);
        assert_eq!(cfg.db_pool_max, 5);
        assert_eq!(cfg.alerts_limit, 20);
        assert_eq!(cfg.risk, RiskConfig::default());
        assert_eq!(cfg.risk.windows.alert, Some(Duration::days(2)));
        assert_eq!(cfg.risk.windows.dashboard, Some(Duration::days(7)));
        assert_eq!(cfg.risk.windows.summary, None);
    }

    #[test]
    fn test_overrides_are_applied() {
        // ---
        let cfg = load_with(lookup_from(&[
            ("DATABASE_URL", "postgres://u:p@localhost/db"),
            ("DB_POOL_MAX", "12"),
            ("SUMMARY_WINDOW_DAYS", "30"),
            ("TURBIDITY_UNSAFE", "8"),
            ("TDS_UNSAFE", "700"),
            ("BIND_ADDR", "127.0.0.1:9000"),
        ]))
        .unwrap();

        assert_eq!(cfg.storage, StorageBackend::Postgres);
        assert_eq!(cfg.db_pool_max, 12);
        assert_eq!(cfg.risk.windows.summary, Some(Duration::days(30)));
        assert_eq!(cfg.risk.thresholds.turbidity_unsafe, 8.0);
        assert_eq!(cfg.risk.thresholds.tds_unsafe, 700.0);
        assert_eq!(cfg.bind_addr.port(), 9000);
    }

    #[test]
    fn test_invalid_numbers_are_reported() {
        // ---
        let err = load_with(lookup_from(&[
            ("STORAGE_BACKEND", "memory"),
            ("DB_POOL_MAX", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().starts_with("Invalid DB_POOL_MAX"));
    }

    #[test]
    fn test_inverted_thresholds_are_rejected() {
        // ---
        let err = load_with(lookup_from(&[
            ("STORAGE_BACKEND", "memory"),
            ("TDS_WARNING", "2000"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("TDS"));
    }

    #[test]
    fn test_mask_db_url() {
        // ---
        assert_eq!(
            mask_db_url("postgres://app:secret@db:5432/aarogya"),
            "postgres://app:****@db:5432/aarogya"
        );
        assert_eq!(
            mask_db_url("postgres://db:5432/aarogya"),
            "postgres://db:5432/aarogya"
        );
    }
}
