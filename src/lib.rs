//! Water-quality and symptom surveillance for village clusters.
//!
//! Sensor readings and community symptom reports are stored through a
//! [`store::Store`], folded into per-village [`models::VillageSummary`] values
//! by [`village::Aggregator`], and turned into at most one open alert per
//! village and kind by [`alerts::Deduplicator`]. The HTTP surface lives in
//! [`routes`]; `main.rs` only wires configuration, storage and the server.

pub mod alerts;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod notify;
pub mod regions;
pub mod routes;
pub mod rules;
pub mod schema;
pub mod store;
pub mod sweep;
pub mod telemetry;
pub mod village;

pub use config::Config;
pub use error::{AppError, Result};
