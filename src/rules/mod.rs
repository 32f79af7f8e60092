//! Pure risk rules: water classification and disease prediction.

pub mod disease;
mod thresholds;

pub use disease::{has_risk, predict, SymptomTally, NO_RISK, TRACKED_KEYWORDS};
pub use thresholds::{InvalidThresholds, Thresholds};
