//! Water safety classification against a single named threshold table.
//!
//! Every caller (aggregator, alert rules, disease engine) reads the same
//! [`Thresholds`] value, so a village can never be "unsafe" on one endpoint
//! and "warning" on another.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::WaterStatus;

/// Numeric boundaries for water classification.
///
/// A value equal to a boundary is inside the acceptable side: pH 6.5 is
/// acceptable, turbidity 5.0 is not a warning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    // ---
    pub ph_min: f64,
    pub ph_max: f64,
    /// NTU above which water is at least `warning`.
    pub turbidity_warning: f64,
    /// NTU above which water is `unsafe`.
    pub turbidity_unsafe: f64,
    /// ppm above which water is at least `warning`.
    pub tds_warning: f64,
    /// ppm above which water is `unsafe`.
    pub tds_unsafe: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            ph_min: 6.5,
            ph_max: 8.5,
            turbidity_warning: 5.0,
            turbidity_unsafe: 10.0,
            tds_warning: 500.0,
            tds_unsafe: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid thresholds: {0}")]
pub struct InvalidThresholds(String);

impl Thresholds {
    /// Reject tables whose bands overlap or are not finite.
    pub fn check(&self) -> Result<(), InvalidThresholds> {
        // ---
        let values = [
            self.ph_min,
            self.ph_max,
            self.turbidity_warning,
            self.turbidity_unsafe,
            self.tds_warning,
            self.tds_unsafe,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(InvalidThresholds("all thresholds must be finite".into()));
        }
        if self.ph_min >= self.ph_max {
            return Err(InvalidThresholds(format!(
                "pH range {}..{} is empty",
                self.ph_min, self.ph_max
            )));
        }
        if self.turbidity_warning > self.turbidity_unsafe {
            return Err(InvalidThresholds(format!(
                "turbidity warning {} exceeds unsafe {}",
                self.turbidity_warning, self.turbidity_unsafe
            )));
        }
        if self.tds_warning > self.tds_unsafe {
            return Err(InvalidThresholds(format!(
                "TDS warning {} exceeds unsafe {}",
                self.tds_warning, self.tds_unsafe
            )));
        }
        Ok(())
    }

    pub fn ph_out_of_range(&self, ph: f64) -> bool {
        ph < self.ph_min || ph > self.ph_max
    }

    /// Classify a sample. Any missing parameter yields [`WaterStatus::Unknown`].
    pub fn classify(
        &self,
        ph: Option<f64>,
        turbidity: Option<f64>,
        tds: Option<f64>,
    ) -> WaterStatus {
        // ---
        let (Some(ph), Some(turbidity), Some(tds)) = (ph, turbidity, tds) else {
            return WaterStatus::Unknown;
        };

        if self.ph_out_of_range(ph) || turbidity > self.turbidity_unsafe || tds > self.tds_unsafe
        {
            return WaterStatus::Unsafe;
        }

        if turbidity > self.turbidity_warning || tds > self.tds_warning {
            return WaterStatus::Warning;
        }

        WaterStatus::Safe
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn classify(ph: f64, turbidity: f64, tds: f64) -> WaterStatus {
        Thresholds::default().classify(Some(ph), Some(turbidity), Some(tds))
    }

    #[test]
    fn test_safe_inside_all_bands() {
        // ---
        for ph in [6.5, 7.0, 7.8, 8.5] {
            for turbidity in [0.0, 2.5, 5.0] {
                for tds in [0.0, 250.0, 500.0] {
                    assert_eq!(
                        classify(ph, turbidity, tds),
                        WaterStatus::Safe,
                        "pH={ph} turbidity={turbidity} tds={tds}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_ph_outside_range_is_unsafe() {
        // ---
        assert_eq!(classify(6.49, 1.0, 100.0), WaterStatus::Unsafe);
        assert_eq!(classify(8.51, 1.0, 100.0), WaterStatus::Unsafe);
    }

    #[test]
    fn test_warning_band() {
        // ---
        assert_eq!(classify(7.0, 5.1, 100.0), WaterStatus::Warning);
        assert_eq!(classify(7.0, 10.0, 100.0), WaterStatus::Warning);
        assert_eq!(classify(7.0, 1.0, 501.0), WaterStatus::Warning);
        assert_eq!(classify(7.0, 1.0, 1000.0), WaterStatus::Warning);
    }

    #[test]
    fn test_unsafe_band() {
        // ---
        assert_eq!(classify(7.0, 10.5, 100.0), WaterStatus::Unsafe);
        assert_eq!(classify(7.0, 1.0, 1000.5), WaterStatus::Unsafe);
    }

    #[test]
    fn test_missing_values_are_unknown() {
        // ---
        let t = Thresholds::default();
        assert_eq!(t.classify(None, Some(1.0), Some(1.0)), WaterStatus::Unknown);
        assert_eq!(t.classify(Some(7.0), None, Some(1.0)), WaterStatus::Unknown);
        assert_eq!(t.classify(Some(7.0), Some(1.0), None), WaterStatus::Unknown);
        assert_eq!(t.classify(None, None, None), WaterStatus::Unknown);
    }

    #[test]
    fn test_status_never_weakens_as_turbidity_rises() {
        // ---
        for ph in [5.0, 7.0, 9.0] {
            for tds in [100.0, 600.0, 1200.0] {
                let mut previous = WaterStatus::Safe;
                let mut turbidity = 0.0;
                while turbidity <= 20.0 {
                    let status = classify(ph, turbidity, tds);
                    assert!(
                        status >= previous,
                        "pH={ph} tds={tds} turbidity={turbidity}: {previous} -> {status}"
                    );
                    previous = status;
                    turbidity += 0.25;
                }
            }
        }
    }

    #[test]
    fn test_kamrup_scenario_is_unsafe() {
        // ---
        assert_eq!(classify(5.0, 12.0, 600.0), WaterStatus::Unsafe);
    }

    #[test]
    fn test_check_rejects_inverted_bands() {
        // ---
        assert!(Thresholds::default().check().is_ok());

        let inverted = Thresholds {
            tds_warning: 2000.0,
            ..Thresholds::default()
        };
        assert!(inverted.check().unwrap_err().to_string().contains("TDS"));

        let empty_ph = Thresholds {
            ph_min: 9.0,
            ..Thresholds::default()
        };
        assert!(empty_ph.check().is_err());

        let nan = Thresholds {
            turbidity_unsafe: f64::NAN,
            ..Thresholds::default()
        };
        assert!(nan.check().is_err());
    }
}
