use serde::{Deserialize, Serialize};

use twin_core::{Result, StatusLevel, TwinError};

/// Width of the warning band above the health threshold.
pub const WARNING_BAND: f64 = 10.0;

/// Operator-chosen limits for status classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusThresholds {
    /// Health below this is Critical.
    pub health_threshold: f64,
    /// More anomalies than this is Critical.
    pub anomaly_limit: usize,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            health_threshold: 75.0,
            anomaly_limit: 10,
        }
    }
}

impl StatusThresholds {
    /// Health threshold within 0..=100 (NaN rejected) and a limit of at least one.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.health_threshold) {
            return Err(TwinError::Config(format!(
                "health threshold must be within 0..=100, got {}",
                self.health_threshold
            )));
        }
        if self.anomaly_limit == 0 {
            return Err(TwinError::Config("anomaly limit must be at least 1".into()));
        }
        Ok(())
    }
}

/// Classify a scored run. Critical takes precedence over Warning.
pub fn classify(health: f64, anomaly_count: usize, thresholds: &StatusThresholds) -> StatusLevel {
    if health < thresholds.health_threshold || anomaly_count > thresholds.anomaly_limit {
        StatusLevel::Critical
    } else if health < thresholds.health_threshold + WARNING_BAND {
        StatusLevel::Warning
    } else {
        StatusLevel::Healthy
    }
}
