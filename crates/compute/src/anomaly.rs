//! Residual-based anomaly detection and health scoring.
//!
//! - error[i] = |actual[i] - predicted[i]|
//! - threshold = mean(error) + sigma * std(error), population std
//! - anomalies = indices with error strictly above the threshold
//! - health = max(0, 100 - mean(error) / (max(error) + epsilon) * 100)

use serde::Serialize;
use tracing::debug;

use twin_core::{Result, TwinError};

use crate::stats::{mean, population_std};

pub const DEFAULT_ANOMALY_SIGMA: f64 = 3.0;
pub const DEFAULT_HEALTH_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringSettings {
    pub sigma: f64,
    pub epsilon: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_ANOMALY_SIGMA,
            epsilon: DEFAULT_HEALTH_EPSILON,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    /// Ascending indices into the actual/predicted series.
    pub anomaly_indices: Vec<usize>,
    /// Absolute residual per sample.
    pub error: Vec<f64>,
    /// Residual threshold used for flagging.
    pub threshold: f64,
    /// 0..=100.
    pub health: f64,
}

impl AnomalyReport {
    pub fn anomaly_count(&self) -> usize {
        self.anomaly_indices.len()
    }

    pub fn mean_error(&self) -> f64 {
        mean(&self.error)
    }

    pub fn is_anomaly(&self, index: usize) -> bool {
        self.anomaly_indices.binary_search(&index).is_ok()
    }
}

/// Score an (actual, predicted) pair of equal length.
pub fn score(actual: &[f64], predicted: &[f64], settings: &ScoringSettings) -> Result<AnomalyReport> {
    if actual.len() != predicted.len() {
        return Err(TwinError::LengthMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(TwinError::EmptySeries);
    }

    let error: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .collect();

    let mean_error = mean(&error);
    let threshold = mean_error + settings.sigma * population_std(&error);

    let anomaly_indices: Vec<usize> = error
        .iter()
        .enumerate()
        .filter(|(_, &e)| e > threshold)
        .map(|(i, _)| i)
        .collect();

    let max_error = error.iter().copied().fold(0.0, f64::max);
    let health = health_score(mean_error, max_error, settings.epsilon);

    debug!(
        samples = error.len(),
        mean_error,
        threshold,
        anomalies = anomaly_indices.len(),
        health,
        "scored residuals"
    );

    Ok(AnomalyReport {
        anomaly_indices,
        error,
        threshold,
        health,
    })
}

/// Health from mean and max residual. Uniformly zero error gives 100.
pub fn health_score(mean_error: f64, max_error: f64, epsilon: f64) -> f64 {
    (100.0 - mean_error / (max_error + epsilon) * 100.0).max(0.0)
}
