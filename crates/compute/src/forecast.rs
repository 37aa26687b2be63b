//! Flat forecast over the prediction horizon.

use twin_core::ModelKind;

/// Repeat the last predicted value `horizon` times.
///
/// Models without a horizon (the reconstruction model) and empty predictions
/// produce no forecast.
pub fn flat_forecast(predicted: &[f64], kind: ModelKind, horizon: usize) -> Vec<f64> {
    if !kind.supports_horizon() {
        return Vec::new();
    }
    match predicted.last() {
        Some(&last) => vec![last; horizon],
        None => Vec::new(),
    }
}
