use tracing::debug;

use twin_core::{ModelKind, Result};

use super::{validate_signal, ModelAdapter, ModelOutput, OutputScale};
use crate::scaler::MinMaxScaler;

/// Ordinary least squares fit of the signal against its time index.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearTrend;

/// Slope and intercept of the OLS line through `(i, values[i])`.
///
/// A single sample gives a flat line through it.
pub fn fit_line(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;

    let (sxy, sxx) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sxy, sxx), (i, &y)| {
            let dx = i as f64 - x_mean;
            (sxy + dx * (y - y_mean), sxx + dx * dx)
        });

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    (slope, y_mean - slope * x_mean)
}

impl ModelAdapter for LinearTrend {
    fn kind(&self) -> ModelKind {
        ModelKind::Linear
    }

    fn uses_scaler(&self) -> bool {
        false
    }

    fn run(&self, signal: &[f64], _scaler: Option<&mut MinMaxScaler>) -> Result<ModelOutput> {
        validate_signal(self.kind(), signal)?;
        let (slope, intercept) = fit_line(signal);
        debug!(slope, intercept, samples = signal.len(), "linear trend fitted");

        Ok(ModelOutput {
            actual: signal.to_vec(),
            predicted: (0..signal.len())
                .map(|i| intercept + slope * i as f64)
                .collect(),
            offset: 0,
            scale: OutputScale::Original,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_line() {
        let signal: Vec<f64> = (0..20).map(|i| 3.0 + 0.5 * i as f64).collect();
        let out = LinearTrend.run(&signal, None).unwrap();
        assert_eq!(out.actual, signal);
        for (p, a) in out.predicted.iter().zip(&signal) {
            assert!((p - a).abs() < 1e-9);
        }
    }

    #[test]
    fn single_sample_is_flat() {
        let out = LinearTrend.run(&[4.2], None).unwrap();
        assert_eq!(out.predicted, vec![4.2]);
        assert_eq!(out.offset, 0);
    }

    #[test]
    fn constant_signal_predicts_constant() {
        let out = LinearTrend.run(&[5.0; 8], None).unwrap();
        assert!(out.predicted.iter().all(|&p| (p - 5.0).abs() < 1e-12));
    }

    #[test]
    fn lengths_match_input() {
        let signal = [1.0, 4.0, 2.0, 8.0, 5.0];
        let out = LinearTrend.run(&signal, None).unwrap();
        assert_eq!(out.actual.len(), signal.len());
        assert_eq!(out.predicted.len(), signal.len());
    }
}
