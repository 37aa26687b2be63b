//! Min-max normalization into [0, 1].

use tracing::warn;

use twin_core::{Result, TwinError};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fitted {
    min: f64,
    /// Reciprocal of the data range; 1.0 when the range is zero.
    scale: f64,
}

/// Maps a signal onto [0, 1] using its own minimum and maximum.
///
/// A constant signal has zero range; it is scaled by 1.0 instead so every
/// value maps to 0.0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinMaxScaler {
    fitted: Option<Fitted>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn fit(&mut self, values: &[f64]) -> Result<()> {
        if values.is_empty() {
            return Err(TwinError::EmptySeries);
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        let scale = if range > 0.0 {
            1.0 / range
        } else {
            warn!(value = min, samples = values.len(), "constant signal, scaling by 1");
            1.0
        };
        self.fitted = Some(Fitted { min, scale });
        Ok(())
    }

    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        let f = self.state()?;
        Ok(values.iter().map(|v| (v - f.min) * f.scale).collect())
    }

    pub fn fit_transform(&mut self, values: &[f64]) -> Result<Vec<f64>> {
        self.fit(values)?;
        self.transform(values)
    }

    pub fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        let f = self.state()?;
        Ok(values.iter().map(|v| v / f.scale + f.min).collect())
    }

    fn state(&self) -> Result<Fitted> {
        self.fitted
            .ok_or_else(|| TwinError::model_fit("MinMaxScaler", "scaler used before fit"))
    }
}
