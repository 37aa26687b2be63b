use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TwinError;

/// The four predictive models the pipeline can fit.
///
/// Closed set: adding a model is a compile-time-checked change to every `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "Linear Regression")]
    Linear,
    #[serde(rename = "Random Forest")]
    Forest,
    #[serde(rename = "LSTM")]
    Sequence,
    #[serde(rename = "Autoencoder")]
    Reconstruction,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Linear,
        ModelKind::Forest,
        ModelKind::Sequence,
        ModelKind::Reconstruction,
    ];

    /// Display name used in reports and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Linear => "Linear Regression",
            ModelKind::Forest => "Random Forest",
            ModelKind::Sequence => "LSTM",
            ModelKind::Reconstruction => "Autoencoder",
        }
    }

    /// Whether the model's predictions can be extended over a forecast horizon.
    pub fn supports_horizon(&self) -> bool {
        !matches!(self, ModelKind::Reconstruction)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = TwinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linear" | "linear regression" | "linear-regression" => Ok(ModelKind::Linear),
            "forest" | "random forest" | "random-forest" => Ok(ModelKind::Forest),
            "lstm" | "sequence" => Ok(ModelKind::Sequence),
            "autoencoder" | "reconstruction" => Ok(ModelKind::Reconstruction),
            other => Err(TwinError::Config(format!("unknown model: {other}"))),
        }
    }
}

/// Discrete system status derived from health and anomaly count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusLevel {
    Healthy,
    Warning,
    Critical,
}

impl StatusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLevel::Healthy => "Healthy",
            StatusLevel::Warning => "Warning",
            StatusLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
