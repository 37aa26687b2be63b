//! Model adapters that turn a fused signal into an (actual, predicted) pair.
//!
//! Every adapter implements [`ModelAdapter`]; [`Model`] is the closed set
//! the pipeline dispatches over, built from a [`ModelKind`].

pub mod autoencoder;
pub mod cancel;
pub mod forest;
pub mod linear;
mod nn;
pub mod sequence;

pub use autoencoder::Autoencoder;
pub use cancel::CancelToken;
pub use forest::RandomForest;
pub use linear::LinearTrend;
pub use sequence::SequenceModel;

use serde::Serialize;

use twin_core::config::ModelConfig;
use twin_core::{ModelKind, Result, TwinError};

use crate::scaler::MinMaxScaler;

/// Scale the output series are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputScale {
    /// Same units as the fused signal.
    Original,
    /// Min-max normalized into [0, 1].
    Normalized,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelOutput {
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
    /// Index of `actual[0]` within the fused signal.
    pub offset: usize,
    pub scale: OutputScale,
}

impl ModelOutput {
    pub fn len(&self) -> usize {
        self.actual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
    }
}

/// Hyperparameters shared by all adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub seed: u64,
    pub forest_trees: usize,
    pub window: usize,
    pub sequence_epochs: usize,
    pub sequence_hidden: usize,
    pub sequence_batch: usize,
    pub autoencoder_epochs: usize,
    pub autoencoder_batch: usize,
    pub learning_rate: f64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::from(&ModelConfig::default())
    }
}

impl From<&ModelConfig> for ModelSettings {
    fn from(config: &ModelConfig) -> Self {
        Self {
            seed: config.random_seed,
            forest_trees: config.forest_trees,
            window: config.sequence_window,
            sequence_epochs: config.sequence_epochs,
            sequence_hidden: config.sequence_hidden,
            sequence_batch: config.sequence_batch,
            autoencoder_epochs: config.autoencoder_epochs,
            autoencoder_batch: config.autoencoder_batch,
            learning_rate: config.learning_rate,
        }
    }
}

pub trait ModelAdapter {
    fn kind(&self) -> ModelKind;

    /// Whether `run` fits and uses a min-max scaler.
    fn uses_scaler(&self) -> bool;

    /// Fit on `signal` and return the in-sample (actual, predicted) pair.
    ///
    /// Adapters that normalize fit the supplied scaler so the caller can map
    /// results back; without one they use a private scaler.
    fn run(&self, signal: &[f64], scaler: Option<&mut MinMaxScaler>) -> Result<ModelOutput>;
}

/// Reject signals no adapter can fit.
pub fn validate_signal(kind: ModelKind, signal: &[f64]) -> Result<()> {
    if signal.is_empty() {
        return Err(TwinError::InsufficientData {
            model: kind.name().to_string(),
            required: 0,
            available: 0,
        });
    }
    if let Some(index) = signal.iter().position(|v| !v.is_finite()) {
        return Err(TwinError::model_fit(
            kind.name(),
            format!("non-finite sample at index {index}"),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub enum Model {
    Linear(LinearTrend),
    Forest(RandomForest),
    Sequence(SequenceModel),
    Reconstruction(Autoencoder),
}

impl Model {
    pub fn build(kind: ModelKind, settings: &ModelSettings, cancel: CancelToken) -> Self {
        match kind {
            ModelKind::Linear => Model::Linear(LinearTrend),
            ModelKind::Forest => Model::Forest(RandomForest::new(settings.forest_trees, settings.seed)),
            ModelKind::Sequence => Model::Sequence(SequenceModel::new(settings, cancel)),
            ModelKind::Reconstruction => Model::Reconstruction(Autoencoder::new(settings, cancel)),
        }
    }

    fn adapter(&self) -> &dyn ModelAdapter {
        match self {
            Model::Linear(m) => m,
            Model::Forest(m) => m,
            Model::Sequence(m) => m,
            Model::Reconstruction(m) => m,
        }
    }
}

impl ModelAdapter for Model {
    fn kind(&self) -> ModelKind {
        self.adapter().kind()
    }

    fn uses_scaler(&self) -> bool {
        self.adapter().uses_scaler()
    }

    fn run(&self, signal: &[f64], scaler: Option<&mut MinMaxScaler>) -> Result<ModelOutput> {
        self.adapter().run(signal, scaler)
    }
}

/// Train-loop outcome shared by the learned models.
pub(crate) fn check_epoch(
    kind: ModelKind,
    cancel: &CancelToken,
    epoch: usize,
    loss: f64,
) -> Result<()> {
    if !loss.is_finite() {
        return Err(TwinError::model_fit(
            kind.name(),
            format!("training diverged at epoch {epoch}"),
        ));
    }
    if cancel.is_cancelled() {
        return Err(TwinError::Cancelled {
            model: kind.name().to_string(),
            epoch,
        });
    }
    Ok(())
}
