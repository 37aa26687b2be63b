//! Bottleneck autoencoder that reconstructs each normalized sample.
//!
//! Both `actual` and `predicted` stay in the normalized [0, 1] scale.

use candle_nn::{linear, loss, Activation, Module, Optimizer, Sequential};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use twin_core::{ModelKind, Result};

use super::nn::{column, fit_error, shuffled_batches, to_f64, Network};
use super::{check_epoch, validate_signal, CancelToken, ModelAdapter, ModelOutput, ModelSettings, OutputScale};
use crate::scaler::MinMaxScaler;

/// Layer widths, input to output.
pub const LAYERS: [usize; 5] = [1, 16, 8, 16, 1];

/// Dense stack over [`LAYERS`], ReLU between layers and a linear output.
fn build(net: &Network) -> candle_core::Result<Sequential> {
    let vb = net.builder();
    let mut stack = candle_nn::seq();
    for (i, pair) in LAYERS.windows(2).enumerate() {
        stack = stack.add(linear(pair[0], pair[1], vb.pp(format!("dense{i}")))?);
        if i + 2 < LAYERS.len() {
            stack = stack.add(Activation::Relu);
        }
    }
    Ok(stack)
}

#[derive(Debug, Clone)]
pub struct Autoencoder {
    epochs: usize,
    batch: usize,
    learning_rate: f64,
    seed: u64,
    cancel: CancelToken,
}

impl Autoencoder {
    pub fn new(settings: &ModelSettings, cancel: CancelToken) -> Self {
        Self {
            epochs: settings.autoencoder_epochs,
            batch: settings.autoencoder_batch.max(1),
            learning_rate: settings.learning_rate,
            seed: settings.seed,
            cancel,
        }
    }
}

impl ModelAdapter for Autoencoder {
    fn kind(&self) -> ModelKind {
        ModelKind::Reconstruction
    }

    fn uses_scaler(&self) -> bool {
        true
    }

    fn run(&self, signal: &[f64], scaler: Option<&mut MinMaxScaler>) -> Result<ModelOutput> {
        validate_signal(self.kind(), signal)?;

        let mut local = MinMaxScaler::new();
        let scaler = scaler.unwrap_or(&mut local);
        let scaled = scaler.fit_transform(signal)?;

        let kind = self.kind();
        let fail = |e| fit_error(kind, e);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let net = Network::new();
        let stack = build(&net).map_err(fail)?;
        net.reseed(&mut rng).map_err(fail)?;
        let mut optimizer = net.optimizer(self.learning_rate).map_err(fail)?;

        info!(epochs = self.epochs, samples = scaled.len(), "Training autoencoder");
        for epoch in 1..=self.epochs {
            let mut total = 0.0;
            for batch in shuffled_batches(scaled.len(), self.batch, &mut rng) {
                let values: Vec<f64> = batch.iter().map(|&k| scaled[k]).collect();
                let step = column(&values, &net.device).and_then(|x| {
                    let mse = loss::mse(&stack.forward(&x)?, &x)?;
                    optimizer.backward_step(&mse)?;
                    mse.to_scalar::<f32>()
                });
                total += f64::from(step.map_err(fail)?) * batch.len() as f64;
            }
            let loss = total / scaled.len() as f64;
            debug!(epoch, loss, "autoencoder epoch");
            check_epoch(kind, &self.cancel, epoch, loss)?;
        }

        let predicted = column(&scaled, &net.device)
            .and_then(|x| stack.forward(&x))
            .and_then(|p| to_f64(&p))
            .map_err(fail)?;
        Ok(ModelOutput {
            actual: scaled,
            predicted,
            offset: 0,
            scale: OutputScale::Normalized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twin_core::TwinError;

    fn settings(epochs: usize) -> ModelSettings {
        ModelSettings {
            autoencoder_epochs: epochs,
            autoencoder_batch: 16,
            learning_rate: 0.01,
            ..ModelSettings::default()
        }
    }

    #[test]
    fn actual_is_the_normalized_input() {
        let signal: Vec<f64> = (0..32).map(|i| 100.0 + i as f64).collect();
        let out = Autoencoder::new(&settings(2), CancelToken::new()).run(&signal, None).unwrap();
        assert_eq!(out.scale, OutputScale::Normalized);
        assert_eq!(out.actual.len(), signal.len());
        assert_eq!(out.predicted.len(), signal.len());
        assert!(out.actual.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!((out.actual[31] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn training_reduces_reconstruction_error() {
        let signal: Vec<f64> = (0..64).map(|i| (i as f64 * 0.2).sin()).collect();
        let mse = |epochs| {
            let out = Autoencoder::new(&settings(epochs), CancelToken::new())
                .run(&signal, None)
                .unwrap();
            out.actual
                .iter()
                .zip(&out.predicted)
                .map(|(a, p)| (a - p) * (a - p))
                .sum::<f64>()
                / out.len() as f64
        };
        assert!(mse(200) < mse(1));
    }

    #[test]
    fn cancellation_is_reported() {
        let token = CancelToken::new();
        token.cancel();
        let err = Autoencoder::new(&settings(30), token)
            .run(&[1.0, 2.0, 3.0], None)
            .unwrap_err();
        assert!(matches!(err, TwinError::Cancelled { epoch: 1, .. }));
    }
}
