//! Next-value prediction with an LSTM over sliding windows.
//!
//! The signal is min-max normalized, cut into windows of width `W`, and the
//! network learns to predict the value following each window. Outputs are
//! mapped back to the original scale and start at index `W`.

use candle_core::{Device, Tensor};
use candle_nn::rnn::{lstm, LSTMConfig, LSTM, RNN};
use candle_nn::{linear, loss, AdamW, Linear, Module, Optimizer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use twin_core::{ModelKind, Result, TwinError};

use super::nn::{fit_error, shuffled_batches, to_f64, Network};
use super::{check_epoch, validate_signal, CancelToken, ModelAdapter, ModelOutput, ModelSettings, OutputScale};
use crate::scaler::MinMaxScaler;

/// One-feature LSTM followed by a linear read-out of the last hidden state.
struct WindowNet {
    lstm: LSTM,
    head: Linear,
}

impl WindowNet {
    fn new(net: &Network, hidden: usize) -> candle_core::Result<Self> {
        let vb = net.builder();
        Ok(Self {
            lstm: lstm(1, hidden, LSTMConfig::default(), vb.pp("lstm"))?,
            head: linear(hidden, 1, vb.pp("head"))?,
        })
    }

    /// `(batch, window, 1)` in, `(batch, 1)` out.
    fn forward(&self, windows: &Tensor) -> candle_core::Result<Tensor> {
        let states = self.lstm.seq(windows)?;
        let last = states
            .last()
            .ok_or_else(|| candle_core::Error::Msg("empty window".into()))?;
        self.head.forward(last.h())
    }
}

fn window_tensor(scaled: &[f64], starts: &[usize], w: usize, device: &Device) -> candle_core::Result<Tensor> {
    let data: Vec<f32> = starts
        .iter()
        .flat_map(|&k| scaled[k..k + w].iter().map(|&v| v as f32))
        .collect();
    Tensor::from_vec(data, (starts.len(), w, 1), device)
}

fn target_tensor(scaled: &[f64], starts: &[usize], w: usize, device: &Device) -> candle_core::Result<Tensor> {
    let data: Vec<f32> = starts.iter().map(|&k| scaled[k + w] as f32).collect();
    Tensor::from_vec(data, (starts.len(), 1), device)
}

fn train_batch(
    model: &WindowNet,
    optimizer: &mut AdamW,
    scaled: &[f64],
    batch: &[usize],
    w: usize,
    device: &Device,
) -> candle_core::Result<f64> {
    let x = window_tensor(scaled, batch, w, device)?;
    let y = target_tensor(scaled, batch, w, device)?;
    let mse = loss::mse(&model.forward(&x)?, &y)?;
    optimizer.backward_step(&mse)?;
    Ok(f64::from(mse.to_scalar::<f32>()?))
}

#[derive(Debug, Clone)]
pub struct SequenceModel {
    window: usize,
    hidden: usize,
    epochs: usize,
    batch: usize,
    learning_rate: f64,
    seed: u64,
    cancel: CancelToken,
}

impl SequenceModel {
    pub fn new(settings: &ModelSettings, cancel: CancelToken) -> Self {
        Self {
            window: settings.window.max(1),
            hidden: settings.sequence_hidden.max(1),
            epochs: settings.sequence_epochs,
            batch: settings.sequence_batch.max(1),
            learning_rate: settings.learning_rate,
            seed: settings.seed,
            cancel,
        }
    }

    /// Train on normalized windows and return normalized next-value predictions.
    fn fit_predict(&self, scaled: &[f64]) -> Result<Vec<f64>> {
        let kind = self.kind();
        let fail = |e| fit_error(kind, e);
        let w = self.window;
        let samples = scaled.len() - w;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let net = Network::new();
        let model = WindowNet::new(&net, self.hidden).map_err(fail)?;
        net.reseed(&mut rng).map_err(fail)?;
        let mut optimizer = net.optimizer(self.learning_rate).map_err(fail)?;

        for epoch in 1..=self.epochs {
            let mut total = 0.0;
            for batch in shuffled_batches(samples, self.batch, &mut rng) {
                let batch_loss =
                    train_batch(&model, &mut optimizer, scaled, &batch, w, &net.device).map_err(fail)?;
                total += batch_loss * batch.len() as f64;
            }
            let loss = total / samples as f64;
            debug!(epoch, loss, "sequence model epoch");
            check_epoch(kind, &self.cancel, epoch, loss)?;
        }

        let starts: Vec<usize> = (0..samples).collect();
        window_tensor(scaled, &starts, w, &net.device)
            .and_then(|x| model.forward(&x))
            .and_then(|p| to_f64(&p))
            .map_err(fail)
    }
}

impl ModelAdapter for SequenceModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Sequence
    }

    fn uses_scaler(&self) -> bool {
        true
    }

    fn run(&self, signal: &[f64], scaler: Option<&mut MinMaxScaler>) -> Result<ModelOutput> {
        validate_signal(self.kind(), signal)?;
        if signal.len() <= self.window {
            return Err(TwinError::InsufficientData {
                model: self.kind().name().to_string(),
                required: self.window,
                available: signal.len(),
            });
        }

        let mut local = MinMaxScaler::new();
        let scaler = scaler.unwrap_or(&mut local);
        let scaled = scaler.fit_transform(signal)?;

        info!(
            window = self.window,
            hidden = self.hidden,
            epochs = self.epochs,
            samples = signal.len() - self.window,
            "Training sequence model"
        );
        let predicted = scaler.inverse_transform(&self.fit_predict(&scaled)?)?;

        Ok(ModelOutput {
            actual: signal[self.window..].to_vec(),
            predicted,
            offset: self.window,
            scale: OutputScale::Original,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(window: usize, epochs: usize) -> ModelSettings {
        ModelSettings {
            window,
            sequence_epochs: epochs,
            sequence_hidden: 6,
            sequence_batch: 8,
            learning_rate: 0.01,
            ..ModelSettings::default()
        }
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n).map(|i| 50.0 + 5.0 * (i as f64 * 0.4).sin()).collect()
    }

    #[test]
    fn output_is_shorter_by_window() {
        let signal = wave(40);
        let model = SequenceModel::new(&settings(10, 2), CancelToken::new());
        let out = model.run(&signal, None).unwrap();
        assert_eq!(out.actual.len(), 30);
        assert_eq!(out.predicted.len(), 30);
        assert_eq!(out.offset, 10);
        assert_eq!(out.actual, signal[10..].to_vec());
        assert!(out.predicted.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn window_must_be_shorter_than_signal() {
        let model = SequenceModel::new(&settings(10, 1), CancelToken::new());
        for n in [1, 5, 10] {
            let err = model.run(&wave(n), None).unwrap_err();
            assert!(matches!(
                err,
                TwinError::InsufficientData { required: 10, available, .. } if available == n
            ));
        }
        assert_eq!(model.run(&wave(11), None).unwrap().len(), 1);
    }

    #[test]
    fn seeded_runs_agree() {
        let signal = wave(30);
        let a = SequenceModel::new(&settings(5, 2), CancelToken::new()).run(&signal, None).unwrap();
        let b = SequenceModel::new(&settings(5, 2), CancelToken::new()).run(&signal, None).unwrap();
        assert_eq!(a.predicted, b.predicted);
    }

    #[test]
    fn supplied_scaler_is_fitted() {
        let mut scaler = MinMaxScaler::new();
        let model = SequenceModel::new(&settings(5, 1), CancelToken::new());
        model.run(&wave(20), Some(&mut scaler)).unwrap();
        assert!(scaler.is_fitted());
    }

    #[test]
    fn cancelled_token_stops_after_first_epoch() {
        let token = CancelToken::new();
        token.cancel();
        let model = SequenceModel::new(&settings(5, 10), token);
        let err = model.run(&wave(20), None).unwrap_err();
        assert!(matches!(err, TwinError::Cancelled { epoch: 1, .. }));
    }

    #[test]
    fn constant_signal_does_not_fail() {
        let model = SequenceModel::new(&settings(4, 2), CancelToken::new());
        let out = model.run(&[3.0; 12], None).unwrap();
        assert_eq!(out.predicted.len(), 8);
        assert!(out.predicted.iter().all(|p| p.is_finite()));
    }
}
