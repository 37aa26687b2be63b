//! Candle plumbing shared by the learned models.
//!
//! Layers are built through a [`VarMap`], then re-initialized from a seeded
//! rng so two fits with the same seed train the same network.

use candle_core::{DType, Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use twin_core::{ModelKind, TwinError};

pub(crate) const DTYPE: DType = DType::F32;

/// Variables plus the builder layers are created from.
pub(crate) struct Network {
    pub varmap: VarMap,
    pub device: Device,
}

impl Network {
    pub fn new() -> Self {
        Self {
            varmap: VarMap::new(),
            device: Device::Cpu,
        }
    }

    pub fn builder(&self) -> VarBuilder<'_> {
        VarBuilder::from_varmap(&self.varmap, DTYPE, &self.device)
    }

    /// Glorot-uniform weights and zero biases, drawn in variable-name order.
    /// LSTM input biases start with the forget gate at one.
    pub fn reseed(&self, rng: &mut StdRng) -> candle_core::Result<()> {
        let vars = self
            .varmap
            .data()
            .lock()
            .map_err(|_| candle_core::Error::Msg("variable map lock poisoned".into()))?;
        let mut names: Vec<&String> = vars.keys().collect();
        names.sort();

        for name in names {
            let var = &vars[name];
            let dims = var.dims().to_vec();
            let values: Vec<f32> = match dims.as_slice() {
                [rows, cols] => {
                    let bound = (6.0 / (rows + cols) as f64).sqrt();
                    (0..rows * cols)
                        .map(|_| rng.gen_range(-bound..bound) as f32)
                        .collect()
                }
                [len] if name.contains("bias_ih") => {
                    let hidden = len / 4;
                    (0..*len)
                        .map(|i| if (hidden..2 * hidden).contains(&i) { 1.0 } else { 0.0 })
                        .collect()
                }
                _ => vec![0.0; var.elem_count()],
            };
            var.set(&Tensor::from_vec(values, dims, &self.device)?)?;
        }
        Ok(())
    }

    /// Adam over every variable (AdamW with no weight decay).
    pub fn optimizer(&self, learning_rate: f64) -> candle_core::Result<AdamW> {
        AdamW::new(
            self.varmap.all_vars(),
            ParamsAdamW {
                lr: learning_rate,
                eps: 1e-7,
                weight_decay: 0.0,
                ..ParamsAdamW::default()
            },
        )
    }
}

pub(crate) fn fit_error(kind: ModelKind, e: candle_core::Error) -> TwinError {
    TwinError::model_fit(kind.name(), e.to_string())
}

/// Shuffle `0..n` and cut it into mini-batches of at most `batch` indices.
pub(crate) fn shuffled_batches(n: usize, batch: usize, rng: &mut StdRng) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);
    order.chunks(batch.max(1)).map(<[usize]>::to_vec).collect()
}

/// Column tensor `(len, 1)` from f64 samples.
pub(crate) fn column(values: &[f64], device: &Device) -> candle_core::Result<Tensor> {
    let data: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    Tensor::from_vec(data, (values.len(), 1), device)
}

pub(crate) fn to_f64(t: &Tensor) -> candle_core::Result<Vec<f64>> {
    Ok(t.flatten_all()?
        .to_vec1::<f32>()?
        .into_iter()
        .map(f64::from)
        .collect())
}
