//! Bagged regression trees on the time-index feature.
//!
//! Each tree sees a bootstrap resample of the samples (drawn from its own
//! `seed + tree_index` stream) and is grown until every leaf is pure. The
//! prediction is the mean over trees. Trees are fitted in parallel; seeding
//! per tree keeps the result identical regardless of thread scheduling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use twin_core::{ModelKind, Result};

use super::{validate_signal, ModelAdapter, ModelOutput, OutputScale};
use crate::scaler::MinMaxScaler;

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: usize,
    seed: u64,
}

impl RandomForest {
    pub fn new(trees: usize, seed: u64) -> Self {
        Self {
            trees: trees.max(1),
            seed,
        }
    }

    /// Fit every tree and return the in-sample ensemble prediction.
    pub fn fit_predict(&self, signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        let per_tree: Vec<Vec<f64>> = (0..self.trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(t as u64));
                let counts = bootstrap_counts(n, &mut rng);
                let tree = RegressionTree::fit(signal, &counts);
                (0..n).map(|i| tree.predict(i as f64)).collect()
            })
            .collect();

        let k = per_tree.len() as f64;
        (0..n)
            .map(|i| per_tree.iter().map(|p| p[i]).sum::<f64>() / k)
            .collect()
    }
}

impl ModelAdapter for RandomForest {
    fn kind(&self) -> ModelKind {
        ModelKind::Forest
    }

    fn uses_scaler(&self) -> bool {
        false
    }

    fn run(&self, signal: &[f64], _scaler: Option<&mut MinMaxScaler>) -> Result<ModelOutput> {
        validate_signal(self.kind(), signal)?;
        let predicted = self.fit_predict(signal);
        debug!(trees = self.trees, seed = self.seed, samples = signal.len(), "forest fitted");

        Ok(ModelOutput {
            actual: signal.to_vec(),
            predicted,
            offset: 0,
            scale: OutputScale::Original,
        })
    }
}

/// How many times each index was drawn in an `n`-of-`n` resample.
fn bootstrap_counts<R: Rng>(n: usize, rng: &mut R) -> Vec<u32> {
    let mut counts = vec![0u32; n];
    for _ in 0..n {
        counts[rng.gen_range(0..n)] += 1;
    }
    counts
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// CART regression tree over a single feature, grown to purity.
#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// `weights[i]` is the multiplicity of sample `(i, values[i])`; zero
    /// weights are out-of-bag and ignored.
    fn fit(values: &[f64], weights: &[u32]) -> Self {
        let points: Vec<(f64, f64, f64)> = values
            .iter()
            .zip(weights)
            .enumerate()
            .filter(|(_, (_, &w))| w > 0)
            .map(|(i, (&y, &w))| (i as f64, y, w as f64))
            .collect();

        let total_w: f64 = points.iter().map(|p| p.2).sum();
        let center = points.iter().map(|p| p.1 * p.2).sum::<f64>() / total_w;

        // Prefix sums of w, w*y, w*y^2 with y centered to limit cancellation.
        let mut pw = vec![0.0; points.len() + 1];
        let mut py = vec![0.0; points.len() + 1];
        let mut py2 = vec![0.0; points.len() + 1];
        for (k, &(_, y, w)) in points.iter().enumerate() {
            let yc = y - center;
            pw[k + 1] = pw[k] + w;
            py[k + 1] = py[k] + w * yc;
            py2[k + 1] = py2[k] + w * yc * yc;
        }
        let sse = |a: usize, b: usize| {
            let w = pw[b] - pw[a];
            let s = py[b] - py[a];
            (py2[b] - py2[a]) - s * s / w
        };
        let leaf = |a: usize, b: usize| center + (py[b] - py[a]) / (pw[b] - pw[a]);

        let mut nodes = vec![Node::Leaf(0.0)];
        let mut stack = vec![(0usize, 0usize, points.len())];

        while let Some((slot, a, b)) = stack.pop() {
            let first = points[a].1;
            let pure = points[a..b].iter().all(|p| p.1 == first);
            if b - a < 2 || pure {
                nodes[slot] = Node::Leaf(leaf(a, b));
                continue;
            }

            let mut best = (a + 1, f64::INFINITY);
            for k in a + 1..b {
                let cost = sse(a, k) + sse(k, b);
                if cost < best.1 {
                    best = (k, cost);
                }
            }
            let k = best.0;

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf(0.0));
            nodes.push(Node::Leaf(0.0));
            nodes[slot] = Node::Split {
                threshold: (points[k - 1].0 + points[k].0) / 2.0,
                left,
                right,
            };
            stack.push((left, a, k));
            stack.push((right, k, b));
        }

        Self { nodes }
    }

    fn predict(&self, x: f64) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf(value) => return value,
                Node::Split {
                    threshold,
                    left,
                    right,
                } => index = if x <= threshold { left } else { right },
            }
        }
    }
}
