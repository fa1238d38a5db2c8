//! Isolation Forest anomaly detection

use crate::anomaly::AnomalyDetector;
use crate::error::{EnvmonError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

const EULER_MASCHERONI: f64 = 0.577_215_664_9;

/// A node of an isolation tree
#[derive(Debug, Clone, Serialize, Deserialize)]
enum IsoNode {
    /// Leaf holding the number of samples that reached it
    Leaf { size: usize },
    /// Random axis-aligned split
    Split {
        feature: usize,
        threshold: f64,
        left: Box<IsoNode>,
        right: Box<IsoNode>,
    },
}

impl IsoNode {
    /// Grow a tree by recursive random splitting of the given row subset
    fn grow(
        x: &Array2<f64>,
        rows: &[usize],
        depth: usize,
        height_limit: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let n = rows.len();
        if depth >= height_limit || n <= 1 {
            return IsoNode::Leaf { size: n };
        }

        let feature = rng.gen_range(0..x.ncols());
        let values: Vec<f64> = rows.iter().map(|&i| x[[i, feature]]).collect();
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        // Constant feature in this subset: nothing left to isolate on
        if (hi - lo).abs() < 1e-12 {
            return IsoNode::Leaf { size: n };
        }

        let threshold = rng.gen_range(lo..hi);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&i| x[[i, feature]] < threshold);

        if left_rows.is_empty() || right_rows.is_empty() {
            return IsoNode::Leaf { size: n };
        }

        IsoNode::Split {
            feature,
            threshold,
            left: Box::new(Self::grow(x, &left_rows, depth + 1, height_limit, rng)),
            right: Box::new(Self::grow(x, &right_rows, depth + 1, height_limit, rng)),
        }
    }

    /// Path length from the root to the leaf a sample falls into, with the
    /// standard correction term for unresolved leaves
    fn path_length(&self, sample: &[f64], depth: usize) -> f64 {
        match self {
            IsoNode::Leaf { size } => depth as f64 + average_path_length(*size),
            IsoNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] < *threshold {
                    left.path_length(sample, depth + 1)
                } else {
                    right.path_length(sample, depth + 1)
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over n samples,
/// c(n) = 2 H(n-1) - 2(n-1)/n
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Isolation Forest outlier detector.
///
/// Fits an ensemble of randomly grown isolation trees; samples that isolate
/// in few splits score close to 1. The decision threshold is set so that the
/// configured contamination fraction of the fitting data is flagged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    n_trees: usize,
    sample_size: usize,
    contamination: f64,
    seed: Option<u64>,
    trees: Vec<IsoNode>,
    threshold: Option<f64>,
    fit_sample_size: usize,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new()
    }
}

impl IsolationForest {
    /// Create a detector with the standard ensemble size
    pub fn new() -> Self {
        Self {
            n_trees: 100,
            sample_size: 256,
            contamination: 0.1,
            seed: None,
            trees: Vec::new(),
            threshold: None,
            fit_sample_size: 0,
        }
    }

    /// Set the number of trees
    pub fn with_n_trees(mut self, n: usize) -> Self {
        self.n_trees = n.max(1);
        self
    }

    /// Set the per-tree subsample size
    pub fn with_sample_size(mut self, n: usize) -> Self {
        self.sample_size = n.max(1);
        self
    }

    /// Set the expected outlier fraction
    pub fn with_contamination(mut self, c: f64) -> Self {
        self.contamination = c.clamp(0.0, 0.5);
        self
    }

    /// Set the random seed; `None` seeds from entropy
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    fn compute_scores(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(EnvmonError::NotFitted);
        }

        let c_n = average_path_length(self.fit_sample_size);
        let scores: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let sample: Vec<f64> = row.iter().copied().collect();
                let mean_path: f64 = self
                    .trees
                    .iter()
                    .map(|tree| tree.path_length(&sample, 0))
                    .sum::<f64>()
                    / self.trees.len() as f64;
                2.0_f64.powf(-mean_path / c_n)
            })
            .collect();

        Ok(Array1::from_vec(scores))
    }
}

impl AnomalyDetector for IsolationForest {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(EnvmonError::DataError(
                "cannot fit isolation forest on an empty matrix".to_string(),
            ));
        }

        let per_tree = self.sample_size.min(n_samples);
        let height_limit = (per_tree as f64).log2().ceil() as usize;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut trees = Vec::with_capacity(self.n_trees);
        for _ in 0..self.n_trees {
            let rows: Vec<usize> = (0..per_tree)
                .map(|_| rng.gen_range(0..n_samples))
                .collect();
            trees.push(IsoNode::grow(x, &rows, 0, height_limit, &mut rng));
        }

        self.trees = trees;
        self.fit_sample_size = per_tree;

        // Threshold at the contamination quantile of the fitting scores
        let scores = self.compute_scores(x)?;
        let mut sorted: Vec<f64> = scores.to_vec();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let cut = ((self.contamination * n_samples as f64) as usize).min(n_samples - 1);
        self.threshold = Some(sorted[cut]);

        Ok(())
    }

    fn score_samples(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.compute_scores(x)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>> {
        let threshold = self.threshold.ok_or(EnvmonError::NotFitted)?;
        let scores = self.compute_scores(x)?;
        Ok(scores.mapv(|s| i32::from(s >= threshold)))
    }

    fn threshold(&self) -> f64 {
        self.threshold.unwrap_or(0.5)
    }
}
