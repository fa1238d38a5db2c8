//! Gradient-boosted tree classification
//!
//! Binary classifier built from sequentially fitted regression trees on the
//! logistic loss, using second-order (gradient + hessian) split scoring:
//! leaf value w* = -G / (H + lambda), split gain
//! 0.5 * [GL²/(HL+λ) + GR²/(HR+λ) - (GL+GR)²/(HL+HR+λ)] - γ.

use crate::error::{EnvmonError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Boosting hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostingConfig {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Minimum hessian sum per child
    pub min_child_weight: f64,
    /// L2 regularization on leaf values
    pub reg_lambda: f64,
    /// Minimum loss reduction to keep a split
    pub gamma: f64,
    /// Row subsample ratio per round
    pub subsample: f64,
    /// Feature subsample ratio per round
    pub colsample: f64,
    pub seed: Option<u64>,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            learning_rate: 0.3,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            gamma: 0.0,
            subsample: 1.0,
            colsample: 1.0,
            seed: Some(42),
        }
    }
}

/// A node of one boosted tree
#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Branch {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn output(&self, sample: &[f64]) -> f64 {
        match self {
            Node::Leaf { value } => *value,
            Node::Branch {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] <= *threshold {
                    left.output(sample)
                } else {
                    right.output(sample)
                }
            }
        }
    }
}

/// Best split found for one feature: (threshold, gain)
type SplitCandidate = (usize, f64, f64);

fn leaf_value(g_sum: f64, h_sum: f64, lambda: f64) -> f64 {
    -g_sum / (h_sum + lambda)
}

/// Exact greedy scan over one feature's sorted values
fn best_split_for_feature(
    x: &Array2<f64>,
    grad: &Array1<f64>,
    hess: &Array1<f64>,
    rows: &[usize],
    feature: usize,
    config: &BoostingConfig,
) -> Option<SplitCandidate> {
    let mut sorted: Vec<usize> = rows.to_vec();
    sorted.sort_by(|&a, &b| {
        x[[a, feature]]
            .partial_cmp(&x[[b, feature]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let g_total: f64 = sorted.iter().map(|&i| grad[i]).sum();
    let h_total: f64 = sorted.iter().map(|&i| hess[i]).sum();
    let lambda = config.reg_lambda;
    let parent_score = (g_total * g_total) / (h_total + lambda);

    let mut g_left = 0.0;
    let mut h_left = 0.0;
    let mut best: Option<(f64, f64)> = None;

    for (pos, &idx) in sorted.iter().enumerate() {
        g_left += grad[idx];
        h_left += hess[idx];

        let Some(&next_idx) = sorted.get(pos + 1) else {
            break;
        };
        // Identical adjacent values cannot separate
        if (x[[idx, feature]] - x[[next_idx, feature]]).abs() < 1e-12 {
            continue;
        }

        let g_right = g_total - g_left;
        let h_right = h_total - h_left;
        if h_left < config.min_child_weight || h_right < config.min_child_weight {
            continue;
        }

        let gain = 0.5
            * ((g_left * g_left) / (h_left + lambda)
                + (g_right * g_right) / (h_right + lambda)
                - parent_score);

        if best.map_or(true, |(_, g)| gain > g) {
            let threshold = (x[[idx, feature]] + x[[next_idx, feature]]) / 2.0;
            best = Some((threshold, gain));
        }
    }

    best.map(|(threshold, gain)| (feature, threshold, gain))
}

fn grow_tree(
    x: &Array2<f64>,
    grad: &Array1<f64>,
    hess: &Array1<f64>,
    rows: &[usize],
    features: &[usize],
    depth: usize,
    config: &BoostingConfig,
) -> Node {
    let g_sum: f64 = rows.iter().map(|&i| grad[i]).sum();
    let h_sum: f64 = rows.iter().map(|&i| hess[i]).sum();
    let leaf = Node::Leaf {
        value: leaf_value(g_sum, h_sum, config.reg_lambda),
    };

    if depth >= config.max_depth || rows.len() < 2 || h_sum < config.min_child_weight {
        return leaf;
    }

    // Ties break toward the lower feature index so parallel reduction order
    // cannot change the chosen split
    let best = features
        .par_iter()
        .filter_map(|&f| best_split_for_feature(x, grad, hess, rows, f, config))
        .max_by(|a, b| {
            a.2.partial_cmp(&b.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.cmp(&a.0))
        });

    match best {
        Some((feature, threshold, gain)) if gain > config.gamma => {
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
                rows.iter().partition(|&&i| x[[i, feature]] <= threshold);
            if left_rows.is_empty() || right_rows.is_empty() {
                return leaf;
            }

            Node::Branch {
                feature,
                threshold,
                left: Box::new(grow_tree(x, grad, hess, &left_rows, features, depth + 1, config)),
                right: Box::new(grow_tree(x, grad, hess, &right_rows, features, depth + 1, config)),
            }
        }
        _ => leaf,
    }
}

fn subsample(rng: &mut Xoshiro256PlusPlus, n: usize, ratio: f64) -> Vec<usize> {
    if ratio >= 1.0 {
        return (0..n).collect();
    }
    let k = ((n as f64) * ratio).ceil() as usize;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(k.max(1));
    indices.sort_unstable();
    indices
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Gradient-boosted trees for binary classification (logistic loss)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostedTreesClassifier {
    config: BoostingConfig,
    trees: Vec<Node>,
    base_score: f64,
    n_features: usize,
}

impl BoostedTreesClassifier {
    /// Create an untrained classifier
    pub fn new(config: BoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            base_score: 0.0,
            n_features: 0,
        }
    }

    /// Fit on labels in {0, 1}
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples == 0 || n_features == 0 {
            return Err(EnvmonError::DataError(
                "cannot fit classifier on an empty matrix".to_string(),
            ));
        }
        if n_samples != y.len() {
            return Err(EnvmonError::DataError(format!(
                "feature rows ({n_samples}) and labels ({}) differ in length",
                y.len()
            )));
        }
        self.n_features = n_features;

        // Base prediction in log-odds space
        let p = y.mean().unwrap_or(0.5).clamp(1e-7, 1.0 - 1e-7);
        self.base_score = (p / (1.0 - p)).ln();
        let mut raw = Array1::from_elem(n_samples, self.base_score);

        let mut rng = match self.config.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        self.trees.clear();
        for _ in 0..self.config.n_rounds {
            // Logistic loss: grad = p - y, hess = p (1 - p)
            let probs: Array1<f64> = raw.mapv(sigmoid);
            let grad: Array1<f64> = &probs - y;
            let hess: Array1<f64> = probs.mapv(|p| (p * (1.0 - p)).max(1e-7));

            let rows = subsample(&mut rng, n_samples, self.config.subsample);
            let features = subsample(&mut rng, n_features, self.config.colsample);

            let tree = grow_tree(x, &grad, &hess, &rows, &features, 0, &self.config);
            for &i in &rows {
                let sample = x.row(i);
                raw[i] += self.config.learning_rate * tree.output(sample.as_slice().unwrap());
            }
            self.trees.push(tree);
        }

        Ok(())
    }

    /// Probability of the positive class per sample
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(EnvmonError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(EnvmonError::DataError(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        let mut raw = Array1::from_elem(x.nrows(), self.base_score);
        for (i, row) in x.rows().into_iter().enumerate() {
            let sample = row.as_slice().unwrap();
            for tree in &self.trees {
                raw[i] += self.config.learning_rate * tree.output(sample);
            }
        }
        Ok(raw.mapv(sigmoid))
    }

    /// Point predictions in {0, 1} at the 0.5 probability cut
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let probs = self.predict_proba(x)?;
        Ok(probs.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    /// Fraction of correct predictions
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let preds = self.predict(x)?;
        let correct = preds
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| (*p - *a).abs() < 0.5)
            .count();
        Ok(correct as f64 / y.len() as f64)
    }

    /// Split-count feature importances, normalized to sum to 1
    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        if self.n_features == 0 {
            return None;
        }
        let mut counts = vec![0.0f64; self.n_features];
        for tree in &self.trees {
            count_splits(tree, &mut counts);
        }
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            for c in counts.iter_mut() {
                *c /= total;
            }
        }
        Some(Array1::from_vec(counts))
    }

    /// Number of fitted boosting rounds
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

fn count_splits(node: &Node, counts: &mut [f64]) {
    match node {
        Node::Leaf { .. } => {}
        Node::Branch {
            feature, left, right, ..
        } => {
            if *feature < counts.len() {
                counts[*feature] += 1.0;
            }
            count_splits(left, counts);
            count_splits(right, counts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec(
            (60, 2),
            (0..120).map(|i| (i as f64) * 0.1).collect(),
        )
        .unwrap();
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|r| if r[0] + r[1] > 6.0 { 1.0 } else { 0.0 })
            .collect();
        (x, y)
    }

    #[test]
    fn test_fit_and_score() {
        let (x, y) = separable_data();
        let mut model = BoostedTreesClassifier::new(BoostingConfig {
            n_rounds: 50,
            max_depth: 4,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();

        let acc = model.score(&x, &y).unwrap();
        assert!(acc >= 0.9, "training accuracy = {acc}");
        assert_eq!(model.n_trees(), 50);
    }

    #[test]
    fn test_probabilities_bounded() {
        let (x, y) = separable_data();
        let mut model = BoostedTreesClassifier::new(Default::default());
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert_eq!(proba.len(), x.nrows());
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_seeded_training_is_deterministic() {
        let (x, y) = separable_data();
        let config = BoostingConfig {
            n_rounds: 20,
            subsample: 0.8,
            colsample: 0.5,
            seed: Some(9),
            ..Default::default()
        };

        let mut a = BoostedTreesClassifier::new(config.clone());
        let mut b = BoostedTreesClassifier::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_serde_roundtrip_preserves_predictions() {
        let (x, y) = separable_data();
        let mut model = BoostedTreesClassifier::new(BoostingConfig {
            n_rounds: 25,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();
        let before = model.predict(&x).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: BoostedTreesClassifier = serde_json::from_str(&json).unwrap();
        let after = restored.predict(&x).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_feature_importances_sum_to_one() {
        let (x, y) = separable_data();
        let mut model = BoostedTreesClassifier::new(Default::default());
        model.fit(&x, &y).unwrap();

        let importances = model.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        assert!((importances.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_feature_count_mismatch_rejected() {
        let (x, y) = separable_data();
        let mut model = BoostedTreesClassifier::new(Default::default());
        model.fit(&x, &y).unwrap();

        let wrong = Array2::zeros((3, 5));
        assert!(model.predict(&wrong).is_err());
    }
}
