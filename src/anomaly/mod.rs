//! Anomaly detection
//!
//! Unsupervised outlier flagging over the scaled feature matrix.

mod isolation_forest;

pub use isolation_forest::IsolationForest;

use crate::error::Result;
use ndarray::{Array1, Array2};

/// Trait for anomaly detectors
pub trait AnomalyDetector {
    /// Fit the detector on a feature matrix
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    /// Anomaly score per sample, in [0, 1]; higher is more anomalous
    fn score_samples(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Binary flags per sample: 1 for outlier, 0 for inlier
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>>;

    /// Score threshold above which a sample is flagged
    fn threshold(&self) -> f64;
}
