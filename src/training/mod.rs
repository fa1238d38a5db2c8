//! Classifier training
//!
//! Seeded train/test splitting, gradient-boosted tree classification, and
//! evaluation metrics.

mod boosting;
mod metrics;
mod split;

pub use boosting::{BoostedTreesClassifier, BoostingConfig};
pub use metrics::{ClassificationReport, ConfusionMatrix};
pub use split::train_test_split;
