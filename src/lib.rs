//! envmon - Environmental sensor monitoring pipeline
//!
//! Batch pipeline over a CSV of environmental sensor readings: forward-fill
//! imputation, time-feature derivation, threshold labeling, feature
//! standardization, Isolation Forest anomaly flagging, gradient-boosted
//! classification with held-out evaluation, versioned artifact persistence,
//! trend chart rendering, and augmented-table export.
//!
//! # Modules
//!
//! - [`data`] - Loading, imputation, time features, threshold labeling
//! - [`preprocessing`] - Standardization and feature matrix extraction
//! - [`anomaly`] - Isolation Forest outlier flagging
//! - [`training`] - Train/test split, boosted trees, evaluation metrics
//! - [`export`] - Versioned scaler + classifier artifact
//! - [`viz`] - Trend chart rendering
//! - [`pipeline`] - Stage orchestration
//! - [`config`] - Pipeline configuration
//! - [`cli`] - Command-line interface

pub mod error;

pub mod config;
pub mod data;
pub mod preprocessing;

pub mod anomaly;
pub mod training;

pub mod export;
pub mod viz;

pub mod pipeline;
pub mod cli;

pub use error::{EnvmonError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{EnvmonError, Result};

    // Configuration
    pub use crate::config::PipelineConfig;

    // Data stages
    pub use crate::data::{
        derive_time_features, label_unsafe, ForwardFillImputer, SensorLoader, FEATURE_COLUMNS,
        SENSOR_COLUMNS,
    };

    // Preprocessing
    pub use crate::preprocessing::{feature_matrix, label_vector, StandardScaler};

    // Anomaly detection
    pub use crate::anomaly::{AnomalyDetector, IsolationForest};

    // Training
    pub use crate::training::{
        train_test_split, BoostedTreesClassifier, BoostingConfig, ClassificationReport,
        ConfusionMatrix,
    };

    // Persistence
    pub use crate::export::{ArtifactMetadata, ModelVersion, PipelineArtifact};

    // Visualization
    pub use crate::viz::TrendPlot;

    // Orchestration
    pub use crate::pipeline::{RunSummary, SensorPipeline};
}
