//! Pipeline orchestration
//!
//! Runs the full monitoring sequence over one input file: load, impute,
//! derive time features, label, scale, flag anomalies, train and evaluate the
//! classifier, persist the artifact, render the trend chart, and export the
//! augmented table.

use crate::anomaly::{AnomalyDetector, IsolationForest};
use crate::config::PipelineConfig;
use crate::data::{
    derive_time_features, label_unsafe, save_csv, ForwardFillImputer, SensorLoader, ANOMALY,
    FEATURE_COLUMNS, SENSOR_COLUMNS, UNSAFE,
};
use crate::error::{EnvmonError, Result};
use crate::export::{ArtifactMetadata, PipelineArtifact};
use crate::preprocessing::{feature_matrix, label_vector, StandardScaler};
use crate::training::{
    train_test_split, BoostedTreesClassifier, ClassificationReport, ConfusionMatrix,
};
use crate::viz::TrendPlot;
use polars::prelude::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Class names used in the evaluation report
pub const CLASS_LABELS: [&str; 2] = ["safe", "unsafe"];

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Rows in the input table
    pub n_rows: usize,
    /// Missing cells filled by the imputer
    pub cells_filled: usize,
    /// Rows labeled unsafe
    pub n_unsafe: usize,
    /// Rows flagged anomalous
    pub n_anomalies: usize,
    /// Held-out evaluation report
    pub report: ClassificationReport,
    /// Held-out confusion matrix
    pub confusion: ConfusionMatrix,
    /// Normalized split-count feature importances, paired with column names
    pub feature_importances: Vec<(String, f64)>,
    /// Seconds spent fitting the classifier
    pub training_time_secs: f64,
    /// Where the artifact was written
    pub artifact_path: PathBuf,
    /// Where the chart was written
    pub plot_path: PathBuf,
    /// Where the augmented CSV was written
    pub cleaned_path: PathBuf,
}

/// The full monitoring pipeline
pub struct SensorPipeline {
    config: PipelineConfig,
}

impl SensorPipeline {
    /// Create a pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute every stage in order and return the run summary
    pub fn run(&self) -> Result<RunSummary> {
        let config = &self.config;

        let df = SensorLoader::new().load(&config.input_path)?;
        let n_rows = df.height();
        info!(rows = n_rows, input = %config.input_path.display(), "loaded sensor table");

        let nulls_before = total_nulls(&df, &SENSOR_COLUMNS);
        let df = ForwardFillImputer::new().apply(&df, &SENSOR_COLUMNS)?;
        let cells_filled = nulls_before - total_nulls(&df, &SENSOR_COLUMNS);
        debug!(cells_filled, "forward-filled missing readings");

        let df = derive_time_features(&df)?;
        let df = label_unsafe(
            &df,
            config.temperature_threshold,
            config.air_quality_threshold,
        )?;
        let y = label_vector(&df, UNSAFE)?;
        let n_unsafe = y.iter().filter(|&&v| v > 0.5).count();
        info!(n_unsafe, "labeled unsafe rows");

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&df, &FEATURE_COLUMNS)?;
        let x = feature_matrix(&scaled, &FEATURE_COLUMNS)?;

        let mut detector = IsolationForest::new()
            .with_contamination(config.contamination)
            .with_seed(config.anomaly_seed);
        detector.fit(&x)?;
        let flags = detector.predict(&x)?;
        let n_anomalies = flags.iter().filter(|&&f| f == 1).count();
        info!(n_anomalies, threshold = detector.threshold(), "flagged anomalies");

        let mut df = df;
        df.with_column(
            Int32Chunked::from_vec(ANOMALY.into(), flags.to_vec())
                .into_series(),
        )
        .map_err(|e| EnvmonError::DataError(e.to_string()))?;

        let (x_train, x_test, y_train, y_test) =
            train_test_split(&x, &y, config.test_fraction, config.split_seed)?;

        let start = Instant::now();
        let mut classifier = BoostedTreesClassifier::new(config.boosting.clone());
        classifier.fit(&x_train, &y_train)?;
        let training_time_secs = start.elapsed().as_secs_f64();
        info!(
            rounds = classifier.n_trees(),
            secs = training_time_secs,
            "trained classifier"
        );

        let y_pred = classifier.predict(&x_test)?;
        let report = ClassificationReport::from_predictions(&y_test, &y_pred, CLASS_LABELS);
        let confusion = report.confusion;

        let feature_importances: Vec<(String, f64)> = classifier
            .feature_importances()
            .map(|imp| {
                FEATURE_COLUMNS
                    .iter()
                    .zip(imp.iter())
                    .map(|(name, v)| (name.to_string(), *v))
                    .collect()
            })
            .unwrap_or_default();

        let metadata = ArtifactMetadata::new(
            FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            n_rows,
            Some(report.accuracy),
        );
        let artifact = PipelineArtifact::new(scaler, classifier, metadata);
        artifact.save(&config.artifact_path)?;
        info!(path = %config.artifact_path.display(), "saved artifact");

        TrendPlot::new(config.temperature_threshold, config.air_quality_threshold)
            .render(&df, &config.plot_path)?;
        info!(path = %config.plot_path.display(), "rendered trend chart");

        save_csv(&mut df, &config.cleaned_path)?;
        info!(path = %config.cleaned_path.display(), "exported cleaned table");

        Ok(RunSummary {
            n_rows,
            cells_filled,
            n_unsafe,
            n_anomalies,
            report,
            confusion,
            feature_importances,
            training_time_secs,
            artifact_path: config.artifact_path.clone(),
            plot_path: config.plot_path.clone(),
            cleaned_path: config.cleaned_path.clone(),
        })
    }
}

fn total_nulls(df: &DataFrame, columns: &[&str]) -> usize {
    columns
        .iter()
        .filter_map(|name| df.column(name).ok())
        .map(|col| col.null_count())
        .sum()
}
