//! Pipeline configuration
//!
//! Every parameter the pipeline consumes lives here: file paths, safety
//! thresholds, contamination rate, split fraction, and random seeds. Defaults
//! reproduce the original monitoring setup (`sensor_data.csv` in the working
//! directory, 35 °C / 600 AQI thresholds, 10% contamination, 80/20 split).

use crate::error::Result;
use crate::training::BoostingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a full pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Input CSV of sensor readings
    pub input_path: PathBuf,

    /// Output path for the bundled scaler + classifier artifact
    pub artifact_path: PathBuf,

    /// Output path for the trend chart
    pub plot_path: PathBuf,

    /// Output path for the cleaned, labeled CSV
    pub cleaned_path: PathBuf,

    /// Temperature above which a reading is unsafe (°C)
    pub temperature_threshold: f64,

    /// Air-quality index above which a reading is unsafe
    pub air_quality_threshold: f64,

    /// Expected proportion of outliers for the anomaly detector
    pub contamination: f64,

    /// Fraction of rows held out for classifier evaluation
    pub test_fraction: f64,

    /// Seed for the train/test split
    pub split_seed: u64,

    /// Seed for the anomaly detector; `None` seeds from entropy
    pub anomaly_seed: Option<u64>,

    /// Hyperparameters for the boosted-trees classifier
    pub boosting: BoostingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("sensor_data.csv"),
            artifact_path: PathBuf::from("env_monitor_model.json"),
            plot_path: PathBuf::from("environmental_trends.png"),
            cleaned_path: PathBuf::from("sensor_data_cleaned.csv"),
            temperature_threshold: 35.0,
            air_quality_threshold: 600.0,
            contamination: 0.1,
            test_fraction: 0.2,
            split_seed: 42,
            anomaly_seed: Some(42),
            boosting: BoostingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the input path
    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = path.into();
        self
    }

    /// Builder method to set the safety thresholds
    pub fn with_thresholds(mut self, temperature: f64, air_quality: f64) -> Self {
        self.temperature_threshold = temperature;
        self.air_quality_threshold = air_quality;
        self
    }

    /// Builder method to set the contamination rate
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination.clamp(0.0, 0.5);
        self
    }

    /// Builder method to set the held-out fraction
    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction.clamp(0.01, 0.99);
        self
    }

    /// Builder method to set the anomaly detector seed
    pub fn with_anomaly_seed(mut self, seed: Option<u64>) -> Self {
        self.anomaly_seed = seed;
        self
    }

    /// Load a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Save the configuration to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
