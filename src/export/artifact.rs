//! Versioned scaler + classifier bundle

use crate::error::{EnvmonError, Result};
use crate::preprocessing::StandardScaler;
use crate::training::BoostedTreesClassifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Semantic artifact schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ModelVersion {
    /// Create a version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Schema version written by this build
    pub fn current() -> Self {
        Self::new(1, 0, 0)
    }

    /// Parse from a "major.minor.patch" string
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(EnvmonError::ArtifactError(format!(
                "invalid version format: {s}"
            )));
        }
        let field = |i: usize| {
            parts[i].parse::<u32>().map_err(|_| {
                EnvmonError::ArtifactError(format!("invalid version component: {}", parts[i]))
            })
        };
        Ok(Self::new(field(0)?, field(1)?, field(2)?))
    }

    /// Whether an artifact written at `other` can be read by this build
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.major == other.major
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Default for ModelVersion {
    fn default() -> Self {
        Self::current()
    }
}

/// Metadata stamped into the artifact at save time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Producing pipeline name
    pub pipeline: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
    /// Feature columns the scaler and classifier were fit on, in order
    pub feature_columns: Vec<String>,
    /// Number of rows in the fitting table
    pub n_rows: usize,
    /// Held-out accuracy at training time
    pub accuracy: Option<f64>,
}

impl ArtifactMetadata {
    /// Stamp metadata for a just-trained pipeline
    pub fn new(feature_columns: Vec<String>, n_rows: usize, accuracy: Option<f64>) -> Self {
        Self {
            pipeline: env!("CARGO_PKG_NAME").to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            feature_columns,
            n_rows,
            accuracy,
        }
    }
}

/// The persisted bundle: schema version, metadata, fitted scaler, and
/// fitted classifier in one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub version: ModelVersion,
    pub metadata: ArtifactMetadata,
    pub scaler: StandardScaler,
    pub classifier: BoostedTreesClassifier,
}

impl PipelineArtifact {
    /// Bundle a fitted scaler and classifier
    pub fn new(
        scaler: StandardScaler,
        classifier: BoostedTreesClassifier,
        metadata: ArtifactMetadata,
    ) -> Self {
        Self {
            version: ModelVersion::current(),
            metadata,
            scaler,
            classifier,
        }
    }

    /// Write the bundle as pretty JSON, overwriting any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a bundle, rejecting incompatible schema versions
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let artifact: Self = serde_json::from_str(&json)?;

        let current = ModelVersion::current();
        if !current.is_compatible(&artifact.version) {
            return Err(EnvmonError::ArtifactError(format!(
                "artifact version {} is not readable by schema {}",
                artifact.version, current
            )));
        }

        Ok(artifact)
    }
}
