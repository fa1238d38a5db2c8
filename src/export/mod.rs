//! Trained artifact persistence
//!
//! The fitted scaler and classifier are only valid together, so they are
//! persisted as one schema-versioned bundle.

mod artifact;

pub use artifact::{ArtifactMetadata, ModelVersion, PipelineArtifact};
