//! Artifact source port: Trait for obtaining fitted model artifacts.
//!
//! This trait abstracts where the scaler and classifier come from
//! (a directory of exported files in production, in-memory fakes in tests).

use crate::domain::ArtifactError;
use crate::ports::ModelArtifacts;

/// Source of a scaler/classifier pair.
pub trait ArtifactSource {
    /// Human-readable location for logs and the dashboard.
    fn location(&self) -> String;

    /// Deserialize both artifacts.
    ///
    /// Called at most once per process.
    ///
    /// # Errors
    /// Returns `ArtifactError` if either artifact is missing, corrupt, or
    /// incompatible with the expected feature layout.
    fn load_artifacts(&self) -> Result<ModelArtifacts, ArtifactError>;
}
