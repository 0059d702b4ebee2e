//! Model ports: Traits for the fitted scaler and classifier.
//!
//! These traits abstract the numeric binding (exported scikit-learn state)
//! from the prediction logic. Implementations are read-only after load.

use crate::domain::{ArtifactError, ArtifactProvenance, InferenceError};

/// A fitted, deterministic feature transform.
pub trait Scaler: Send + Sync {
    /// Number of features this scaler was fitted on.
    fn n_features(&self) -> usize;

    /// Feature names recorded at fit time, in order.
    fn feature_names(&self) -> &[String];

    /// Transform one feature vector.
    ///
    /// # Errors
    /// Returns `InferenceError::ShapeMismatch` if `x` has the wrong width.
    fn transform(&self, x: &[f64]) -> Result<Vec<f64>, InferenceError>;
}

/// A fitted binary classifier.
pub trait Classifier: Send + Sync {
    /// Number of features this classifier expects.
    fn n_features(&self) -> usize;

    /// Class probabilities `[p0, p1]` for one scaled feature vector.
    ///
    /// # Errors
    /// Returns `InferenceError` if evaluation fails.
    fn predict_proba(&self, x: &[f64]) -> Result<[f64; 2], InferenceError>;
}

/// Immutable scaler/classifier pair shared by all prediction calls.
pub struct ModelArtifacts {
    scaler: Box<dyn Scaler>,
    classifier: Box<dyn Classifier>,
    provenance: Option<ArtifactProvenance>,
}

impl ModelArtifacts {
    /// Pair a scaler with a classifier.
    ///
    /// # Errors
    /// Returns `ArtifactError::Incompatible` if the two disagree on feature width.
    pub fn new(
        scaler: Box<dyn Scaler>,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, ArtifactError> {
        if scaler.n_features() != classifier.n_features() {
            return Err(ArtifactError::Incompatible(format!(
                "scaler has {} features, classifier expects {}",
                scaler.n_features(),
                classifier.n_features()
            )));
        }

        Ok(Self {
            scaler,
            classifier,
            provenance: None,
        })
    }

    /// Attach file provenance.
    #[must_use]
    pub fn with_provenance(mut self, provenance: ArtifactProvenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    #[must_use]
    pub fn scaler(&self) -> &dyn Scaler {
        self.scaler.as_ref()
    }

    #[must_use]
    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    #[must_use]
    pub fn provenance(&self) -> Option<&ArtifactProvenance> {
        self.provenance.as_ref()
    }
}

impl std::fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("n_features", &self.scaler.n_features())
            .field("provenance", &self.provenance)
            .finish()
    }
}
