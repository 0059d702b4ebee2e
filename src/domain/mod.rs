//! Domain layer: Core business types and logic.
//!
//! Pure Rust types for clinical input, derived features, and prediction
//! results. No model evaluation happens here.

mod artifact;
mod clinical;
mod prediction;

pub use artifact::{compute_fingerprint, ArtifactError, ArtifactFile, ArtifactProvenance};
pub use clinical::{
    ClinicalInput, FeatureVector, ValidationError, FEATURE_NAMES, NUM_FEATURES, RATIO_EPSILON,
};
pub use prediction::{InferenceError, PredictionResult, RiskClass, DECISION_THRESHOLD};
