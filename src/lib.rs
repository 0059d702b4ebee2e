//! # ildrisk
//!
//! Local ILD grade prediction for MDA5-positive dermatomyositis.
//!
//! This crate provides:
//! - Feature derivation from seven laboratory values plus albumin
//! - Evaluation of exported scikit-learn scaler and random forest artifacts
//! - Terminal UI and a single-shot JSON front-end
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (ClinicalInput, FeatureVector, PredictionResult)
//! - `ports`: Trait definitions for scaler, classifier and artifact source
//! - `adapters`: Concrete implementations (scikit-learn JSON export, log sanitization)
//! - `application`: Prediction service and the stateless predict call
//! - `config`: Environment-derived runtime settings
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{ClinicalInput, FeatureVector, PredictionResult, RiskClass};

/// Result type for ildrisk operations
pub type Result<T> = std::result::Result<T, IldRiskError>;

/// Main error type for ildrisk
#[derive(Debug, thiserror::Error)]
pub enum IldRiskError {
    #[error("Artifact load failed: {0}")]
    ArtifactLoad(#[from] domain::ArtifactError),

    #[error("Model artifacts not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("Invalid clinical input: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Inference failed: {0}")]
    Inference(#[from] domain::InferenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IldRiskError {
    /// Message shown to the operator.
    ///
    /// Load problems, zero albumin and inference failures read differently.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ArtifactLoad(e) => format!("Model artifacts not loaded ({e})"),
            Self::ModelNotLoaded(reason) => format!("Model artifacts not loaded ({reason})"),
            Self::Validation(domain::ValidationError::ZeroAlbumin) => {
                "Albumin is zero; the hemoglobin/albumin ratio cannot be computed".to_string()
            }
            Self::Inference(e) => format!("Unexpected inference error: {e}"),
            Self::Io(e) => format!("I/O error: {e}"),
            Self::Serialization(e) => format!("Invalid input: {e}"),
        }
    }
}
