//! scikit-learn adapter: Implementation of the model ports over exported
//! fitted-estimator state.
//!
//! Training exports two JSON files next to each other:
//!
//! - `rf_scaler.json`: a fitted `StandardScaler` or `MinMaxScaler`
//! - `rf_model.json`: a fitted `RandomForestClassifier`
//!
//! Both carry `format_version` and a `kind` tag. Everything is validated at
//! load time so a bad export fails startup rather than a prediction.
//!
//! Converting fitted joblib artifacts:
//!
//! ```python
//! import json, joblib
//!
//! names = ["anti_ro52_titer", "ldh", "triglyceride", "fibrinogen",
//!          "antisynthetase_positive", "wbc", "hemoglobin_albumin_ratio"]
//! scaler = joblib.load("rf_scaler.joblib")
//! model = joblib.load("rf_model.joblib")
//!
//! # StandardScaler; for MinMaxScaler use kind "min_max_scaler" with
//! # "min": scaler.min_.tolist() and "scale": scaler.scale_.tolist().
//! with open("rf_scaler.json", "w") as f:
//!     json.dump({"format_version": 1, "kind": "standard_scaler",
//!                "feature_names": names,
//!                "mean": scaler.mean_.tolist(),
//!                "scale": scaler.scale_.tolist()}, f)
//!
//! trees = []
//! for est in model.estimators_:
//!     t = est.tree_
//!     trees.append({"children_left": t.children_left.tolist(),
//!                   "children_right": t.children_right.tolist(),
//!                   "feature": t.feature.tolist(),
//!                   "threshold": t.threshold.tolist(),
//!                   "value": t.value[:, 0, :].tolist()})
//!
//! with open("rf_model.json", "w") as f:
//!     json.dump({"format_version": 1, "kind": "random_forest",
//!                "n_features": int(model.n_features_in_),
//!                "classes": [int(c) for c in model.classes_],
//!                "trees": trees}, f)
//! ```
//!
//! `value` may hold counts or fractions; leaves are normalized when evaluated.

mod forest;
mod scaler;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{ArtifactError, ArtifactFile, ArtifactProvenance, FEATURE_NAMES};
use crate::ports::{ArtifactSource, ModelArtifacts, Scaler};

pub use forest::{ExportedClassifier, ExportedForest, ExportedTree};
pub use scaler::ExportedScaler;

/// Export format understood by this binding.
pub const FORMAT_VERSION: u32 = 1;

/// Default scaler file name, resolved against the artifact directory.
pub const DEFAULT_SCALER_FILE: &str = "rf_scaler.json";

/// Default classifier file name, resolved against the artifact directory.
pub const DEFAULT_MODEL_FILE: &str = "rf_model.json";

#[derive(Deserialize)]
struct FormatHeader {
    format_version: u32,
}

/// Directory holding the exported scaler and classifier.
#[derive(Debug, Clone)]
pub struct ArtifactDir {
    scaler_path: PathBuf,
    model_path: PathBuf,
}

impl ArtifactDir {
    /// Use the default file names inside `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_files(dir, DEFAULT_SCALER_FILE, DEFAULT_MODEL_FILE)
    }

    /// Use custom file names inside `dir`.
    pub fn with_files(dir: impl AsRef<Path>, scaler_file: &str, model_file: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            scaler_path: dir.join(scaler_file),
            model_path: dir.join(model_file),
        }
    }

    #[must_use]
    pub fn scaler_path(&self) -> &Path {
        &self.scaler_path
    }

    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::Missing(path.to_path_buf())
        } else {
            ArtifactError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    })
}

fn corrupt(path: &Path, reason: impl Into<String>) -> ArtifactError {
    ArtifactError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Parse an export after checking its `format_version`.
fn parse_versioned<T>(path: &Path, bytes: &[u8]) -> Result<T, ArtifactError>
where
    T: for<'de> Deserialize<'de>,
{
    let header: FormatHeader =
        serde_json::from_slice(bytes).map_err(|e| corrupt(path, e.to_string()))?;
    if header.format_version != FORMAT_VERSION {
        return Err(ArtifactError::VersionMismatch {
            path: path.to_path_buf(),
            found: header.format_version,
            expected: FORMAT_VERSION,
        });
    }
    serde_json::from_slice(bytes).map_err(|e| corrupt(path, e.to_string()))
}

/// Load and validate a scaler export.
///
/// # Errors
/// Returns `ArtifactError` if the file is missing, malformed, or does not
/// record the expected feature layout.
pub fn load_scaler(path: &Path) -> Result<(ExportedScaler, ArtifactFile), ArtifactError> {
    let bytes = read_artifact(path)?;
    let scaler: ExportedScaler = parse_versioned(path, &bytes)?;
    scaler.validate().map_err(|e| corrupt(path, e))?;

    let names = scaler.feature_names();
    if names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
        return Err(ArtifactError::Incompatible(format!(
            "scaler feature order {:?} does not match expected {:?}",
            names, FEATURE_NAMES
        )));
    }

    Ok((scaler, ArtifactFile::from_bytes(path, &bytes)))
}

/// Load and validate a classifier export.
///
/// # Errors
/// Returns `ArtifactError` if the file is missing, malformed, or structurally invalid.
pub fn load_classifier(path: &Path) -> Result<(ExportedClassifier, ArtifactFile), ArtifactError> {
    let bytes = read_artifact(path)?;
    let classifier: ExportedClassifier = parse_versioned(path, &bytes)?;
    classifier.validate().map_err(|e| corrupt(path, e))?;
    Ok((classifier, ArtifactFile::from_bytes(path, &bytes)))
}

impl ArtifactSource for ArtifactDir {
    fn location(&self) -> String {
        format!(
            "{} + {}",
            self.scaler_path.display(),
            self.model_path.display()
        )
    }

    fn load_artifacts(&self) -> Result<ModelArtifacts, ArtifactError> {
        let (scaler, scaler_file) = load_scaler(&self.scaler_path)?;
        let (classifier, classifier_file) = load_classifier(&self.model_path)?;

        tracing::info!(
            "Loaded scaler from {:?} (fingerprint={}, n_features={})",
            scaler_file.path,
            scaler_file.fingerprint,
            scaler.n_features()
        );
        tracing::info!(
            "Loaded classifier from {:?} (fingerprint={})",
            classifier_file.path,
            classifier_file.fingerprint
        );

        let artifacts = ModelArtifacts::new(Box::new(scaler), classifier.into_classifier())?;
        Ok(artifacts.with_provenance(ArtifactProvenance {
            scaler: scaler_file,
            classifier: classifier_file,
            loaded_at: chrono::Utc::now(),
        }))
    }
}
