//! Artifact metadata and load errors.
//!
//! Artifacts are the fitted scaler and classifier exported from training.
//! This module only describes them; evaluation lives behind the ports.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Error type for artifact loading.
///
/// Any of these at startup leaves prediction disabled for the process lifetime.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("Corrupt artifact {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Unsupported format_version {found} in {} (expected {expected})", path.display())]
    VersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("Incompatible artifacts: {0}")]
    Incompatible(String),
}

/// Where one artifact came from and what it hashed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactFile {
    pub path: PathBuf,

    /// Short SHA-256 fingerprint of the file bytes (16 hex chars)
    pub fingerprint: String,

    pub size_bytes: usize,
}

impl ArtifactFile {
    /// Describe an artifact from its path and raw bytes.
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Self {
        Self {
            path: path.to_path_buf(),
            fingerprint: compute_fingerprint(bytes),
            size_bytes: bytes.len(),
        }
    }
}

/// Provenance of a loaded scaler/classifier pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactProvenance {
    pub scaler: ArtifactFile,
    pub classifier: ArtifactFile,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// Compute a short fingerprint for artifact identification using SHA-256.
pub fn compute_fingerprint(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();

    result[..8].iter().map(|b| format!("{b:02x}")).collect()
}
