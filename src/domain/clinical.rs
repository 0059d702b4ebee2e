//! Clinical input and feature derivation for ILD grade prediction.
//!
//! Seven features feed the model. Six are raw laboratory values, the seventh
//! is the hemoglobin/albumin ratio computed here.

use serde::{Deserialize, Serialize};

/// Number of features consumed by the scaler and classifier.
pub const NUM_FEATURES: usize = 7;

/// Pad added to albumin before dividing.
///
/// The albumin == 0 check already rejects exact zeros, so this only changes the
/// result for near-zero (e.g. subnormal) values that pass the check. It also
/// shifts every ratio by a tiny amount; the artifacts were fitted with the same
/// pad, so it stays.
pub const RATIO_EPSILON: f64 = 1e-6;

/// Feature names in the order the artifacts were fitted on.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "anti_ro52_titer",
    "ldh",
    "triglyceride",
    "fibrinogen",
    "antisynthetase_positive",
    "wbc",
    "hemoglobin_albumin_ratio",
];

/// Input rejected before inference.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Albumin must not be zero")]
    ZeroAlbumin,
}

/// Raw laboratory values entered for one case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ClinicalInput {
    /// Anti-RO52 antibody titer (0-3 semi-quantitative)
    pub ro52_titer: f64,

    /// Lactate dehydrogenase (U/L)
    pub ldh: f64,

    /// Triglyceride (mmol/L)
    pub triglyceride: f64,

    /// Fibrinogen (g/L)
    pub fibrinogen: f64,

    /// Anti-synthetase antibody positive: 0 = no, 1 = yes
    #[serde(deserialize_with = "deserialize_flag")]
    pub antisynthetase_positive: u8,

    /// White blood cell count (10^9/L)
    pub wbc: f64,

    /// Hemoglobin (g/L)
    pub hemoglobin: f64,

    /// Albumin (g/L), must be non-zero
    pub albumin: f64,
}

/// Accept a 0/1 flag written either as an integer or as `0.0`/`1.0`.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value == 0.0 {
        Ok(0)
    } else if value == 1.0 {
        Ok(1)
    } else {
        Err(serde::de::Error::custom(format!(
            "antisynthetase_positive must be 0 or 1, got {value}"
        )))
    }
}

impl ClinicalInput {
    /// Hemoglobin divided by padded albumin.
    #[must_use]
    pub fn hemoglobin_albumin_ratio(&self) -> f64 {
        self.hemoglobin / (self.albumin + RATIO_EPSILON)
    }

    /// Build the fixed-order feature vector.
    ///
    /// # Errors
    /// Returns `ValidationError::ZeroAlbumin` when albumin is exactly zero.
    pub fn to_feature_vector(&self) -> Result<FeatureVector, ValidationError> {
        if self.albumin == 0.0 {
            return Err(ValidationError::ZeroAlbumin);
        }

        Ok(FeatureVector([
            self.ro52_titer,
            self.ldh,
            self.triglyceride,
            self.fibrinogen,
            f64::from(self.antisynthetase_positive),
            self.wbc,
            self.hemoglobin_albumin_ratio(),
        ]))
    }
}

/// Ordered model input derived from a `ClinicalInput`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; NUM_FEATURES]);

impl FeatureVector {
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pair each value with its feature name.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}
