//! Prediction result types.
//!
//! Represents the output of the scaler + classifier pipeline.

use serde::{Deserialize, Serialize};

/// Probability at or above which a case is labelled class 1.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Failure while scaling or classifying a feature vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("Expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Non-finite value in {stage} output at index {index}")]
    NonFinite { stage: &'static str, index: usize },

    #[error("Class-1 probability {0} outside [0, 1]")]
    ProbabilityOutOfRange(f64),

    #[error("Model evaluation failed: {0}")]
    Evaluation(String),
}

/// Binary ILD grade predicted by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskClass {
    /// ILD grade 0
    #[serde(rename = "class_0")]
    Class0,
    /// ILD grade 1
    #[serde(rename = "class_1")]
    Class1,
}

impl RiskClass {
    /// Label a class-1 probability.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        if probability >= DECISION_THRESHOLD {
            Self::Class1
        } else {
            Self::Class0
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Class0 => "Predicted ILD grade 0",
            Self::Class1 => "Predicted ILD grade 1",
        }
    }

    /// Get the associated color for TUI display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Class0 => (16, 185, 129), // Emerald (#10B981)
            Self::Class1 => (244, 63, 94),  // Rose (#F43F5E)
        }
    }
}

impl std::fmt::Display for RiskClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Class0 => write!(f, "Class 0"),
            Self::Class1 => write!(f, "Class 1"),
        }
    }
}

/// Class-1 probability and its thresholded label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Probability mass on class 1 (0.0 to 1.0)
    pub probability: f64,

    /// `Class1` iff `probability >= 0.5`
    pub label: RiskClass,
}

impl PredictionResult {
    /// Create a result from the classifier's class-1 probability.
    ///
    /// # Errors
    /// Returns `InferenceError::ProbabilityOutOfRange` for NaN or values outside [0, 1].
    pub fn from_probability(probability: f64) -> Result<Self, InferenceError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(InferenceError::ProbabilityOutOfRange(probability));
        }

        Ok(Self {
            probability,
            label: RiskClass::from_probability(probability),
        })
    }

    /// Probability formatted for display (four decimals).
    #[must_use]
    pub fn probability_display(&self) -> String {
        format!("{:.4}", self.probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_law() {
        assert_eq!(RiskClass::from_probability(0.0), RiskClass::Class0);
        assert_eq!(RiskClass::from_probability(0.4999), RiskClass::Class0);
        assert_eq!(RiskClass::from_probability(0.5), RiskClass::Class1);
        assert_eq!(RiskClass::from_probability(1.0), RiskClass::Class1);

        for i in 0..=1000 {
            let p = f64::from(i) / 1000.0;
            let r = PredictionResult::from_probability(p).expect("In range");
            assert_eq!(r.label == RiskClass::Class1, p >= 0.5);
        }
    }

    #[test]
    fn test_just_below_threshold() {
        let below = 0.5_f64 - f64::EPSILON;
        assert_eq!(RiskClass::from_probability(below), RiskClass::Class0);
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(PredictionResult::from_probability(-0.01).is_err());
        assert!(PredictionResult::from_probability(1.01).is_err());
        assert!(PredictionResult::from_probability(f64::NAN).is_err());
    }

    #[test]
    fn test_probability_display() {
        let r = PredictionResult::from_probability(0.812_345).expect("In range");
        assert_eq!(r.probability_display(), "0.8123");
        assert_eq!(r.label.to_string(), "Class 1");
    }

    #[test]
    fn test_serialized_label() {
        let r = PredictionResult::from_probability(0.25).expect("In range");
        let json = serde_json::to_string(&r).expect("Should serialize");
        assert!(json.contains("\"class_0\""));
    }
}
