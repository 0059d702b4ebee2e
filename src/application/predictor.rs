//! Stateless inference over injected artifacts.

use crate::domain::{FeatureVector, InferenceError, PredictionResult};
use crate::ports::ModelArtifacts;

/// Scale `features`, classify, and threshold the class-1 probability.
///
/// # Errors
/// Returns `InferenceError` if scaling or classification fails, or if the
/// classifier produces a non-finite or out-of-range probability.
pub fn predict(
    artifacts: &ModelArtifacts,
    features: &FeatureVector,
) -> Result<PredictionResult, InferenceError> {
    let scaled = artifacts.scaler().transform(features.as_slice())?;
    let proba = artifacts.classifier().predict_proba(&scaled)?;

    if let Some(index) = proba.iter().position(|p| !p.is_finite()) {
        return Err(InferenceError::NonFinite {
            stage: "classifier",
            index,
        });
    }

    PredictionResult::from_probability(proba[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClinicalInput, RiskClass};
    use crate::ports::{Classifier, Scaler};
    use std::sync::{Arc, Mutex};

    struct Identity(Vec<String>);

    impl Scaler for Identity {
        fn n_features(&self) -> usize {
            self.0.len()
        }
        fn feature_names(&self) -> &[String] {
            &self.0
        }
        fn transform(&self, x: &[f64]) -> Result<Vec<f64>, InferenceError> {
            Ok(x.to_vec())
        }
    }

    type Seen = Arc<Mutex<Vec<Vec<f64>>>>;

    /// Returns a fixed distribution and records what it was given.
    struct Fixed {
        proba: [f64; 2],
        seen: Seen,
    }

    impl Classifier for Fixed {
        fn n_features(&self) -> usize {
            7
        }
        fn predict_proba(&self, x: &[f64]) -> Result<[f64; 2], InferenceError> {
            self.seen.lock().expect("lock").push(x.to_vec());
            Ok(self.proba)
        }
    }

    fn artifacts_with_log(proba: [f64; 2]) -> (ModelArtifacts, Seen) {
        let names = crate::domain::FEATURE_NAMES
            .iter()
            .map(|s| s.to_string())
            .collect();
        let seen = Seen::default();
        let artifacts = ModelArtifacts::new(
            Box::new(Identity(names)),
            Box::new(Fixed {
                proba,
                seen: Arc::clone(&seen),
            }),
        )
        .expect("widths match");
        (artifacts, seen)
    }

    fn artifacts(proba: [f64; 2]) -> ModelArtifacts {
        artifacts_with_log(proba).0
    }

    fn features() -> FeatureVector {
        ClinicalInput {
            ro52_titer: 1.5,
            ldh: 300.0,
            triglyceride: 1.2,
            fibrinogen: 3.0,
            antisynthetase_positive: 1,
            wbc: 6.5,
            hemoglobin: 120.0,
            albumin: 40.0,
        }
        .to_feature_vector()
        .expect("valid input")
    }

    #[test]
    fn test_uses_positive_class_column() {
        let r = predict(&artifacts([0.3, 0.7]), &features()).expect("Should predict");
        assert_eq!(r.probability, 0.7);
        assert_eq!(r.label, RiskClass::Class1);

        let r = predict(&artifacts([0.9, 0.1]), &features()).expect("Should predict");
        assert_eq!(r.label, RiskClass::Class0);
    }

    #[test]
    fn test_boundary_probability_is_class1() {
        let r = predict(&artifacts([0.5, 0.5]), &features()).expect("Should predict");
        assert_eq!(r.label, RiskClass::Class1);
    }

    #[test]
    fn test_nan_probability_is_inference_error() {
        let err = predict(&artifacts([0.5, f64::NAN]), &features()).expect_err("Must fail");
        assert!(matches!(err, InferenceError::NonFinite { index: 1, .. }));
    }

    #[test]
    fn test_out_of_range_probability_is_inference_error() {
        let err = predict(&artifacts([-0.2, 1.2]), &features()).expect_err("Must fail");
        assert!(matches!(err, InferenceError::ProbabilityOutOfRange(_)));
    }

    #[test]
    fn test_vector_passed_in_fixed_order() {
        let (a, seen) = artifacts_with_log([0.4, 0.6]);
        predict(&a, &features()).expect("Should predict");

        let seen = seen.lock().expect("lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(&seen[0][..6], &[1.5, 300.0, 1.2, 3.0, 1.0, 6.5]);
        assert!((seen[0][6] - 2.999_999_925).abs() < 1e-9);
    }
}
