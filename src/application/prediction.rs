//! Prediction service: Owns the artifact lifecycle and runs predictions.
//!
//! Lifecycle per process: `Unloaded -> Loading -> Ready | LoadFailed`.
//! `LoadFailed` is terminal; there is no retry and no reload.

use std::sync::Arc;

use crate::application::predictor;
use crate::domain::{
    ArtifactError, ArtifactProvenance, ClinicalInput, InferenceError, PredictionResult,
};
use crate::ports::{ArtifactSource, ModelArtifacts};
use crate::IldRiskError;

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Unloaded,
    Loading,
    Ready,
    LoadFailed,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unloaded => write!(f, "UNLOADED"),
            Self::Loading => write!(f, "LOADING"),
            Self::Ready => write!(f, "READY"),
            Self::LoadFailed => write!(f, "LOAD FAILED"),
        }
    }
}

enum Lifecycle {
    Unloaded,
    Loading,
    Ready(Arc<ModelArtifacts>),
    LoadFailed(ArtifactError),
}

/// Service for running ILD grade predictions.
///
/// Constructed by the process entry point, initialized once, then shared
/// read-only. Each `predict` call is independent.
pub struct PredictionService {
    lifecycle: Lifecycle,
}

impl Default for PredictionService {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionService {
    /// Create an unloaded service.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Unloaded,
        }
    }

    /// Create a service that is already ready with the given artifacts.
    #[must_use]
    pub fn with_artifacts(artifacts: Arc<ModelArtifacts>) -> Self {
        Self {
            lifecycle: Lifecycle::Ready(artifacts),
        }
    }

    /// Load artifacts from `source`.
    ///
    /// Only the first call does anything; later calls log and return the
    /// outcome of the first.
    ///
    /// # Errors
    /// Returns `IldRiskError::ArtifactLoad` if loading failed. The service
    /// stays in `LoadFailed` for the rest of the process.
    pub fn initialize<A>(&mut self, source: &A) -> Result<(), IldRiskError>
    where
        A: ArtifactSource + ?Sized,
    {
        match &self.lifecycle {
            Lifecycle::Unloaded => {}
            Lifecycle::Ready(_) => {
                tracing::warn!("Artifacts already loaded; ignoring repeated initialization");
                return Ok(());
            }
            Lifecycle::LoadFailed(e) => {
                tracing::warn!("Artifact load already failed; not retrying");
                return Err(IldRiskError::ArtifactLoad(e.clone()));
            }
            Lifecycle::Loading => {
                return Err(IldRiskError::ModelNotLoaded(
                    "artifact loading already in progress".to_string(),
                ));
            }
        }

        tracing::info!("Loading model artifacts from {}", source.location());
        self.lifecycle = Lifecycle::Loading;

        match source.load_artifacts() {
            Ok(artifacts) => {
                tracing::info!("Model artifacts ready");
                self.lifecycle = Lifecycle::Ready(Arc::new(artifacts));
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load model artifacts: {}", e);
                self.lifecycle = Lifecycle::LoadFailed(e.clone());
                Err(IldRiskError::ArtifactLoad(e))
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> ServiceState {
        match self.lifecycle {
            Lifecycle::Unloaded => ServiceState::Unloaded,
            Lifecycle::Loading => ServiceState::Loading,
            Lifecycle::Ready(_) => ServiceState::Ready,
            Lifecycle::LoadFailed(_) => ServiceState::LoadFailed,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Ready(_))
    }

    /// Shared handle to the loaded artifacts.
    #[must_use]
    pub fn artifacts(&self) -> Option<Arc<ModelArtifacts>> {
        match &self.lifecycle {
            Lifecycle::Ready(a) => Some(Arc::clone(a)),
            _ => None,
        }
    }

    #[must_use]
    pub fn provenance(&self) -> Option<&ArtifactProvenance> {
        match &self.lifecycle {
            Lifecycle::Ready(a) => a.provenance(),
            _ => None,
        }
    }

    /// Why loading failed, if it did.
    #[must_use]
    pub fn load_error(&self) -> Option<&ArtifactError> {
        match &self.lifecycle {
            Lifecycle::LoadFailed(e) => Some(e),
            _ => None,
        }
    }

    /// Run one prediction.
    ///
    /// Artifact availability is checked before the input is looked at.
    ///
    /// # Errors
    /// - `ModelNotLoaded` if the service is not `Ready`
    /// - `Validation` if albumin is zero
    /// - `Inference` if scaling or classification fails
    pub fn predict(&self, input: &ClinicalInput) -> Result<PredictionResult, IldRiskError> {
        let artifacts = match &self.lifecycle {
            Lifecycle::Ready(a) => a,
            Lifecycle::LoadFailed(e) => return Err(IldRiskError::ModelNotLoaded(e.to_string())),
            Lifecycle::Unloaded => {
                return Err(IldRiskError::ModelNotLoaded(
                    "artifacts have not been loaded".to_string(),
                ))
            }
            Lifecycle::Loading => {
                return Err(IldRiskError::ModelNotLoaded(
                    "artifact loading in progress".to_string(),
                ))
            }
        };

        let features = input.to_feature_vector().map_err(|e| {
            tracing::info!("Rejected submission: {}", e);
            IldRiskError::Validation(e)
        })?;

        let result = predictor::predict(artifacts, &features).map_err(|e| {
            match &e {
                InferenceError::NonFinite { index, .. } => {
                    let feature = features.named().nth(*index).map_or("?", |(name, _)| name);
                    tracing::warn!("Inference failed: {} (feature {})", e, feature);
                }
                _ => tracing::warn!("Inference failed: {}", e),
            }
            IldRiskError::Inference(e)
        })?;

        tracing::info!(
            "Prediction complete: label={}, probability={:.4}",
            result.label,
            result.probability
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sklearn::tests::{model_json, scaler_json, write_artifacts};
    use crate::adapters::sklearn::ArtifactDir;
    use crate::domain::{RiskClass, ValidationError};
    use crate::ports::{Classifier, Scaler};
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn reference_case() -> ClinicalInput {
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
    }

    fn high_risk_case() -> ClinicalInput {
        ClinicalInput {
            ro52_titer: 2.5,
            ldh: 480.0,
            triglyceride: 2.1,
            fibrinogen: 4.1,
            antisynthetase_positive: 1,
            wbc: 9.4,
            hemoglobin: 104.0,
            albumin: 31.0,
        }
    }

    struct FailingSource;

    impl ArtifactSource for FailingSource {
        fn location(&self) -> String {
            "nowhere".to_string()
        }
        fn load_artifacts(&self) -> Result<ModelArtifacts, ArtifactError> {
            Err(ArtifactError::Missing(PathBuf::from("rf_model.json")))
        }
    }

    struct Passthrough;

    impl Scaler for Passthrough {
        fn n_features(&self) -> usize {
            7
        }
        fn feature_names(&self) -> &[String] {
            &[]
        }
        fn transform(&self, x: &[f64]) -> Result<Vec<f64>, InferenceError> {
            Ok(x.to_vec())
        }
    }

    /// Counts calls so tests can prove the classifier was never reached.
    struct Counting(Arc<AtomicUsize>);

    impl Classifier for Counting {
        fn n_features(&self) -> usize {
            7
        }
        fn predict_proba(&self, _x: &[f64]) -> Result<[f64; 2], InferenceError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok([0.25, 0.75])
        }
    }

    /// In-memory source that counts how often it is asked to load.
    struct CountingSource {
        loads: Cell<usize>,
        classifier_calls: Arc<AtomicUsize>,
    }

    impl ArtifactSource for CountingSource {
        fn location(&self) -> String {
            "memory".to_string()
        }
        fn load_artifacts(&self) -> Result<ModelArtifacts, ArtifactError> {
            self.loads.set(self.loads.get() + 1);
            ModelArtifacts::new(
                Box::new(Passthrough),
                Box::new(Counting(Arc::clone(&self.classifier_calls))),
            )
        }
    }

    fn counting_service() -> (PredictionService, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            loads: Cell::new(0),
            classifier_calls: Arc::clone(&calls),
        };
        let mut service = PredictionService::new();
        service.initialize(&source).expect("Should initialize");
        (service, calls)
    }

    #[test]
    fn test_lifecycle_ready() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), &scaler_json(1), &model_json(1));

        let mut service = PredictionService::new();
        assert_eq!(service.state(), ServiceState::Unloaded);

        service
            .initialize(&ArtifactDir::new(temp.path()))
            .expect("Should initialize");
        assert_eq!(service.state(), ServiceState::Ready);
        assert!(service.is_ready());
        assert!(service.provenance().is_some());
        assert_eq!(
            service.artifacts().expect("ready").classifier().n_features(),
            7
        );
        assert!(service.load_error().is_none());
    }

    #[test]
    fn test_predict_before_initialize() {
        let service = PredictionService::new();
        let err = service.predict(&reference_case()).expect_err("Must fail");
        assert!(matches!(err, IldRiskError::ModelNotLoaded(_)));
    }

    #[test]
    fn test_load_failure_is_terminal() {
        let mut service = PredictionService::new();
        let err = service.initialize(&FailingSource).expect_err("Must fail");
        assert!(matches!(err, IldRiskError::ArtifactLoad(_)));
        assert_eq!(service.state(), ServiceState::LoadFailed);

        // A later good source is not consulted.
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), &scaler_json(1), &model_json(1));
        assert!(service.initialize(&ArtifactDir::new(temp.path())).is_err());
        assert_eq!(service.state(), ServiceState::LoadFailed);

        // Every submission reports the load failure, even ones that would fail validation.
        for input in [
            reference_case(),
            ClinicalInput {
                albumin: 0.0,
                ..reference_case()
            },
        ] {
            let err = service.predict(&input).expect_err("Must fail");
            match err {
                IldRiskError::ModelNotLoaded(msg) => assert!(msg.contains("rf_model.json")),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_repeated_initialize_does_not_reload() {
        let source = CountingSource {
            loads: Cell::new(0),
            classifier_calls: Arc::new(AtomicUsize::new(0)),
        };
        let mut service = PredictionService::new();
        service.initialize(&source).expect("first");
        service.initialize(&source).expect("second is a no-op");
        assert_eq!(source.loads.get(), 1);
    }

    #[test]
    fn test_zero_albumin_never_reaches_classifier() {
        let (service, calls) = counting_service();
        let input = ClinicalInput {
            albumin: 0.0,
            ..reference_case()
        };

        let err = service.predict(&input).expect_err("Must fail");
        assert!(matches!(
            err,
            IldRiskError::Validation(ValidationError::ZeroAlbumin)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // The service stays usable.
        let ok = service.predict(&reference_case()).expect("Should predict");
        assert_eq!(ok.label, RiskClass::Class1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_inference_error_keeps_service_usable() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), &scaler_json(1), &model_json(1));
        let mut service = PredictionService::new();
        service
            .initialize(&ArtifactDir::new(temp.path()))
            .expect("Should initialize");

        let bad = ClinicalInput {
            ldh: f64::INFINITY,
            ..reference_case()
        };
        let err = service.predict(&bad).expect_err("Must fail");
        assert!(matches!(err, IldRiskError::Inference(_)));

        service
            .predict(&reference_case())
            .expect("Still usable after inference error");
    }

    #[test]
    fn test_float32_overflow_after_scaling_is_inference_error() {
        let service = PredictionService::with_artifacts(Arc::new(
            ArtifactDir::new("models")
                .load_artifacts()
                .expect("Demo artifacts should load"),
        ));

        // Finite as f64, but the scaled LDH no longer fits in float32.
        let huge = ClinicalInput {
            ldh: 1e42,
            ..reference_case()
        };
        let err = service.predict(&huge).expect_err("Must fail");
        assert!(matches!(
            err,
            IldRiskError::Inference(InferenceError::NonFinite { index: 1, .. })
        ));
    }

    #[test]
    fn test_predictions_are_bit_identical() {
        let service = PredictionService::with_artifacts(Arc::new(
            ArtifactDir::new("models")
                .load_artifacts()
                .expect("Demo artifacts should load"),
        ));

        let first = service.predict(&reference_case()).expect("Should predict");
        for _ in 0..10 {
            let again = service.predict(&reference_case()).expect("Should predict");
            assert_eq!(again.probability.to_bits(), first.probability.to_bits());
            assert_eq!(again.label, first.label);
        }
    }

    #[test]
    fn test_demo_artifacts_end_to_end() {
        let mut service = PredictionService::new();
        service
            .initialize(&ArtifactDir::new("models"))
            .expect("Demo artifacts should load");

        let low = service.predict(&reference_case()).expect("Should predict");
        assert_eq!(low.label, RiskClass::Class0);
        assert!((low.probability - 0.344_568_411_980_176_7).abs() < 1e-9);
        assert_eq!(low.probability_display(), "0.3446");

        let high = service.predict(&high_risk_case()).expect("Should predict");
        assert_eq!(high.label, RiskClass::Class1);
        assert!((high.probability - 0.695_355_054_302_422_8).abs() < 1e-9);
    }

    #[test]
    fn test_artifacts_shared_across_threads() {
        let service = Arc::new(PredictionService::with_artifacts(Arc::new(
            ArtifactDir::new("models")
                .load_artifacts()
                .expect("Demo artifacts should load"),
        )));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let svc = Arc::clone(&service);
                std::thread::spawn(move || svc.predict(&reference_case()).expect("predict"))
            })
            .collect();

        let expected = service.predict(&reference_case()).expect("predict");
        for h in handles {
            assert_eq!(h.join().expect("join"), expected);
        }
    }
}
