//! Exported scikit-learn scalers.

use serde::{Deserialize, Serialize};

use crate::domain::InferenceError;
use crate::ports::Scaler;

/// Fitted scaler parameters, tagged by scikit-learn estimator kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportedScaler {
    /// `StandardScaler`: `(x - mean_) / scale_`
    StandardScaler {
        feature_names: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    /// `MinMaxScaler`: `x * scale_ + min_`
    MinMaxScaler {
        feature_names: Vec<String>,
        min: Vec<f64>,
        scale: Vec<f64>,
    },
}

impl ExportedScaler {
    /// Check parameter shapes and values.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        let (names, offset, scale, offset_name) = match self {
            Self::StandardScaler {
                feature_names,
                mean,
                scale,
            } => (feature_names, mean, scale, "mean"),
            Self::MinMaxScaler {
                feature_names,
                min,
                scale,
            } => (feature_names, min, scale, "min"),
        };

        let n = names.len();
        if n == 0 {
            return Err("scaler has no features".into());
        }
        if offset.len() != n || scale.len() != n {
            return Err(format!(
                "scaler parameter lengths do not match feature_names ({n}): {offset_name}={}, scale={}",
                offset.len(),
                scale.len()
            ));
        }
        if let Some(i) = offset.iter().chain(scale.iter()).position(|v| !v.is_finite()) {
            return Err(format!("non-finite scaler parameter at position {i}"));
        }
        if matches!(self, Self::StandardScaler { .. }) {
            if let Some(i) = scale.iter().position(|&s| s == 0.0) {
                return Err(format!("zero scale for feature {}", names[i]));
            }
        }
        Ok(())
    }
}

impl Scaler for ExportedScaler {
    fn n_features(&self) -> usize {
        self.feature_names().len()
    }

    fn feature_names(&self) -> &[String] {
        match self {
            Self::StandardScaler { feature_names, .. } | Self::MinMaxScaler { feature_names, .. } => {
                feature_names
            }
        }
    }

    fn transform(&self, x: &[f64]) -> Result<Vec<f64>, InferenceError> {
        let n = self.n_features();
        if x.len() != n {
            return Err(InferenceError::ShapeMismatch {
                expected: n,
                actual: x.len(),
            });
        }

        let out: Vec<f64> = match self {
            Self::StandardScaler { mean, scale, .. } => x
                .iter()
                .zip(mean.iter().zip(scale.iter()))
                .map(|(v, (m, s))| (v - m) / s)
                .collect(),
            Self::MinMaxScaler { min, scale, .. } => x
                .iter()
                .zip(min.iter().zip(scale.iter()))
                .map(|(v, (m, s))| v * s + m)
                .collect(),
        };

        if let Some(index) = out.iter().position(|v| !v.is_finite()) {
            return Err(InferenceError::NonFinite {
                stage: "scaler",
                index,
            });
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    #[test]
    fn test_standard_scaler_transform() {
        let scaler = ExportedScaler::StandardScaler {
            feature_names: names(2),
            mean: vec![10.0, -1.0],
            scale: vec![2.0, 0.5],
        };
        let out = scaler.transform(&[14.0, 0.0]).expect("Should transform");
        assert_eq!(out, vec![2.0, 2.0]);
    }

    #[test]
    fn test_min_max_scaler_transform() {
        let scaler = ExportedScaler::MinMaxScaler {
            feature_names: names(2),
            min: vec![-0.5, 0.0],
            scale: vec![0.25, 0.1],
        };
        let out = scaler.transform(&[2.0, 5.0]).expect("Should transform");
        assert!((out[0] - 0.0).abs() < 1e-12);
        assert!((out[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        let scaler = ExportedScaler::StandardScaler {
            feature_names: names(3),
            mean: vec![0.0; 3],
            scale: vec![1.0; 3],
        };
        let err = scaler.transform(&[1.0, 2.0]).expect_err("Must fail");
        assert_eq!(
            err,
            InferenceError::ShapeMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_nan_input_reported() {
        let scaler = ExportedScaler::StandardScaler {
            feature_names: names(2),
            mean: vec![0.0; 2],
            scale: vec![1.0; 2],
        };
        let err = scaler.transform(&[1.0, f64::NAN]).expect_err("Must fail");
        assert!(matches!(err, InferenceError::NonFinite { index: 1, .. }));
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let zero_scale = ExportedScaler::StandardScaler {
            feature_names: names(2),
            mean: vec![0.0; 2],
            scale: vec![1.0, 0.0],
        };
        assert!(zero_scale.validate().unwrap_err().contains("zero scale"));

        let short = ExportedScaler::MinMaxScaler {
            feature_names: names(3),
            min: vec![0.0; 2],
            scale: vec![1.0; 3],
        };
        assert!(short.validate().is_err());

        let empty = ExportedScaler::StandardScaler {
            feature_names: vec![],
            mean: vec![],
            scale: vec![],
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_parse_tagged_json() {
        let json = r#"{"kind":"standard_scaler","feature_names":["a"],"mean":[1.0],"scale":[2.0]}"#;
        let scaler: ExportedScaler = serde_json::from_str(json).expect("Should parse");
        assert!(matches!(scaler, ExportedScaler::StandardScaler { .. }));
        assert!(scaler.validate().is_ok());
    }
}
