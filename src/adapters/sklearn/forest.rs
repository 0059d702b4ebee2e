//! Exported scikit-learn random forest.
//!
//! Each tree is the flattened `tree_` structure of a fitted
//! `DecisionTreeClassifier`: parallel arrays indexed by node id.

use serde::{Deserialize, Serialize};

use crate::domain::InferenceError;
use crate::ports::Classifier;

/// Marker scikit-learn uses for "no child".
const TREE_LEAF: i64 = -1;

/// One fitted decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights (counts or fractions) for classes `[0, 1]`
    pub value: Vec<[f64; 2]>,
}

impl ExportedTree {
    fn n_nodes(&self) -> usize {
        self.children_left.len()
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        let n = self.n_nodes();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(format!("tree arrays disagree on node count ({n})"));
        }

        for node in 0..n {
            let left = self.children_left[node];
            let right = self.children_right[node];

            if left == TREE_LEAF || right == TREE_LEAF {
                if left != right {
                    return Err(format!("node {node} has exactly one child"));
                }
                let [a, b] = self.value[node];
                if !(a.is_finite() && b.is_finite()) || a < 0.0 || b < 0.0 || a + b <= 0.0 {
                    return Err(format!("leaf {node} has invalid class weights"));
                }
                continue;
            }

            // Children are always numbered after their parent, so traversal terminates.
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {node} has out-of-range child {child}"));
                }
            }
            let f = self.feature[node];
            if f < 0 || f as usize >= n_features {
                return Err(format!("node {node} splits on unknown feature {f}"));
            }
            if self.threshold[node].is_nan() {
                return Err(format!("node {node} has NaN threshold"));
            }
        }
        Ok(())
    }

    /// Normalized class distribution at the leaf reached by `x`.
    fn leaf_proba(&self, x: &[f64]) -> [f64; 2] {
        let mut node = 0usize;
        while self.children_left[node] != TREE_LEAF {
            // Trees are evaluated on float32 inputs, as fitted.
            let v = f64::from(x[self.feature[node] as usize] as f32);
            node = if v <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }

        let [a, b] = self.value[node];
        let total = a + b;
        [a / total, b / total]
    }
}

/// Fitted `RandomForestClassifier` over two classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedForest {
    pub n_features: usize,
    pub classes: Vec<i64>,
    pub trees: Vec<ExportedTree>,
}

impl ExportedForest {
    /// Check structure before any prediction is made.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 {
            return Err("forest declares zero features".into());
        }
        if self.classes != [0, 1] {
            return Err(format!(
                "expected binary classes [0, 1], got {:?}",
                self.classes
            ));
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}

impl Classifier for ExportedForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: &[f64]) -> Result<[f64; 2], InferenceError> {
        if x.len() != self.n_features {
            return Err(InferenceError::ShapeMismatch {
                expected: self.n_features,
                actual: x.len(),
            });
        }
        // Splits compare in float32, so values beyond f32::MAX count as infinite.
        if let Some(index) = x
            .iter()
            .position(|&v| !v.is_finite() || !(v as f32).is_finite())
        {
            return Err(InferenceError::NonFinite {
                stage: "classifier input",
                index,
            });
        }
        if self.trees.is_empty() {
            return Err(InferenceError::Evaluation("forest has no trees".into()));
        }

        let mut sum = [0.0_f64; 2];
        for tree in &self.trees {
            let [p0, p1] = tree.leaf_proba(x);
            sum[0] += p0;
            sum[1] += p1;
        }

        let n = self.trees.len() as f64;
        Ok([sum[0] / n, sum[1] / n])
    }
}

/// Fitted classifier, tagged by scikit-learn estimator kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportedClassifier {
    RandomForest(ExportedForest),
}

impl ExportedClassifier {
    /// # Errors
    /// Returns a description of the first structural problem found.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::RandomForest(forest) => forest.validate(),
        }
    }

    #[must_use]
    pub fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            Self::RandomForest(forest) => Box::new(forest),
        }
    }
}
