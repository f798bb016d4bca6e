// Gradient Boosted Classifier Artifact

use super::features::{FEATURE_COUNT, FEATURE_NAMES};
use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

/// Artifact layout version understood by this build.
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Child index marking a leaf node.
pub const TREE_LEAF: i64 = -1;

/// Single-sample binary classifier shared by every request.
///
/// Implementations must be immutable after construction; the server calls
/// `predict` concurrently without any locking.
pub trait Classifier: Send + Sync {
    /// Predicts the class label for one feature vector.
    fn predict(&self, features: &[f64]) -> Result<i64>;

    /// Describes the loaded model.
    fn summary(&self) -> ModelSummary;
}

/// Human-readable description of a loaded model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub n_features: usize,
    pub n_trees: usize,
    pub classes: [i64; 2],
    pub learning_rate: f64,
    /// Hex SHA-256 of the artifact bytes, when loaded from disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// One boosting stage, stored as parallel per-node arrays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    /// Split feature per node, ignored on leaves
    pub feature: Vec<i64>,
    /// Split threshold per node, ignored on leaves
    pub threshold: Vec<f64>,
    /// Leaf output per node
    pub value: Vec<f64>,
}

impl RegressionTree {
    /// A tree with a single leaf.
    pub fn leaf(value: f64) -> Self {
        Self {
            children_left: vec![TREE_LEAF],
            children_right: vec![TREE_LEAF],
            feature: vec![-2],
            threshold: vec![-2.0],
            value: vec![value],
        }
    }

    /// A depth-one tree splitting on one feature.
    pub fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Self {
        Self {
            children_left: vec![1, TREE_LEAF, TREE_LEAF],
            children_right: vec![2, TREE_LEAF, TREE_LEAF],
            feature: vec![feature as i64, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![0.0, left, right],
        }
    }

    fn validate(&self, index: usize, n_features: usize) -> Result<()> {
        let n = self.value.len();
        let lengths = [
            self.children_left.len(),
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
        ];
        if n == 0 || lengths.iter().any(|&len| len != n) {
            return Err(PredictorError::ModelFormat(format!(
                "tree {}: node arrays must be non-empty and of equal length",
                index
            )));
        }

        for node in 0..n {
            let left = self.children_left[node];
            let right = self.children_right[node];

            if left == TREE_LEAF {
                if right != TREE_LEAF {
                    return Err(PredictorError::ModelFormat(format!(
                        "tree {} node {}: leaf has a right child",
                        index, node
                    )));
                }
                if !self.value[node].is_finite() {
                    return Err(PredictorError::ModelFormat(format!(
                        "tree {} node {}: leaf value is not finite",
                        index, node
                    )));
                }
                continue;
            }

            // Children always follow their parent, which rules out cycles.
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(PredictorError::ModelFormat(format!(
                        "tree {} node {}: child index {} out of range",
                        index, node, child
                    )));
                }
            }

            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(PredictorError::ModelFormat(format!(
                    "tree {} node {}: split feature {} out of range",
                    index, node, feature
                )));
            }

            if !self.threshold[node].is_finite() {
                return Err(PredictorError::ModelFormat(format!(
                    "tree {} node {}: threshold is not finite",
                    index, node
                )));
            }
        }

        Ok(())
    }

    /// Walks from the root to a leaf and returns its value.
    ///
    /// Node arrays that skipped [`GradientBoostingClassifier::validate`] yield
    /// `ModelFormat` instead of indexing out of bounds. A walk longer than the
    /// node count means the tree has a cycle.
    fn evaluate(&self, features: &[f64]) -> Result<f64> {
        let broken = |node: usize| {
            PredictorError::ModelFormat(format!("tree walk reached malformed node {}", node))
        };

        let mut node = 0usize;
        for _ in 0..=self.value.len() {
            let left = *self.children_left.get(node).ok_or_else(|| broken(node))?;
            if left == TREE_LEAF {
                return self.value.get(node).copied().ok_or_else(|| broken(node));
            }

            let right = *self.children_right.get(node).ok_or_else(|| broken(node))?;
            let threshold = *self.threshold.get(node).ok_or_else(|| broken(node))?;
            let x = self
                .feature
                .get(node)
                .and_then(|&f| usize::try_from(f).ok())
                .and_then(|f| features.get(f))
                .ok_or_else(|| broken(node))?;

            // Split thresholds were learned on single-precision inputs.
            let next = if (*x as f32 as f64) <= threshold { left } else { right };
            node = usize::try_from(next).map_err(|_| broken(node))?;
        }

        Err(PredictorError::ModelFormat(
            "tree walk does not reach a leaf".to_string(),
        ))
    }
}

/// Serialized gradient boosted classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    pub format_version: u32,
    pub n_features: usize,
    /// Training-time feature order, checked against the engineered order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    /// Negative then positive class label
    pub classes: Vec<i64>,
    pub learning_rate: f64,
    /// Log-odds of the prior, added before the boosting stages
    pub init_raw_score: f64,
    pub trees: Vec<RegressionTree>,
    #[serde(skip)]
    fingerprint: Option<String>,
}

impl GradientBoostingClassifier {
    /// Creates a classifier over the standard feature order.
    pub fn new(
        classes: [i64; 2],
        learning_rate: f64,
        init_raw_score: f64,
        trees: Vec<RegressionTree>,
    ) -> Self {
        Self {
            format_version: SUPPORTED_FORMAT_VERSION,
            n_features: FEATURE_COUNT,
            feature_names: Some(FEATURE_NAMES.iter().map(|n| n.to_string()).collect()),
            classes: classes.to_vec(),
            learning_rate,
            init_raw_score,
            trees,
            fingerprint: None,
        }
    }

    /// Loads and validates an artifact from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let path_str = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| PredictorError::ModelLoad {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;

        let mut model = Self::from_slice(&bytes).map_err(|e| match e {
            PredictorError::Serialization(reason) => PredictorError::ModelLoad {
                path: path_str.clone(),
                reason,
            },
            other => other,
        })?;
        model.fingerprint = Some(hex::encode(Sha256::digest(&bytes)));

        info!(
            path = %path.display(),
            trees = model.trees.len(),
            fingerprint = model.fingerprint.as_deref().unwrap_or_default(),
            "Model artifact loaded"
        );
        Ok(model)
    }

    /// Parses and validates an in-memory artifact.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let model: Self = serde_json::from_slice(bytes)?;
        model.validate()?;
        Ok(model)
    }

    /// Checks the artifact is usable by this service.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(PredictorError::IncompatibleModel(format!(
                "format version {} is not supported (expected {})",
                self.format_version, SUPPORTED_FORMAT_VERSION
            )));
        }

        if self.n_features != FEATURE_COUNT {
            return Err(PredictorError::IncompatibleModel(format!(
                "model expects {} features, service produces {}",
                self.n_features, FEATURE_COUNT
            )));
        }

        if let Some(names) = &self.feature_names {
            if !names.iter().map(String::as_str).eq(FEATURE_NAMES) {
                return Err(PredictorError::IncompatibleModel(format!(
                    "feature order {:?} does not match {:?}",
                    names, FEATURE_NAMES
                )));
            }
        }

        if self.classes.len() != 2 {
            return Err(PredictorError::IncompatibleModel(format!(
                "binary classifier required, artifact has {} classes",
                self.classes.len()
            )));
        }

        if !self.learning_rate.is_finite() || !self.init_raw_score.is_finite() {
            return Err(PredictorError::ModelFormat(
                "learning rate and initial score must be finite".to_string(),
            ));
        }

        if self.trees.is_empty() {
            return Err(PredictorError::ModelFormat("artifact contains no trees".to_string()));
        }

        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(index, self.n_features)?;
        }

        debug!(trees = self.trees.len(), "Model artifact validated");
        Ok(())
    }

    /// Raw additive score (log-odds of the positive class).
    pub fn decision_function(&self, features: &[f64]) -> Result<f64> {
        self.check_input(features)?;
        let mut stages = 0.0;
        for tree in &self.trees {
            stages += tree.evaluate(features)?;
        }
        Ok(self.init_raw_score + self.learning_rate * stages)
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        let raw = self.decision_function(features)?;
        Ok(1.0 / (1.0 + (-raw).exp()))
    }

    /// SHA-256 of the artifact bytes this model was loaded from.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    fn check_input(&self, features: &[f64]) -> Result<()> {
        if features.len() != self.n_features {
            return Err(PredictorError::Inference(format!(
                "expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }
        if let Some(idx) = features.iter().position(|v| !v.is_finite()) {
            return Err(PredictorError::Inference(format!(
                "input contains a non-finite value at position {}",
                idx
            )));
        }
        if let Some(idx) = features.iter().position(|v| v.abs() > f32::MAX as f64) {
            return Err(PredictorError::Inference(format!(
                "input value at position {} is too large for single precision",
                idx
            )));
        }
        Ok(())
    }
}

impl Classifier for GradientBoostingClassifier {
    fn predict(&self, features: &[f64]) -> Result<i64> {
        let raw = self.decision_function(features)?;
        let label = if raw > 0.0 {
            self.classes.get(1)
        } else {
            self.classes.first()
        };
        label.copied().ok_or_else(|| {
            PredictorError::IncompatibleModel(format!(
                "binary classifier required, artifact has {} classes",
                self.classes.len()
            ))
        })
    }

    fn summary(&self) -> ModelSummary {
        ModelSummary {
            n_features: self.n_features,
            n_trees: self.trees.len(),
            classes: [
                self.classes.first().copied().unwrap_or_default(),
                self.classes.get(1).copied().unwrap_or_default(),
            ],
            learning_rate: self.learning_rate,
            fingerprint: self.fingerprint.clone(),
        }
    }
}
