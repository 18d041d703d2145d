//! Estimator families supported by exported artifacts.
//!
//! Each family evaluates the parameters written by the Python export step and
//! declares which prediction routines it can serve.

use serde::{Deserialize, Serialize};

use crate::domain::sigmoid;
use crate::ports::{check_shape, Capabilities, Capability, Classifier, ModelError};

fn dot(coefficients: &[f64], row: &[f64], intercept: f64) -> f64 {
    coefficients
        .iter()
        .zip(row.iter())
        .map(|(w, x)| w * x)
        .sum::<f64>()
        + intercept
}

fn validate_linear(coefficients: &[f64], intercept: f64) -> Result<(), String> {
    if coefficients.is_empty() {
        return Err("linear model has no coefficients".into());
    }
    if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
        return Err("linear model parameters must be finite".into());
    }
    Ok(())
}

/// Binary logistic regression: labels, probabilities and decision scores.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    /// # Errors
    /// Returns a reason string if the parameters are empty or non-finite.
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self, String> {
        validate_linear(&coefficients, intercept)?;
        Ok(Self {
            coefficients,
            intercept,
        })
    }
}

impl Classifier for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::none()
            .with(Capability::Predict)
            .with(Capability::PredictProba)
            .with(Capability::DecisionFunction)
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict(&self, row: &[f64]) -> Result<f64, ModelError> {
        let score = self.decision_function(row)?;
        Ok(if score > 0.0 { 1.0 } else { 0.0 })
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        let p = sigmoid(self.decision_function(row)?);
        Ok(vec![1.0 - p, p])
    }

    fn decision_function(&self, row: &[f64]) -> Result<f64, ModelError> {
        check_shape(self.n_features(), row)?;
        let score = dot(&self.coefficients, row, self.intercept);
        if !score.is_finite() {
            return Err(ModelError::NonFinite("decision score"));
        }
        Ok(score)
    }
}

/// Linear SVM without probability calibration: labels and decision scores.
#[derive(Debug, Clone)]
pub struct LinearSvm {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearSvm {
    /// # Errors
    /// Returns a reason string if the parameters are empty or non-finite.
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self, String> {
        validate_linear(&coefficients, intercept)?;
        Ok(Self {
            coefficients,
            intercept,
        })
    }
}

impl Classifier for LinearSvm {
    fn kind(&self) -> &'static str {
        "linear_svm"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::none()
            .with(Capability::Predict)
            .with(Capability::DecisionFunction)
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict(&self, row: &[f64]) -> Result<f64, ModelError> {
        let score = self.decision_function(row)?;
        Ok(if score > 0.0 { 1.0 } else { 0.0 })
    }

    fn decision_function(&self, row: &[f64]) -> Result<f64, ModelError> {
        check_shape(self.n_features(), row)?;
        let score = dot(&self.coefficients, row, self.intercept);
        if !score.is_finite() {
            return Err(ModelError::NonFinite("decision score"));
        }
        Ok(score)
    }
}

/// One node of an exported decision tree.
///
/// Split nodes send a row left when `row[feature] <= threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// Decision tree stored as a flat node array rooted at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Check structure: children point strictly forward (so every walk
    /// terminates), split features fit the row, leaves have `leaf_width`
    /// finite entries.
    ///
    /// # Errors
    /// Returns a reason string describing the first defect.
    pub fn validate(&self, n_features: Option<usize>, leaf_width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *left <= i || *right <= i || *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(format!("node {i} has out-of-order children"));
                    }
                    if n_features.is_some_and(|n| *feature >= n) {
                        return Err(format!("node {i} splits on missing feature {feature}"));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {i} has a NaN threshold"));
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != leaf_width {
                        return Err(format!(
                            "leaf {i} has {} values, expected {leaf_width}",
                            value.len()
                        ));
                    }
                    if value.iter().any(|v| !v.is_finite()) {
                        return Err(format!("leaf {i} has non-finite values"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk the tree for one row and return the reached leaf's values.
    ///
    /// # Errors
    /// Returns `ModelError::Malformed` if the walk leaves the node array
    /// (only possible for trees that skipped validation).
    pub fn leaf(&self, row: &[f64]) -> Result<&[f64], ModelError> {
        let mut index = 0;
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(value.as_slice()),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = row.get(*feature).copied().ok_or_else(|| {
                        ModelError::Malformed(format!("split on missing feature {feature}"))
                    })?;
                    index = if x <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ModelError::Malformed(format!("dangling node index {index}")))
                }
            }
        }
        Err(ModelError::Malformed("tree walk did not terminate".into()))
    }
}

/// How a forest combines its trees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Voting {
    /// Average per-tree class distributions (exposes `predict_proba`)
    #[default]
    Soft,
    /// Majority of per-tree labels (labels only)
    Hard,
}

/// Random forest classifier over class-weight leaves.
#[derive(Debug, Clone)]
pub struct RandomForest {
    n_features: usize,
    n_classes: usize,
    voting: Voting,
    trees: Vec<Tree>,
}

impl RandomForest {
    /// # Errors
    /// Returns a reason string if the forest is empty or any tree is invalid.
    pub fn new(
        n_features: usize,
        n_classes: usize,
        voting: Voting,
        trees: Vec<Tree>,
    ) -> Result<Self, String> {
        if n_classes < 2 {
            return Err(format!("forest needs at least 2 classes, got {n_classes}"));
        }
        if trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (i, tree) in trees.iter().enumerate() {
            tree.validate(Some(n_features), n_classes)
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(Self {
            n_features,
            n_classes,
            voting,
            trees,
        })
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn tree_distribution(leaf: &[f64]) -> Vec<f64> {
        let total: f64 = leaf.iter().sum();
        if total > 0.0 {
            leaf.iter().map(|v| v / total).collect()
        } else {
            vec![1.0 / leaf.len() as f64; leaf.len()]
        }
    }

    fn argmax(values: &[f64]) -> usize {
        // First maximum wins, matching numpy's argmax tie-breaking.
        values
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, v)| {
                if *v > best.1 {
                    (i, *v)
                } else {
                    best
                }
            })
            .0
    }

    fn averaged(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        let mut sum = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let dist = Self::tree_distribution(tree.leaf(row)?);
            for (acc, p) in sum.iter_mut().zip(dist) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        Ok(sum.into_iter().map(|s| s / n).collect())
    }

    fn votes(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        let mut votes = vec![0.0; self.n_classes];
        for tree in &self.trees {
            votes[Self::argmax(tree.leaf(row)?)] += 1.0;
        }
        Ok(votes)
    }
}

impl Classifier for RandomForest {
    fn kind(&self) -> &'static str {
        "random_forest"
    }

    fn capabilities(&self) -> Capabilities {
        let caps = Capabilities::none().with(Capability::Predict);
        match self.voting {
            Voting::Soft => caps.with(Capability::PredictProba),
            Voting::Hard => caps,
        }
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn predict(&self, row: &[f64]) -> Result<f64, ModelError> {
        check_shape(self.n_features(), row)?;
        let scores = match self.voting {
            Voting::Soft => self.averaged(row)?,
            Voting::Hard => self.votes(row)?,
        };
        Ok(Self::argmax(&scores) as f64)
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        if self.voting == Voting::Hard {
            return Err(ModelError::Unsupported(Capability::PredictProba));
        }
        check_shape(self.n_features(), row)?;
        self.averaged(row)
    }
}
