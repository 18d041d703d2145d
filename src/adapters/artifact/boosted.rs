//! Gradient-boosted tree ensemble for the symptom-based general model.
//!
//! Multiclass softmax booster: every tree contributes a margin to one class,
//! margins are summed on top of `base_score` and turned into probabilities.

use serde::{Deserialize, Serialize};

use super::estimators::{Tree, TreeNode};
use crate::ports::{check_shape, ModelError, SymptomClassifier};

/// One boosted tree and the class whose margin it adds to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedTree {
    pub class: usize,
    pub nodes: Vec<TreeNode>,
}

/// Exported booster document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedBooster {
    pub format_version: u32,

    /// Disease names, indexed by class
    pub classes: Vec<String>,

    #[serde(default)]
    pub base_score: f64,

    /// Input width; checked against rows when present
    #[serde(default)]
    pub n_features: Option<usize>,

    pub trees: Vec<BoostedTree>,
}

/// Loaded booster.
#[derive(Debug, Clone)]
pub struct BoostedTrees {
    classes: Vec<String>,
    base_score: f64,
    n_features: Option<usize>,
    trees: Vec<(usize, Tree)>,
}

impl BoostedTrees {
    /// Validate an exported booster.
    ///
    /// # Errors
    /// Returns a reason string for the first structural defect.
    pub fn from_export(export: ExportedBooster) -> Result<Self, String> {
        if export.classes.len() < 2 {
            return Err(format!(
                "booster needs at least 2 classes, got {}",
                export.classes.len()
            ));
        }
        if !export.base_score.is_finite() {
            return Err("base_score must be finite".into());
        }
        if export.trees.is_empty() {
            return Err("booster has no trees".into());
        }

        let mut trees = Vec::with_capacity(export.trees.len());
        for (i, boosted) in export.trees.into_iter().enumerate() {
            if boosted.class >= export.classes.len() {
                return Err(format!("tree {i} targets unknown class {}", boosted.class));
            }
            let tree = Tree {
                nodes: boosted.nodes,
            };
            tree.validate(export.n_features, 1)
                .map_err(|e| format!("tree {i}: {e}"))?;
            trees.push((boosted.class, tree));
        }

        Ok(Self {
            classes: export.classes,
            base_score: export.base_score,
            n_features: export.n_features,
            trees,
        })
    }

    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Softmax probabilities per class.
    ///
    /// # Errors
    /// Returns `ModelError` if the row does not fit the trees.
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_shape(self.n_features, row)?;

        let mut margins = vec![self.base_score; self.classes.len()];
        for (class, tree) in &self.trees {
            margins[*class] += tree.leaf(row)?[0];
        }

        let max = margins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = margins.iter().map(|m| (m - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(ModelError::NonFinite("class margin"));
        }
        Ok(exp.into_iter().map(|e| e / total).collect())
    }
}

impl SymptomClassifier for BoostedTrees {
    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn predict_top(&self, row: &[f64]) -> Result<(String, f64), ModelError> {
        let proba = self.predict_proba(row)?;
        let (index, probability) = proba
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });
        Ok((self.classes[index].clone(), probability))
    }
}
