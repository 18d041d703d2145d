//! Prediction normalizer: one `(label, probability)` pair from any model.
//!
//! Models disagree on what they expose. The strategy is picked up front from
//! the declared capability set, in priority order:
//!
//! 1. class probabilities, reading the disease's positive slot
//! 2. sigmoid of the decision score
//! 3. the hard label itself (1.0 when positive, 0.0 otherwise)
//!
//! If the chosen routine fails at call time the next available strategy is
//! used. Failing to produce the label at all is a prediction failure.

use crate::domain::{normalize_probability, sigmoid};
use crate::ports::{Capabilities, Capability, Classifier, ModelError};

/// How the probability was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbabilityStrategy {
    ClassProbabilities { positive_index: usize },
    DecisionSigmoid,
    HardLabel,
}

impl ProbabilityStrategy {
    /// Best strategy the capability set allows.
    #[must_use]
    pub fn select(capabilities: Capabilities, positive_index: usize) -> Self {
        if capabilities.supports(Capability::PredictProba) {
            Self::ClassProbabilities { positive_index }
        } else {
            Self::after_probabilities(capabilities)
        }
    }

    /// Strategy to fall back to when this one fails.
    #[must_use]
    pub fn next(self, capabilities: Capabilities) -> Option<Self> {
        match self {
            Self::ClassProbabilities { .. } => Some(Self::after_probabilities(capabilities)),
            Self::DecisionSigmoid => Some(Self::HardLabel),
            Self::HardLabel => None,
        }
    }

    fn after_probabilities(capabilities: Capabilities) -> Self {
        if capabilities.supports(Capability::DecisionFunction) {
            Self::DecisionSigmoid
        } else {
            Self::HardLabel
        }
    }
}

impl std::fmt::Display for ProbabilityStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClassProbabilities { positive_index } => {
                write!(f, "predict_proba[{positive_index}]")
            }
            Self::DecisionSigmoid => write!(f, "sigmoid(decision_function)"),
            Self::HardLabel => write!(f, "hard_label"),
        }
    }
}

/// Normalized model output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedOutput {
    /// Raw class label from `predict`
    pub label: f64,

    /// Probability of the positive class, clamped to [0, 1] and rounded
    pub probability: f64,

    pub strategy: ProbabilityStrategy,
}

impl NormalizedOutput {
    /// A label is positive when it is non-zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.label != 0.0
    }
}

fn probability_with(
    model: &dyn Classifier,
    row: &[f64],
    strategy: ProbabilityStrategy,
    label: f64,
) -> Result<f64, ModelError> {
    match strategy {
        ProbabilityStrategy::ClassProbabilities { positive_index } => {
            let proba = model.predict_proba(row)?;
            proba
                .get(positive_index)
                .copied()
                .ok_or(ModelError::ClassIndexOutOfRange {
                    index: positive_index,
                    n_classes: proba.len(),
                })
        }
        ProbabilityStrategy::DecisionSigmoid => Ok(sigmoid(model.decision_function(row)?)),
        ProbabilityStrategy::HardLabel => Ok(if label != 0.0 { 1.0 } else { 0.0 }),
    }
}

/// Extract the label and positive-class probability for one row.
///
/// # Errors
/// Returns `ModelError` only when `predict` itself fails; probability
/// routines that fail degrade to the next strategy.
pub fn normalize(
    model: &dyn Classifier,
    row: &[f64],
    positive_index: usize,
) -> Result<NormalizedOutput, ModelError> {
    let label = model.predict(row)?;
    if !label.is_finite() {
        return Err(ModelError::NonFinite("class label"));
    }

    let capabilities = model.capabilities();
    let mut strategy = ProbabilityStrategy::select(capabilities, positive_index);
    loop {
        match probability_with(model, row, strategy, label) {
            Ok(raw) => {
                return Ok(NormalizedOutput {
                    label,
                    probability: normalize_probability(raw),
                    strategy,
                })
            }
            Err(e) => {
                let Some(next) = strategy.next(capabilities) else {
                    return Err(e);
                };
                tracing::warn!(
                    "{} failed on {} model: {}; falling back to {}",
                    strategy,
                    model.kind(),
                    e,
                    next
                );
                strategy = next;
            }
        }
    }
}
