//! Classifier port: Trait for pre-trained predictive models.
//!
//! Models differ in what they can do: some expose calibrated class
//! probabilities, some only a decision score, some only hard labels. The
//! capability set is declared by each implementation and queried before use.

/// One prediction routine a model may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Predict,
    PredictProba,
    DecisionFunction,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Predict => write!(f, "predict"),
            Self::PredictProba => write!(f, "predict_proba"),
            Self::DecisionFunction => write!(f, "decision_function"),
        }
    }
}

/// Set of capabilities exposed by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    predict: bool,
    predict_proba: bool,
    decision_function: bool,
}

impl Capabilities {
    /// Empty set.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            predict: false,
            predict_proba: false,
            decision_function: false,
        }
    }

    /// Add a capability.
    #[must_use]
    pub fn with(mut self, capability: Capability) -> Self {
        match capability {
            Capability::Predict => self.predict = true,
            Capability::PredictProba => self.predict_proba = true,
            Capability::DecisionFunction => self.decision_function = true,
        }
        self
    }

    #[must_use]
    pub const fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Predict => self.predict,
            Capability::PredictProba => self.predict_proba,
            Capability::DecisionFunction => self.decision_function,
        }
    }
}

impl std::fmt::Display for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = [
            Capability::Predict,
            Capability::PredictProba,
            Capability::DecisionFunction,
        ]
        .into_iter()
        .filter(|c| self.supports(*c))
        .map(|c| c.to_string())
        .collect();

        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join("+"))
        }
    }
}

/// Failures raised by a model while predicting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Model does not support {0}")]
    Unsupported(Capability),

    #[error("Feature count mismatch: got {got}, expected {expected}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Class index {index} out of range for {n_classes} classes")]
    ClassIndexOutOfRange { index: usize, n_classes: usize },

    #[error("Model produced a non-finite {0}")]
    NonFinite(&'static str),

    #[error("Malformed model: {0}")]
    Malformed(String),
}

/// Trait for a loaded binary/multiclass classifier.
///
/// Rows passed in are already scaled when the artifact carries a scaler.
/// Implementations must return `ModelError::Unsupported` for routines not in
/// their capability set; the default methods do exactly that.
pub trait Classifier: Send + Sync {
    /// Short model family name for logs (e.g. `logistic_regression`).
    fn kind(&self) -> &'static str;

    /// Routines this model exposes.
    fn capabilities(&self) -> Capabilities;

    /// Expected row length, or `None` when any length is accepted.
    fn n_features(&self) -> Option<usize>;

    /// Predict the class label for one row.
    ///
    /// # Errors
    /// Returns `ModelError` if the row does not fit the model.
    fn predict(&self, row: &[f64]) -> Result<f64, ModelError>;

    /// Class probabilities for one row, indexed by class.
    ///
    /// # Errors
    /// Returns `ModelError::Unsupported` unless overridden.
    fn predict_proba(&self, _row: &[f64]) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::Unsupported(Capability::PredictProba))
    }

    /// Unbounded decision score for the positive class.
    ///
    /// # Errors
    /// Returns `ModelError::Unsupported` unless overridden.
    fn decision_function(&self, _row: &[f64]) -> Result<f64, ModelError> {
        Err(ModelError::Unsupported(Capability::DecisionFunction))
    }
}

/// Trait for the symptom-based general model.
///
/// Multiclass over disease names; only the top class is reported.
pub trait SymptomClassifier: Send + Sync {
    /// Expected row length (symptom vocabulary size), if fixed.
    fn n_features(&self) -> Option<usize>;

    /// Top predicted disease and its probability.
    ///
    /// # Errors
    /// Returns `ModelError` if the row does not fit the model.
    fn predict_top(&self, row: &[f64]) -> Result<(String, f64), ModelError>;
}

/// Check a row against a model's expected length.
///
/// # Errors
/// Returns `ModelError::ShapeMismatch` on a length difference.
pub fn check_shape(expected: Option<usize>, row: &[f64]) -> Result<(), ModelError> {
    match expected {
        Some(expected) if expected != row.len() => Err(ModelError::ShapeMismatch {
            expected,
            got: row.len(),
        }),
        _ => Ok(()),
    }
}
