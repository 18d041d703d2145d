//! Model store port: Trait for resolving model artifacts.
//!
//! This trait abstracts where and how trained models are persisted from the
//! application logic. Missing and corrupt artifacts are reported as distinct
//! errors so the loader can log them at different levels.

use crate::domain::DiseaseSpec;

use super::classifier::{Classifier, ModelError, SymptomClassifier};

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Model artifact not found at {0}")]
    NotFound(String),

    #[error("Failed to read model artifact {location}: {message}")]
    Io { location: String, message: String },

    #[error("Failed to parse model artifact {location}: {message}")]
    Parse { location: String, message: String },

    #[error("Unsupported artifact format version {version} in {location}")]
    UnsupportedVersion { location: String, version: u32 },

    #[error("Invalid model artifact {location}: {reason}")]
    Invalid { location: String, reason: String },
}

impl ArtifactError {
    /// Whether the artifact is simply absent (as opposed to unusable).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Standard scaler paired with a model: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Scaler {
    /// Create a scaler. Zero scale entries are treated as 1 (constant columns).
    ///
    /// # Errors
    /// Returns a reason string if the vectors differ in length or hold
    /// non-finite values.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, String> {
        if mean.len() != scale.len() {
            return Err(format!(
                "scaler mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            ));
        }
        if mean.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            return Err("scaler parameters must be finite".into());
        }
        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();
        Ok(Self { mean, scale })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Scale one row.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the row length differs.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        if row.len() != self.mean.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.mean.len(),
                got: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }
}

/// A deserialized artifact ready for prediction.
pub struct LoadedArtifact {
    /// Scaler applied before every model call, if the artifact paired one
    pub scaler: Option<Scaler>,

    pub classifier: Box<dyn Classifier>,

    /// SHA-256 of the artifact bytes (hex)
    pub fingerprint: String,
}

impl std::fmt::Debug for LoadedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedArtifact")
            .field("scaler", &self.scaler.is_some())
            .field("classifier", &self.classifier.kind())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Trait for artifact storage.
pub trait ModelStore: Send + Sync {
    /// Human-readable location of an artifact (for logs and health checks).
    fn location(&self, artifact: &str) -> String;

    /// Whether the artifact is present.
    fn exists(&self, artifact: &str) -> bool;

    /// Load the classifier for a clinical disease.
    ///
    /// # Errors
    /// Returns `ArtifactError::NotFound` when absent, another variant when the
    /// artifact cannot be read, parsed or validated against `spec`.
    fn load(&self, spec: &DiseaseSpec) -> Result<LoadedArtifact, ArtifactError>;

    /// Load the symptom-based general model.
    ///
    /// # Errors
    /// Same contract as `load`.
    fn load_symptom_model(
        &self,
        artifact: &str,
    ) -> Result<Box<dyn SymptomClassifier>, ArtifactError>;
}
