//! File-backed model store.
//!
//! Artifacts are JSON documents exported from the training notebooks, one
//! per disease, stored flat in a model directory. A document pairs an
//! optional standard scaler with one estimator:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "feature_names": ["Pregnancies", "Glucose", "..."],
//!   "scaler": { "mean": [..], "scale": [..] },
//!   "estimator": { "kind": "logistic_regression", "coef": [..], "intercept": 0.1 }
//! }
//! ```
//!
//! Every artifact is checked against the disease contract before it is
//! handed to the application: column names and order, input width, and the
//! positive class index when the estimator produces probabilities.

mod boosted;
mod estimators;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::DiseaseSpec;
use crate::ports::{
    ArtifactError, Capability, Classifier, LoadedArtifact, ModelStore, Scaler, SymptomClassifier,
};

pub use boosted::{BoostedTree, BoostedTrees, ExportedBooster};
pub use estimators::{LinearSvm, LogisticRegression, RandomForest, Tree, TreeNode, Voting};

/// Artifact format understood by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Sanity cap on model width.
const MAX_FEATURES: usize = 4096;

/// Scaler parameters as exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Estimator parameters as exported, tagged by family.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportedEstimator {
    LogisticRegression {
        coef: Vec<f64>,
        intercept: f64,
    },
    LinearSvm {
        coef: Vec<f64>,
        intercept: f64,
    },
    RandomForest {
        n_features: usize,
        n_classes: usize,
        #[serde(default)]
        voting: Voting,
        trees: Vec<Tree>,
    },
}

/// Exported clinical model document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedModel {
    pub format_version: u32,

    /// Training column names, in order
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,

    #[serde(default)]
    pub scaler: Option<ExportedScaler>,

    pub estimator: ExportedEstimator,
}

/// Parsed and structurally valid artifact, not yet checked against a disease.
pub struct ParsedModel {
    pub feature_names: Option<Vec<String>>,
    pub scaler: Option<Scaler>,
    pub classifier: Box<dyn Classifier>,
    /// Number of classes for estimators with a probability output
    pub n_classes: Option<usize>,
}

fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse a clinical artifact and build its estimator.
///
/// # Errors
/// Returns `ArtifactError::Parse` for malformed JSON, `UnsupportedVersion`
/// for other format versions and `Invalid` for structural defects.
pub fn parse_model(location: &str, bytes: &[u8]) -> Result<ParsedModel, ArtifactError> {
    let export: ExportedModel =
        serde_json::from_slice(bytes).map_err(|e| ArtifactError::Parse {
            location: location.to_string(),
            message: e.to_string(),
        })?;
    if export.format_version != FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion {
            location: location.to_string(),
            version: export.format_version,
        });
    }

    let invalid = |reason: String| ArtifactError::Invalid {
        location: location.to_string(),
        reason,
    };

    let scaler = export
        .scaler
        .map(|s| Scaler::new(s.mean, s.scale))
        .transpose()
        .map_err(invalid)?;

    let (classifier, n_classes): (Box<dyn Classifier>, Option<usize>) = match export.estimator {
        ExportedEstimator::LogisticRegression { coef, intercept } => (
            Box::new(LogisticRegression::new(coef, intercept).map_err(invalid)?),
            Some(2),
        ),
        ExportedEstimator::LinearSvm { coef, intercept } => {
            (Box::new(LinearSvm::new(coef, intercept).map_err(invalid)?), None)
        }
        ExportedEstimator::RandomForest {
            n_features,
            n_classes,
            voting,
            trees,
        } => {
            let forest = RandomForest::new(n_features, n_classes, voting, trees).map_err(invalid)?;
            let classes = (voting == Voting::Soft).then_some(forest.n_classes());
            (Box::new(forest), classes)
        }
    };

    let width = classifier.n_features().unwrap_or(0);
    if width == 0 || width > MAX_FEATURES {
        return Err(invalid(format!(
            "Invalid feature count in model: got {width}, max {MAX_FEATURES}"
        )));
    }
    if let Some(scaler) = &scaler {
        if scaler.len() != width {
            return Err(invalid(format!(
                "scaler has {} columns but estimator expects {width}",
                scaler.len()
            )));
        }
    }
    if let Some(names) = &export.feature_names {
        if names.len() != width {
            return Err(invalid(format!(
                "feature_names has {} entries but estimator expects {width}",
                names.len()
            )));
        }
    }

    Ok(ParsedModel {
        feature_names: export.feature_names,
        scaler,
        classifier,
        n_classes,
    })
}

/// Check a parsed artifact against the disease it is loaded for.
///
/// # Errors
/// Returns `ArtifactError::Invalid` describing the first mismatch.
pub fn check_contract(
    location: &str,
    parsed: &ParsedModel,
    spec: &DiseaseSpec,
) -> Result<(), ArtifactError> {
    let invalid = |reason: String| ArtifactError::Invalid {
        location: location.to_string(),
        reason,
    };

    let expected = spec.n_features();
    let width = parsed.classifier.n_features().unwrap_or(0);
    if width != expected {
        return Err(invalid(format!(
            "{} model expects {width} features, contract has {expected}",
            spec.disease
        )));
    }

    if let Some(names) = &parsed.feature_names {
        let columns = spec.columns();
        if let Some((i, (got, want))) = names
            .iter()
            .zip(columns.iter())
            .enumerate()
            .find(|(_, (got, want))| got.as_str() != **want)
        {
            return Err(invalid(format!(
                "column {i} is '{got}', contract expects '{want}'"
            )));
        }
    }

    if parsed
        .classifier
        .capabilities()
        .supports(Capability::PredictProba)
    {
        if let Some(n_classes) = parsed.n_classes {
            if spec.positive_class_index >= n_classes {
                return Err(invalid(format!(
                    "positive class index {} out of range for {n_classes} classes",
                    spec.positive_class_index
                )));
            }
        }
    }
    Ok(())
}

/// Parse the symptom-based booster.
///
/// # Errors
/// Same contract as `parse_model`.
pub fn parse_booster(location: &str, bytes: &[u8]) -> Result<BoostedTrees, ArtifactError> {
    let export: ExportedBooster =
        serde_json::from_slice(bytes).map_err(|e| ArtifactError::Parse {
            location: location.to_string(),
            message: e.to_string(),
        })?;
    if export.format_version != FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion {
            location: location.to_string(),
            version: export.format_version,
        });
    }
    BoostedTrees::from_export(export).map_err(|reason| ArtifactError::Invalid {
        location: location.to_string(),
        reason,
    })
}

/// Model store over a directory of JSON artifacts.
#[derive(Debug, Clone)]
pub struct FileModelStore {
    root: PathBuf,
}

impl FileModelStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, artifact: &str) -> PathBuf {
        self.root.join(artifact)
    }

    fn read(&self, artifact: &str) -> Result<(String, Vec<u8>), ArtifactError> {
        let path = self.path(artifact);
        let location = path.display().to_string();
        if !path.is_file() {
            return Err(ArtifactError::NotFound(location));
        }
        let bytes = std::fs::read(&path).map_err(|e| ArtifactError::Io {
            location: location.clone(),
            message: e.to_string(),
        })?;
        Ok((location, bytes))
    }
}

impl ModelStore for FileModelStore {
    fn location(&self, artifact: &str) -> String {
        self.path(artifact).display().to_string()
    }

    fn exists(&self, artifact: &str) -> bool {
        self.path(artifact).is_file()
    }

    fn load(&self, spec: &DiseaseSpec) -> Result<LoadedArtifact, ArtifactError> {
        let (location, bytes) = self.read(spec.artifact)?;
        let parsed = parse_model(&location, &bytes)?;
        check_contract(&location, &parsed, spec)?;

        let fingerprint = sha256_hex_bytes(&bytes);
        tracing::info!(
            "Loaded {} model from {} (kind={}, capabilities={}, scaler={}, sha256={})",
            spec.disease,
            location,
            parsed.classifier.kind(),
            parsed.classifier.capabilities(),
            parsed.scaler.is_some(),
            &fingerprint[..12]
        );

        Ok(LoadedArtifact {
            scaler: parsed.scaler,
            classifier: parsed.classifier,
            fingerprint,
        })
    }

    fn load_symptom_model(
        &self,
        artifact: &str,
    ) -> Result<Box<dyn SymptomClassifier>, ArtifactError> {
        let (location, bytes) = self.read(artifact)?;
        let booster = parse_booster(&location, &bytes)?;
        tracing::info!(
            "Loaded symptom model from {} (classes={}, sha256={})",
            location,
            booster.classes().len(),
            &sha256_hex_bytes(&bytes)[..12]
        );
        Ok(Box::new(booster))
    }
}
