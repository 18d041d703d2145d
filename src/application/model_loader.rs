//! Model loader: resolves a disease to a usable model handle.
//!
//! Loading never fails from the caller's point of view. An absent artifact
//! (warning) or an unusable one (error) is replaced by a deterministic
//! fallback model so the endpoint keeps answering.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::{Disease, DiseaseSpec};
use crate::ports::{
    check_shape, ArtifactError, Capabilities, Capability, Classifier, ModelError, ModelStore,
    Scaler, SymptomClassifier,
};

/// Stand-in for a missing or corrupt clinical model.
///
/// Always predicts the positive class and reports the disease's fixed
/// fallback probability in its positive slot.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackModel {
    disease: Disease,
    probability: f64,
    positive_index: usize,
}

impl FallbackModel {
    #[must_use]
    pub fn disease(&self) -> Disease {
        self.disease
    }

    #[must_use]
    pub fn probability(&self) -> f64 {
        self.probability
    }
}

/// Build the fallback model for a disease.
#[must_use]
pub fn fallback_model(spec: &DiseaseSpec) -> FallbackModel {
    FallbackModel {
        disease: spec.disease,
        probability: spec.fallback_probability,
        positive_index: spec.positive_class_index,
    }
}

impl Classifier for FallbackModel {
    fn kind(&self) -> &'static str {
        "fallback"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::none()
            .with(Capability::Predict)
            .with(Capability::PredictProba)
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict(&self, _row: &[f64]) -> Result<f64, ModelError> {
        Ok(1.0)
    }

    fn predict_proba(&self, _row: &[f64]) -> Result<Vec<f64>, ModelError> {
        let n_classes = (self.positive_index + 1).max(2);
        let rest = (1.0 - self.probability) / (n_classes - 1) as f64;
        let mut proba = vec![rest; n_classes];
        proba[self.positive_index] = self.probability;
        Ok(proba)
    }
}

/// Stand-in for a missing general symptom model.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackSymptomModel;

impl FallbackSymptomModel {
    pub const LABEL: &'static str = "Unknown";
}

impl SymptomClassifier for FallbackSymptomModel {
    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict_top(&self, _row: &[f64]) -> Result<(String, f64), ModelError> {
        Ok((Self::LABEL.to_string(), 0.0))
    }
}

/// A clinical model ready for prediction.
///
/// Trained handles apply their scaler to every row before calling the
/// estimator.
pub enum ModelHandle {
    Trained {
        scaler: Option<Scaler>,
        classifier: Box<dyn Classifier>,
        fingerprint: String,
    },
    Fallback(FallbackModel),
}

impl ModelHandle {
    /// SHA-256 of the artifact, for trained handles.
    #[must_use]
    pub fn fingerprint(&self) -> Option<&str> {
        match self {
            Self::Trained { fingerprint, .. } => Some(fingerprint.as_str()),
            Self::Fallback(_) => None,
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Self::Trained { classifier, .. } => classifier.as_ref(),
            Self::Fallback(model) => model,
        }
    }

    fn prepare<'a>(&self, row: &'a [f64]) -> Result<Cow<'a, [f64]>, ModelError> {
        match self {
            Self::Trained {
                scaler: Some(scaler),
                ..
            } => Ok(Cow::Owned(scaler.transform(row)?)),
            _ => {
                check_shape(self.inner().n_features(), row)?;
                Ok(Cow::Borrowed(row))
            }
        }
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trained {
                scaler,
                classifier,
                fingerprint,
            } => f
                .debug_struct("Trained")
                .field("kind", &classifier.kind())
                .field("scaler", &scaler.is_some())
                .field("fingerprint", fingerprint)
                .finish(),
            Self::Fallback(model) => f.debug_tuple("Fallback").field(model).finish(),
        }
    }
}

impl Classifier for ModelHandle {
    fn kind(&self) -> &'static str {
        self.inner().kind()
    }

    fn capabilities(&self) -> Capabilities {
        self.inner().capabilities()
    }

    fn n_features(&self) -> Option<usize> {
        self.inner().n_features()
    }

    fn predict(&self, row: &[f64]) -> Result<f64, ModelError> {
        self.inner().predict(&self.prepare(row)?)
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.inner().predict_proba(&self.prepare(row)?)
    }

    fn decision_function(&self, row: &[f64]) -> Result<f64, ModelError> {
        self.inner().decision_function(&self.prepare(row)?)
    }
}

fn log_load_failure(what: &str, location: &str, err: &ArtifactError) {
    if err.is_not_found() {
        tracing::warn!("Model file not found at {}. Using fallback {} model.", location, what);
    } else {
        tracing::error!("Error loading {} model: {}. Using fallback model.", what, err);
    }
}

/// Loads model handles from a store, optionally caching trained ones.
///
/// With caching on, each disease is populated at most once: concurrent
/// first loads may both read the artifact, but the first insert wins and
/// later callers share it. Fallbacks are never cached, so a model dropped
/// into place later is picked up on the next request.
pub struct ModelLoader<S: ModelStore> {
    store: Arc<S>,
    cache: Option<RwLock<HashMap<Disease, Arc<ModelHandle>>>>,
    symptom_cache: Option<RwLock<Option<Arc<dyn SymptomClassifier>>>>,
}

impl<S: ModelStore> ModelLoader<S> {
    /// Create a loader over `store`.
    pub fn new(store: Arc<S>, cache_models: bool) -> Self {
        Self {
            store,
            cache: cache_models.then(|| RwLock::new(HashMap::new())),
            symptom_cache: cache_models.then(|| RwLock::new(None)),
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    /// Resolve a clinical disease to a model handle.
    pub fn load(&self, disease: Disease) -> Arc<ModelHandle> {
        if let Some(cache) = &self.cache {
            let cached = cache
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&disease)
                .cloned();
            if let Some(handle) = cached {
                return handle;
            }
        }

        let spec = disease.spec();
        match self.store.load(spec) {
            Ok(artifact) => {
                let handle = Arc::new(ModelHandle::Trained {
                    scaler: artifact.scaler,
                    classifier: artifact.classifier,
                    fingerprint: artifact.fingerprint,
                });
                match &self.cache {
                    Some(cache) => cache
                        .write()
                        .unwrap_or_else(PoisonError::into_inner)
                        .entry(disease)
                        .or_insert(handle)
                        .clone(),
                    None => handle,
                }
            }
            Err(e) => {
                log_load_failure(disease.slug(), &self.store.location(spec.artifact), &e);
                Arc::new(ModelHandle::Fallback(fallback_model(spec)))
            }
        }
    }

    /// Resolve the general symptom model.
    pub fn load_symptom_model(&self) -> Arc<dyn SymptomClassifier> {
        if let Some(cache) = &self.symptom_cache {
            if let Some(model) = cache.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
                return Arc::clone(model);
            }
        }

        let artifact = Disease::General.spec().artifact;
        match self.store.load_symptom_model(artifact) {
            Ok(model) => {
                let model: Arc<dyn SymptomClassifier> = Arc::from(model);
                match &self.symptom_cache {
                    Some(cache) => Arc::clone(
                        cache
                            .write()
                            .unwrap_or_else(PoisonError::into_inner)
                            .get_or_insert(model),
                    ),
                    None => model,
                }
            }
            Err(e) => {
                log_load_failure("general", &self.store.location(artifact), &e);
                Arc::new(FallbackSymptomModel)
            }
        }
    }

    /// Artifact presence per disease, in route order.
    #[must_use]
    pub fn availability(&self) -> Vec<(Disease, bool)> {
        Disease::ALL
            .into_iter()
            .map(|d| (d, self.store.exists(d.spec().artifact)))
            .collect()
    }
}
