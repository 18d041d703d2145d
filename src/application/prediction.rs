//! Prediction service: the per-request pipeline.
//!
//! `record -> feature row -> model -> normalizer -> risk band`. Every stage
//! short-circuits on failure; no partial results are returned.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::model_loader::ModelLoader;
use super::normalizer::normalize;
use crate::domain::{
    map_features, normalize_probability, normalize_symptom, Disease, FeatureRow,
    GeneralPrediction, InputRecord, Prediction, PredictionEncoding, PredictionResult,
    ValidationError,
};
use crate::ports::{check_shape, ModelStore, SymptomKnowledge};
use crate::PredictError;

/// Reported when the knowledge base has no description for a disease.
pub const NO_DESCRIPTION: &str = "No description available.";

/// Encode a symptom list into the general model's presence vector.
///
/// Names are normalized before lookup and duplicates collapse.
///
/// # Errors
/// Returns `ValidationError::NoSymptoms` for an empty list (or one holding
/// only blank names) and `UnknownSymptoms` naming every unrecognized entry.
pub fn encode_symptoms<K: SymptomKnowledge + ?Sized>(
    knowledge: &K,
    symptoms: &[String],
) -> Result<FeatureRow, ValidationError> {
    let names: Vec<String> = symptoms
        .iter()
        .map(|s| normalize_symptom(s))
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        return Err(ValidationError::NoSymptoms);
    }

    let vocabulary = knowledge.symptoms();
    let mut values = vec![0.0; vocabulary.len()];
    let mut unknown: Vec<String> = Vec::new();
    for name in names {
        match knowledge.symptom_index(&name) {
            Some(i) => values[i] = 1.0,
            None if !unknown.contains(&name) => unknown.push(name),
            None => {}
        }
    }
    if !unknown.is_empty() {
        return Err(ValidationError::UnknownSymptoms(unknown));
    }

    Ok(FeatureRow::new(vocabulary.to_vec(), values))
}

/// Service running predictions for every endpoint.
pub struct PredictionService<S, K>
where
    S: ModelStore,
    K: SymptomKnowledge,
{
    loader: ModelLoader<S>,
    knowledge: Arc<K>,
}

impl<S, K> PredictionService<S, K>
where
    S: ModelStore,
    K: SymptomKnowledge,
{
    /// Create a new prediction service.
    pub fn new(loader: ModelLoader<S>, knowledge: Arc<K>) -> Self {
        Self { loader, knowledge }
    }

    #[must_use]
    pub fn loader(&self) -> &ModelLoader<S> {
        &self.loader
    }

    #[must_use]
    pub fn knowledge(&self) -> &K {
        &self.knowledge
    }

    /// Run a clinical prediction for one request body.
    ///
    /// # Errors
    /// `PredictError::Validation` for unusable input, `Prediction` when the
    /// model cannot produce a label, `Internal` when called for the general
    /// symptom model.
    pub fn predict(
        &self,
        disease: Disease,
        body: &Map<String, Value>,
    ) -> Result<PredictionResult, PredictError> {
        let spec = disease.spec();
        if spec.encoding == PredictionEncoding::Label {
            return Err(PredictError::Internal(format!(
                "{disease} is not a clinical measurement endpoint"
            )));
        }

        let record = InputRecord::from_json(disease, body)?;
        let row = map_features(&record, spec)?;
        let model = self.loader.load(disease);

        let output = normalize(model.as_ref(), row.values(), spec.positive_class_index)
            .map_err(|e| {
                tracing::error!(
                    "Error during {} prediction: {} (shape=(1, {}), columns={:?}, values={:?})",
                    disease,
                    e,
                    row.len(),
                    row.columns(),
                    row.values()
                );
                e
            })?;

        let prediction = match spec.encoding {
            PredictionEncoding::Flag => Prediction::Flag(output.is_positive()),
            // Class labels from exported models are integral by construction.
            _ => Prediction::Class(output.label.round() as i64),
        };
        let result = PredictionResult::new(prediction, output.probability);

        let source = match model.fingerprint() {
            Some(fingerprint) => format!("model {}", fingerprint.get(..12).unwrap_or(fingerprint)),
            None => "fallback model".to_string(),
        };
        tracing::info!(
            "{} prediction: {} (probability={}, risk={}, via {}, {})",
            disease,
            result.prediction,
            result.probability,
            result.risk_level,
            output.strategy,
            source
        );
        Ok(result)
    }

    /// Run the symptom-based general prediction.
    ///
    /// # Errors
    /// `PredictError::Validation` for an empty or unrecognized symptom list,
    /// `Prediction` when the model rejects the encoded row.
    pub fn predict_general(&self, symptoms: &[String]) -> Result<GeneralPrediction, PredictError> {
        let row = encode_symptoms(self.knowledge.as_ref(), symptoms)?;
        let model = self.loader.load_symptom_model();

        check_shape(model.n_features(), row.values())?;
        let (label, raw) = model.predict_top(row.values()).map_err(|e| {
            tracing::error!(
                "Error during general prediction: {} (shape=(1, {}))",
                e,
                row.len()
            );
            e
        })?;

        let description = self
            .knowledge
            .describe(&label)
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());
        let precautions = self.knowledge.precautions(&label);
        let probability = normalize_probability(raw);

        tracing::info!(
            "general prediction: {} (probability={}, symptoms={})",
            label,
            probability,
            symptoms.len()
        );
        Ok(GeneralPrediction {
            prediction: label,
            probability,
            description,
            precautions,
        })
    }
}
