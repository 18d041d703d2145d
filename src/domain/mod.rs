//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O. Disease contracts are
//! static tables; records, feature rows and results are created per request.

mod diagnosis;
mod disease;
mod features;
mod record;
mod symptoms;

pub use diagnosis::{
    normalize_probability, sigmoid, GeneralPrediction, Prediction, PredictionResult, RiskLevel,
    HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD,
};
pub use disease::{
    Disease, DiseaseSpec, FeatureKind, FeatureSpec, PredictionEncoding, BINARY_VOCABULARY,
    GENDER_VOCABULARY,
};
pub use features::{map_features, FeatureRow};
pub use record::{FieldValue, InputRecord, ValidationError};
pub use symptoms::normalize_symptom;
