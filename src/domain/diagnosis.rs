//! Prediction result types.
//!
//! Represents the normalized output shared by every disease endpoint.

use serde::{Deserialize, Serialize};

/// Lower bound (inclusive) of the `High` band.
pub const HIGH_RISK_THRESHOLD: f64 = 0.70;

/// Lower bound (inclusive) of the `Medium` band.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.30;

/// Decimal places kept in reported probabilities.
pub const PROBABILITY_DECIMALS: i32 = 4;

/// Risk band derived from the positive-class probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Probability below 0.30
    Low,
    /// Probability in [0.30, 0.70)
    Medium,
    /// Probability of 0.70 or more
    High,
}

impl RiskLevel {
    /// Classify a probability. Total over [0, 1]; NaN lands in `Low`.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        if probability >= HIGH_RISK_THRESHOLD {
            Self::High
        } else if probability >= MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Numerically stable logistic function, mapping a decision score to (0, 1).
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Clamp a raw model probability into [0, 1] and round it for presentation.
///
/// Both steps are monotonic, so the relative order of probabilities (and with
/// it the risk band boundaries) is preserved. NaN maps to 0.
#[must_use]
pub fn normalize_probability(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    let scale = 10f64.powi(PROBABILITY_DECIMALS);
    (raw.clamp(0.0, 1.0) * scale).round() / scale
}

/// Class prediction as reported by an endpoint.
///
/// Some endpoints report a boolean flag, others the integer class label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prediction {
    /// Disease present / absent
    Flag(bool),
    /// Raw class label (0 = no disease, 1 = disease present)
    Class(i64),
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag(flag) => write!(f, "{flag}"),
            Self::Class(class) => write!(f, "{class}"),
        }
    }
}

/// Normalized `{prediction, probability, risk_level}` triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Class prediction in the endpoint's encoding
    pub prediction: Prediction,

    /// Positive-class probability, clamped to [0, 1] and rounded
    pub probability: f64,

    /// Risk band computed from `probability`
    pub risk_level: RiskLevel,
}

impl PredictionResult {
    /// Build a result from a raw (possibly out-of-range) probability.
    ///
    /// The risk band is computed from the normalized value, so the reported
    /// probability and band always agree.
    #[must_use]
    pub fn new(prediction: Prediction, raw_probability: f64) -> Self {
        let probability = normalize_probability(raw_probability);
        Self {
            prediction,
            probability,
            risk_level: RiskLevel::from_probability(probability),
        }
    }
}

/// Output of the symptom-based general model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralPrediction {
    /// Predicted disease name
    pub prediction: String,

    /// Probability of the top class
    pub probability: f64,

    /// Human-readable description of the disease
    pub description: String,

    /// Recommended precautions
    pub precautions: Vec<String>,
}
