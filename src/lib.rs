//! # MedPredict
//!
//! Disease-risk prediction service.
//!
//! This crate provides:
//! - Per-disease feature contracts mapping request fields onto model inputs
//! - Capability-aware normalization of model output into
//!   `{prediction, probability, risk_level}`
//! - Deterministic fallback models when artifacts are missing or corrupt
//! - An HTTP surface with one route per disease
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (disease contracts, records, results)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (JSON artifacts, knowledge base)
//! - `application`: Use cases orchestrating domain and ports
//! - `http`: axum router and handlers
//! - `config`: Environment-driven service configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod ports;

pub use domain::{Disease, GeneralPrediction, Prediction, PredictionResult, RiskLevel};

/// Result type for MedPredict operations
pub type Result<T> = std::result::Result<T, PredictError>;

/// Main error type for MedPredict
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("Invalid input: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Prediction failed: {0}")]
    Prediction(#[from] ports::ModelError),

    #[error("Internal error: {0}")]
    Internal(String),
}
