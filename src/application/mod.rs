//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod model_loader;
mod normalizer;
mod prediction;

pub use model_loader::{fallback_model, FallbackModel, FallbackSymptomModel, ModelHandle, ModelLoader};
pub use normalizer::{normalize, NormalizedOutput, ProbabilityStrategy};
pub use prediction::{encode_symptoms, PredictionService, NO_DESCRIPTION};
