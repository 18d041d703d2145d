//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (model artifacts, the
//! symptom knowledge base).

mod classifier;
mod knowledge;
mod model_store;

pub use classifier::{
    check_shape, Capabilities, Capability, Classifier, ModelError, SymptomClassifier,
};
pub use knowledge::SymptomKnowledge;
pub use model_store::{ArtifactError, LoadedArtifact, ModelStore, Scaler};
