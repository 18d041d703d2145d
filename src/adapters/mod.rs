//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external resources:
//! - `artifact`: JSON model artifacts on disk
//! - `knowledge`: JSON symptom knowledge base
//! - `sanitize`: log writer keeping request values on one line

pub mod artifact;
pub mod knowledge;
pub mod sanitize;

pub use artifact::FileModelStore;
pub use knowledge::{JsonKnowledgeBase, KnowledgeError};
pub use sanitize::SanitizingMakeWriter;
