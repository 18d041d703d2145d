//! Symptom knowledge port: vocabulary, descriptions and precautions.
//!
//! The general model's input columns are the symptom vocabulary in order;
//! descriptions and precautions are reference content keyed by disease name.

/// Trait for the symptom knowledge base.
pub trait SymptomKnowledge: Send + Sync {
    /// Symptom vocabulary in model column order (normalized names).
    fn symptoms(&self) -> &[String];

    /// Column index of a normalized symptom name.
    fn symptom_index(&self, symptom: &str) -> Option<usize> {
        self.symptoms().iter().position(|s| s == symptom)
    }

    /// Description of a disease, if known.
    fn describe(&self, disease: &str) -> Option<String>;

    /// Precautions for a disease (empty when unknown).
    fn precautions(&self, disease: &str) -> Vec<String>;
}
