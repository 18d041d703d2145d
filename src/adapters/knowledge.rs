//! JSON-backed symptom knowledge base.
//!
//! File layout:
//!
//! ```json
//! {
//!   "symptoms": ["itching", "skin_rash", "..."],
//!   "diseases": {
//!     "Fungal infection": {
//!       "description": "...",
//!       "precautions": ["bath twice", "..."]
//!     }
//!   }
//! }
//! ```
//!
//! `symptoms` fixes the general model's input columns, so its order matters.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::domain::normalize_symptom;
use crate::ports::SymptomKnowledge;

/// Knowledge base loading errors.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge base {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse knowledge base {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Symptom '{0}' appears more than once in the vocabulary")]
    DuplicateSymptom(String),
}

#[derive(Debug, Default, Deserialize)]
struct DiseaseEntry {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    precautions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    symptoms: Vec<String>,
    #[serde(default)]
    diseases: HashMap<String, DiseaseEntry>,
}

/// In-memory knowledge base loaded once at startup.
#[derive(Debug, Default)]
pub struct JsonKnowledgeBase {
    symptoms: Vec<String>,
    index: HashMap<String, usize>,
    diseases: HashMap<String, DiseaseEntry>,
}

impl JsonKnowledgeBase {
    /// Knowledge base with no symptoms and no disease entries.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from a JSON file.
    ///
    /// # Errors
    /// Returns `KnowledgeError` if the file cannot be read or parsed, or the
    /// vocabulary repeats a symptom after normalization.
    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let content = std::fs::read(path).map_err(|e| KnowledgeError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let kb = Self::from_slice(&content).map_err(|e| match e {
            KnowledgeError::Parse { message, .. } => KnowledgeError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        tracing::info!(
            "Loaded symptom knowledge from {:?} ({} symptoms, {} diseases)",
            path,
            kb.symptoms.len(),
            kb.diseases.len()
        );
        Ok(kb)
    }

    /// Parse from JSON bytes.
    ///
    /// # Errors
    /// Same contract as `load`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KnowledgeError> {
        let file: KnowledgeFile =
            serde_json::from_slice(bytes).map_err(|e| KnowledgeError::Parse {
                path: "<inline>".into(),
                message: e.to_string(),
            })?;

        let symptoms: Vec<String> = file.symptoms.iter().map(|s| normalize_symptom(s)).collect();
        let mut index = HashMap::with_capacity(symptoms.len());
        for (i, symptom) in symptoms.iter().enumerate() {
            if index.insert(symptom.clone(), i).is_some() {
                return Err(KnowledgeError::DuplicateSymptom(symptom.clone()));
            }
        }

        Ok(Self {
            symptoms,
            index,
            diseases: file.diseases,
        })
    }

    fn entry(&self, disease: &str) -> Option<&DiseaseEntry> {
        let disease = disease.trim();
        self.diseases.get(disease).or_else(|| {
            self.diseases
                .iter()
                .find(|(name, _)| name.trim().eq_ignore_ascii_case(disease))
                .map(|(_, entry)| entry)
        })
    }
}

impl SymptomKnowledge for JsonKnowledgeBase {
    fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    fn symptom_index(&self, symptom: &str) -> Option<usize> {
        self.index.get(symptom).copied()
    }

    fn describe(&self, disease: &str) -> Option<String> {
        self.entry(disease)
            .and_then(|e| e.description.clone())
            .filter(|d| !d.trim().is_empty())
    }

    fn precautions(&self, disease: &str) -> Vec<String> {
        self.entry(disease)
            .map(|e| {
                e.precautions
                    .iter()
                    .map(|p| p.trim())
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "symptoms": ["itching", "Skin Rash", "high_fever", "joint-pain"],
        "diseases": {
            "Fungal infection": {
                "description": "A common skin infection.",
                "precautions": ["bath twice", " ", "keep area dry"]
            },
            "Migraine": { "precautions": ["rest"] }
        }
    }"#;

    #[test]
    fn test_vocabulary_is_normalized_in_order() {
        let kb = JsonKnowledgeBase::from_slice(SAMPLE.as_bytes()).expect("parse");
        assert_eq!(
            kb.symptoms(),
            ["itching", "skin_rash", "high_fever", "joint_pain"]
        );
        assert_eq!(kb.symptom_index("skin_rash"), Some(1));
        assert_eq!(kb.symptom_index("joint_pain"), Some(3));
        assert_eq!(kb.symptom_index("cough"), None);
    }

    #[test]
    fn test_describe_and_precautions() {
        let kb = JsonKnowledgeBase::from_slice(SAMPLE.as_bytes()).expect("parse");
        assert_eq!(
            kb.describe("fungal infection").as_deref(),
            Some("A common skin infection.")
        );
        assert_eq!(
            kb.precautions("Fungal infection"),
            vec!["bath twice".to_string(), "keep area dry".to_string()]
        );

        assert_eq!(kb.describe("Migraine"), None);
        assert_eq!(kb.precautions("Migraine"), vec!["rest".to_string()]);
        assert!(kb.precautions("Unknown").is_empty());
    }

    #[test]
    fn test_duplicate_symptoms_rejected() {
        let err = JsonKnowledgeBase::from_slice(br#"{"symptoms": ["skin rash", "skin_rash"]}"#)
            .expect_err("duplicate");
        assert!(matches!(err, KnowledgeError::DuplicateSymptom(s) if s == "skin_rash"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("symptom_knowledge.json");
        std::fs::write(&path, SAMPLE).expect("write");
        let kb = JsonKnowledgeBase::load(&path).expect("load");
        assert_eq!(kb.symptoms().len(), 4);

        let missing = JsonKnowledgeBase::load(&dir.path().join("absent.json"));
        assert!(matches!(missing, Err(KnowledgeError::Io { .. })));
    }

    #[test]
    fn test_empty() {
        let kb = JsonKnowledgeBase::empty();
        assert!(kb.symptoms().is_empty());
        assert_eq!(kb.describe("Flu"), None);
    }
}
