//! Request input records.
//!
//! An `InputRecord` is the validated field bag for one disease request: every
//! declared field is present exactly once (under its name or its alias) and
//! holds either a number or a string. Encoding into model inputs is left to
//! the feature mapper.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::disease::{Disease, FeatureSpec};

/// Input validation failures. Each maps to HTTP 400.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    MissingField { field: String },

    #[error("Field '{field}' was provided both as '{field}' and as its alias '{alias}'")]
    AmbiguousField { field: String, alias: String },

    #[error("Field '{field}' must be a number or string, got {found}")]
    InvalidType { field: String, found: &'static str },

    #[error("Field '{field}' must be numeric, got '{value}'")]
    NotNumeric { field: String, value: String },

    #[error("Field '{field}' must be a finite number")]
    NotFinite { field: String },

    #[error("Field '{field}' must be an integer, got {value}")]
    NotInteger { field: String, value: f64 },

    #[error("Field '{field}' has unrecognized value '{value}'")]
    UnknownCategory { field: String, value: String },

    #[error("At least one symptom is required")]
    NoSymptoms,

    #[error("Unrecognized symptoms: {}", .0.join(", "))]
    UnknownSymptoms(Vec<String>),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

impl ValidationError {
    /// Name of the offending field, when the error is about a single field.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field }
            | Self::AmbiguousField { field, .. }
            | Self::InvalidType { field, .. }
            | Self::NotNumeric { field, .. }
            | Self::NotFinite { field }
            | Self::NotInteger { field, .. }
            | Self::UnknownCategory { field, .. } => Some(field),
            Self::NoSymptoms => Some("symptoms"),
            Self::UnknownSymptoms(_) => Some("symptoms"),
            Self::MalformedBody(_) => None,
        }
    }
}

/// Raw value of one request field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    fn from_json(field: &str, value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| ValidationError::NotFinite {
                    field: field.to_string(),
                }),
            Value::String(s) => Ok(Self::Text(s.clone())),
            other => Err(ValidationError::InvalidType {
                field: field.to_string(),
                found: json_type_name(other),
            }),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Validated field bag for one disease request.
///
/// Fields are keyed by their internal name regardless of whether the caller
/// used the alias, so two records with the same values compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    disease: Disease,
    fields: BTreeMap<&'static str, FieldValue>,
}

impl InputRecord {
    /// Build a record from a JSON object body.
    ///
    /// Unknown keys are ignored. Each declared field must appear exactly once,
    /// either under its name or its alias.
    ///
    /// # Errors
    /// Returns the first `ValidationError` found, in column order.
    pub fn from_json(disease: Disease, body: &Map<String, Value>) -> Result<Self, ValidationError> {
        let spec = disease.spec();
        let mut fields = BTreeMap::new();

        for feature in spec.features {
            let value = Self::resolve(feature, body)?;
            fields.insert(feature.name, FieldValue::from_json(feature.name, value)?);
        }

        let ignored = body
            .keys()
            .filter(|key| {
                !spec
                    .features
                    .iter()
                    .any(|f| f.name == key.as_str() || f.alias == Some(key.as_str()))
            })
            .count();
        if ignored > 0 {
            tracing::debug!("Ignoring {ignored} undeclared field(s) for {disease}");
        }

        Ok(Self { disease, fields })
    }

    fn resolve<'a>(
        feature: &FeatureSpec,
        body: &'a Map<String, Value>,
    ) -> Result<&'a Value, ValidationError> {
        let by_name = body.get(feature.name);
        let by_alias = feature.alias.and_then(|alias| body.get(alias));

        match (by_name, by_alias) {
            (Some(_), Some(_)) => Err(ValidationError::AmbiguousField {
                field: feature.name.to_string(),
                alias: feature.alias.unwrap_or_default().to_string(),
            }),
            (Some(value), None) | (None, Some(value)) => Ok(value),
            (None, None) => Err(ValidationError::MissingField {
                field: feature.name.to_string(),
            }),
        }
    }

    /// Disease this record was validated against.
    #[must_use]
    pub fn disease(&self) -> Disease {
        self.disease
    }

    /// Value of a field by internal name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Number of fields held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn heart_body() -> Map<String, Value> {
        object(json!({
            "age": 63, "sex": 1, "cp": 3, "trestbps": 145, "chol": 233, "fbs": 1,
            "restecg": 0, "thalach": 150, "exang": 0, "oldpeak": 2.3, "slope": 0,
            "ca": 0, "thal": 1
        }))
    }

    #[test]
    fn test_record_from_json() {
        let record = InputRecord::from_json(Disease::Heart, &heart_body()).expect("valid");
        assert_eq!(record.len(), 13);
        assert_eq!(record.get("oldpeak"), Some(&FieldValue::Number(2.3)));
        assert_eq!(record.disease(), Disease::Heart);
    }

    #[test]
    fn test_missing_field_is_named() {
        let mut body = heart_body();
        body.remove("chol");
        let err = InputRecord::from_json(Disease::Heart, &body).unwrap_err();
        assert_eq!(err.field(), Some("chol"));
        assert!(err.to_string().contains("chol"));
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let mut body = heart_body();
        body.insert("patient_note".into(), json!("ignored"));
        assert!(InputRecord::from_json(Disease::Heart, &body).is_ok());
    }

    #[test]
    fn test_invalid_types_are_rejected() {
        let mut body = heart_body();
        body.insert("age".into(), json!(true));
        let err = InputRecord::from_json(Disease::Heart, &body).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidType { ref field, .. } if field == "age"));

        let mut body = heart_body();
        body.insert("age".into(), Value::Null);
        assert!(InputRecord::from_json(Disease::Heart, &body).is_err());
    }

    #[test]
    fn test_alias_and_name_resolve_to_same_record() {
        let by_alias = object(json!({ "Fo": 119.992, "spread1": -4.81 }));
        let by_name = object(json!({ "fo": 119.992, "spread1": -4.81 }));

        let feature = &Disease::Parkinsons.spec().features[0];
        let a = InputRecord::resolve(feature, &by_alias).expect("alias");
        let b = InputRecord::resolve(feature, &by_name).expect("name");
        assert_eq!(a, b);
    }

    #[test]
    fn test_name_and_alias_together_is_ambiguous() {
        let body = object(json!({ "Fo": 119.992, "fo": 120.0 }));
        let feature = &Disease::Parkinsons.spec().features[0];
        let err = InputRecord::resolve(feature, &body).unwrap_err();
        assert_eq!(
            err,
            ValidationError::AmbiguousField {
                field: "fo".into(),
                alias: "Fo".into()
            }
        );
    }
}
