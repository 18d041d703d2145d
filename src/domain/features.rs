//! Feature rows and the per-disease feature mapper.

use super::disease::{DiseaseSpec, FeatureKind, FeatureSpec};
use super::record::{FieldValue, InputRecord, ValidationError};

/// Ordered numeric model input with the column names it was built against.
///
/// Column order is the training order of the target model; it is fixed by
/// the `DiseaseSpec` and never by the order of the request fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureRow {
    /// Build a row from parallel column/value lists.
    ///
    /// # Panics
    /// Panics if the lists differ in length.
    #[must_use]
    pub fn new(columns: Vec<String>, values: Vec<f64>) -> Self {
        assert_eq!(columns.len(), values.len(), "column/value length mismatch");
        Self { columns, values }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a column by training name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i])
    }

    /// Little-endian byte image of the values, used to compare rows exactly.
    #[must_use]
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}

/// Map a validated record onto the feature row its model expects.
///
/// # Errors
/// Returns `ValidationError` naming the first field that cannot be encoded.
pub fn map_features(record: &InputRecord, spec: &DiseaseSpec) -> Result<FeatureRow, ValidationError> {
    let mut columns = Vec::with_capacity(spec.features.len());
    let mut values = Vec::with_capacity(spec.features.len());

    for feature in spec.features {
        let raw = record
            .get(feature.name)
            .ok_or_else(|| ValidationError::MissingField {
                field: feature.name.to_string(),
            })?;
        columns.push(feature.column.to_string());
        values.push(encode(feature, raw)?);
    }

    Ok(FeatureRow { columns, values })
}

fn encode(feature: &FeatureSpec, raw: &FieldValue) -> Result<f64, ValidationError> {
    match feature.kind {
        FeatureKind::Numeric => to_number(feature.name, raw),
        FeatureKind::Integer => {
            let value = to_number(feature.name, raw)?;
            if value.fract() != 0.0 {
                return Err(ValidationError::NotInteger {
                    field: feature.name.to_string(),
                    value,
                });
            }
            Ok(value)
        }
        FeatureKind::Categorical(_) => {
            let text = match raw {
                FieldValue::Text(s) => s.clone(),
                FieldValue::Number(n) => n.to_string(),
            };
            feature
                .kind
                .lookup(&text)
                .ok_or(ValidationError::UnknownCategory {
                    field: feature.name.to_string(),
                    value: text,
                })
        }
    }
}

fn to_number(field: &str, raw: &FieldValue) -> Result<f64, ValidationError> {
    let value = match raw {
        FieldValue::Number(n) => *n,
        FieldValue::Text(s) => s.trim().parse::<f64>().map_err(|_| ValidationError::NotNumeric {
            field: field.to_string(),
            value: s.clone(),
        })?,
    };

    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Disease;
    use serde_json::{json, Map, Value};

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn kidney_body() -> Map<String, Value> {
        object(json!({
            "age": 48, "bp": 80, "sg": 1.02, "al": 1, "su": 0,
            "rbc": "normal", "pc": "normal", "pcc": "notpresent", "ba": "notpresent",
            "bgr": 121, "bu": 36, "sc": 1.2, "sod": 135, "pot": 4.2, "hemo": 15.4,
            "pcv": 44, "wc": 7800, "rc": 5.2,
            "htn": "yes", "dm": "no", "cad": "no", "appet": "good", "pe": "no", "ane": "no"
        }))
    }

    fn map(disease: Disease, body: &Map<String, Value>) -> Result<FeatureRow, ValidationError> {
        let record = InputRecord::from_json(disease, body)?;
        map_features(&record, disease.spec())
    }

    #[test]
    fn test_kidney_scenario() {
        let row = map(Disease::Kidney, &kidney_body()).expect("valid kidney input");

        assert_eq!(
            row.values(),
            &[
                48.0, 80.0, 1.02, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 121.0, 36.0, 1.2, 135.0, 4.2,
                15.4, 44.0, 7800.0, 5.2, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0,
            ]
        );
        assert_eq!(row.columns()[5], "rbc");
        assert_eq!(row.columns()[23], "ane");
        assert_eq!(row.get("htn"), Some(1.0));
        assert_eq!(row.get("appet"), Some(1.0));
        assert_eq!(row.get("pcc"), Some(0.0));
    }

    #[test]
    fn test_row_follows_declared_order_not_body_order() {
        // Same values, keys written in opposite orders.
        let forward: Map<String, Value> = serde_json::from_str(
            r#"{"Pregnancies": 2, "Glucose": 138, "BloodPressure": 62, "SkinThickness": 35,
                "Insulin": 0, "BMI": 33.6, "DiabetesPedigreeFunction": 0.127, "Age": 47}"#,
        )
        .expect("forward json");
        let backward: Map<String, Value> = serde_json::from_str(
            r#"{"Age": 47, "DiabetesPedigreeFunction": 0.127, "BMI": 33.6, "Insulin": 0,
                "SkinThickness": 35, "BloodPressure": 62, "Glucose": 138, "Pregnancies": 2}"#,
        )
        .expect("backward json");

        let a = map(Disease::Diabetes, &forward).expect("forward");
        let b = map(Disease::Diabetes, &backward).expect("backward");
        assert_eq!(a.to_le_bytes(), b.to_le_bytes());
        assert_eq!(a.columns(), Disease::Diabetes.spec().columns().as_slice());
        assert_eq!(a.values(), &[2.0, 138.0, 62.0, 35.0, 0.0, 33.6, 0.127, 47.0]);
    }

    #[test]
    fn test_categorical_case_insensitive() {
        let mut rows = Vec::new();
        for spelling in ["YES", "Yes", "yes"] {
            let mut body = kidney_body();
            body.insert("htn".into(), json!(spelling));
            rows.push(map(Disease::Kidney, &body).expect("valid"));
        }
        assert_eq!(rows[0], rows[1]);
        assert_eq!(rows[1], rows[2]);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let mut body = kidney_body();
        body.insert("appet".into(), json!("excellent"));
        let err = map(Disease::Kidney, &body).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownCategory {
                field: "appet".into(),
                value: "excellent".into()
            }
        );
    }

    #[test]
    fn test_numeric_strings_are_cast() {
        let mut body = kidney_body();
        body.insert("bp".into(), json!(" 80 "));
        let row = map(Disease::Kidney, &body).expect("numeric string");
        assert_eq!(row.get("bp"), Some(80.0));

        body.insert("bp".into(), json!("high"));
        let err = map(Disease::Kidney, &body).unwrap_err();
        assert_eq!(err.field(), Some("bp"));
    }

    #[test]
    fn test_non_finite_string_rejected() {
        let mut body = kidney_body();
        body.insert("sc".into(), json!("NaN"));
        let err = map(Disease::Kidney, &body).unwrap_err();
        assert_eq!(err, ValidationError::NotFinite { field: "sc".into() });
    }

    fn lung_body() -> Map<String, Value> {
        object(json!({
            "gender": "M", "age": 69, "smoking": 1, "yellow_fingers": 2, "anxiety": 2,
            "peer_pressure": 1, "chronic_disease": 1, "fatigue": 2, "allergy": 1,
            "wheezing": 2, "alcohol_consuming": 2, "coughing": 2,
            "shortness_of_breath": 2, "swallowing_difficulty": 2, "chest_pain": 2
        }))
    }

    #[test]
    fn test_lung_gender_and_integers() {
        let row = map(Disease::Lung, &lung_body()).expect("valid lung input");
        assert_eq!(row.columns()[0], "GENDER");
        assert_eq!(row.values()[0], 1.0);
        assert_eq!(row.get("AGE"), Some(69.0));

        let mut body = lung_body();
        body.insert("gender".into(), json!("f"));
        assert_eq!(map(Disease::Lung, &body).expect("valid").values()[0], 0.0);

        body.insert("gender".into(), json!("X"));
        assert_eq!(map(Disease::Lung, &body).unwrap_err().field(), Some("gender"));
    }

    #[test]
    fn test_lung_rejects_fractional_flags() {
        let mut body = lung_body();
        body.insert("smoking".into(), json!(1.5));
        let err = map(Disease::Lung, &body).unwrap_err();
        assert!(matches!(err, ValidationError::NotInteger { ref field, .. } if field == "smoking"));

        body.insert("smoking".into(), json!(2.0));
        assert!(map(Disease::Lung, &body).is_ok());
    }

    #[test]
    fn test_parkinsons_alias_rows_identical() {
        let spec = Disease::Parkinsons.spec();
        let mut by_name = Map::new();
        let mut by_alias = Map::new();
        for (i, feature) in spec.features.iter().enumerate() {
            let value = json!(0.5 + i as f64);
            by_name.insert(feature.name.to_string(), value.clone());
            by_alias.insert(feature.alias.unwrap_or(feature.name).to_string(), value);
        }

        let a = map(Disease::Parkinsons, &by_name).expect("by name");
        let b = map(Disease::Parkinsons, &by_alias).expect("by alias");
        assert_eq!(a.to_le_bytes(), b.to_le_bytes());
        assert_eq!(a.len(), 22);
        assert_eq!(a.values()[0], 0.5);
        assert_eq!(a.values()[21], 21.5);
    }

    #[test]
    fn test_breast_row_uses_training_column_names() {
        let spec = Disease::Breast.spec();
        let body: Map<String, Value> = spec
            .features
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.to_string(), json!(i as f64)))
            .collect();

        let row = map(Disease::Breast, &body).expect("valid breast input");
        assert_eq!(row.get("concave points_mean"), Some(7.0));
        assert_eq!(row.get("concave_points_mean"), None);
        assert_eq!(row.len(), 30);
    }
}
