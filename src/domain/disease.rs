//! Static per-disease feature contracts.
//!
//! Every supported model was trained on a fixed column list. The tables in
//! this module are the single source of truth for that order, for the
//! categorical encodings and for the request field names (and aliases) that
//! feed each column.

use serde::{Deserialize, Serialize};

/// Shared yes/no style vocabulary used by the chronic kidney disease model.
pub const BINARY_VOCABULARY: &[(&str, f64)] = &[
    ("yes", 1.0),
    ("no", 0.0),
    ("present", 1.0),
    ("notpresent", 0.0),
    ("normal", 1.0),
    ("abnormal", 0.0),
    ("good", 1.0),
    ("poor", 0.0),
];

/// Gender encoding used by the lung cancer model (label-encoded, F < M).
pub const GENDER_VOCABULARY: &[(&str, f64)] = &[("m", 1.0), ("f", 0.0)];

/// How a request value becomes a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureKind {
    /// Any finite number (or numeric string)
    Numeric,
    /// A finite number without fractional part
    Integer,
    /// A string looked up case-insensitively in a fixed table
    Categorical(&'static [(&'static str, f64)]),
}

impl FeatureKind {
    /// Encode a categorical value, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn lookup(&self, value: &str) -> Option<f64> {
        match self {
            Self::Categorical(table) => {
                let needle = value.trim().to_lowercase();
                table
                    .iter()
                    .find(|(key, _)| *key == needle)
                    .map(|(_, code)| *code)
            }
            Self::Numeric | Self::Integer => None,
        }
    }
}

/// One model input column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureSpec {
    /// Request field name
    pub name: &'static str,
    /// Alternate request field name accepted in place of `name`
    pub alias: Option<&'static str>,
    /// Column name the model was trained with
    pub column: &'static str,
    /// Value encoding
    pub kind: FeatureKind,
}

const fn numeric(name: &'static str) -> FeatureSpec {
    FeatureSpec {
        name,
        alias: None,
        column: name,
        kind: FeatureKind::Numeric,
    }
}

const fn aliased(name: &'static str, alias: &'static str) -> FeatureSpec {
    FeatureSpec {
        name,
        alias: Some(alias),
        column: name,
        kind: FeatureKind::Numeric,
    }
}

const fn column(name: &'static str, column: &'static str, kind: FeatureKind) -> FeatureSpec {
    FeatureSpec {
        name,
        alias: None,
        column,
        kind,
    }
}

const fn categorical(name: &'static str) -> FeatureSpec {
    column(name, name, FeatureKind::Categorical(BINARY_VOCABULARY))
}

const DIABETES_FEATURES: &[FeatureSpec] = &[
    numeric("Pregnancies"),
    numeric("Glucose"),
    numeric("BloodPressure"),
    numeric("SkinThickness"),
    numeric("Insulin"),
    numeric("BMI"),
    numeric("DiabetesPedigreeFunction"),
    numeric("Age"),
];

const HEART_FEATURES: &[FeatureSpec] = &[
    numeric("age"),
    numeric("sex"),
    numeric("cp"),
    numeric("trestbps"),
    numeric("chol"),
    numeric("fbs"),
    numeric("restecg"),
    numeric("thalach"),
    numeric("exang"),
    numeric("oldpeak"),
    numeric("slope"),
    numeric("ca"),
    numeric("thal"),
];

const LIVER_FEATURES: &[FeatureSpec] = &[
    numeric("age"),
    numeric("gender"),
    numeric("total_bilirubin"),
    numeric("direct_bilirubin"),
    numeric("alkaline_phosphotase"),
    numeric("alamine_aminotransferase"),
    numeric("aspartate_aminotransferase"),
    numeric("total_proteins"),
    numeric("albumin"),
    numeric("albumin_globulin_ratio"),
];

const PARKINSONS_FEATURES: &[FeatureSpec] = &[
    aliased("fo", "Fo"),
    aliased("fhi", "Fhi"),
    aliased("flo", "Flo"),
    aliased("jitter_percent", "jitterPercent"),
    aliased("jitter_abs", "jitterAbs"),
    aliased("rap", "RAP"),
    aliased("ppq", "PPQ"),
    aliased("ddp", "DDP"),
    aliased("shimmer", "Shimmer"),
    aliased("shimmer_db", "shimmerDb"),
    aliased("apq3", "APQ3"),
    aliased("apq5", "APQ5"),
    aliased("apq", "APQ"),
    aliased("dda", "DDA"),
    aliased("nhr", "NHR"),
    aliased("hnr", "HNR"),
    aliased("rpde", "RPDE"),
    aliased("dfa", "DFA"),
    numeric("spread1"),
    numeric("spread2"),
    aliased("d2", "D2"),
    aliased("ppe", "PPE"),
];

const LUNG_FEATURES: &[FeatureSpec] = &[
    column("gender", "GENDER", FeatureKind::Categorical(GENDER_VOCABULARY)),
    column("age", "AGE", FeatureKind::Integer),
    column("smoking", "SMOKING", FeatureKind::Integer),
    column("yellow_fingers", "YELLOW_FINGERS", FeatureKind::Integer),
    column("anxiety", "ANXIETY", FeatureKind::Integer),
    column("peer_pressure", "PEER_PRESSURE", FeatureKind::Integer),
    column("chronic_disease", "CHRONICDISEASE", FeatureKind::Integer),
    column("fatigue", "FATIGUE", FeatureKind::Integer),
    column("allergy", "ALLERGY", FeatureKind::Integer),
    column("wheezing", "WHEEZING", FeatureKind::Integer),
    column("alcohol_consuming", "ALCOHOLCONSUMING", FeatureKind::Integer),
    column("coughing", "COUGHING", FeatureKind::Integer),
    column("shortness_of_breath", "SHORTNESSOFBREATH", FeatureKind::Integer),
    column("swallowing_difficulty", "SWALLOWINGDIFFICULTY", FeatureKind::Integer),
    column("chest_pain", "CHESTPAIN", FeatureKind::Integer),
];

const KIDNEY_FEATURES: &[FeatureSpec] = &[
    numeric("age"),
    numeric("bp"),
    numeric("sg"),
    numeric("al"),
    numeric("su"),
    categorical("rbc"),
    categorical("pc"),
    categorical("pcc"),
    categorical("ba"),
    numeric("bgr"),
    numeric("bu"),
    numeric("sc"),
    numeric("sod"),
    numeric("pot"),
    numeric("hemo"),
    numeric("pcv"),
    numeric("wc"),
    numeric("rc"),
    categorical("htn"),
    categorical("dm"),
    categorical("cad"),
    categorical("appet"),
    categorical("pe"),
    categorical("ane"),
];

// The training frame used "concave points_*" (with a space) for three columns.
const BREAST_FEATURES: &[FeatureSpec] = &[
    numeric("radius_mean"),
    numeric("texture_mean"),
    numeric("perimeter_mean"),
    numeric("area_mean"),
    numeric("smoothness_mean"),
    numeric("compactness_mean"),
    numeric("concavity_mean"),
    column("concave_points_mean", "concave points_mean", FeatureKind::Numeric),
    numeric("symmetry_mean"),
    numeric("fractal_dimension_mean"),
    numeric("radius_se"),
    numeric("texture_se"),
    numeric("perimeter_se"),
    numeric("area_se"),
    numeric("smoothness_se"),
    numeric("compactness_se"),
    numeric("concavity_se"),
    column("concave_points_se", "concave points_se", FeatureKind::Numeric),
    numeric("symmetry_se"),
    numeric("fractal_dimension_se"),
    numeric("radius_worst"),
    numeric("texture_worst"),
    numeric("perimeter_worst"),
    numeric("area_worst"),
    numeric("smoothness_worst"),
    numeric("compactness_worst"),
    numeric("concavity_worst"),
    column("concave_points_worst", "concave points_worst", FeatureKind::Numeric),
    numeric("symmetry_worst"),
    numeric("fractal_dimension_worst"),
];

/// How the class label is reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionEncoding {
    /// `true` / `false`
    Flag,
    /// Integer class label
    Class,
    /// Disease name (general symptom model)
    Label,
}

/// Supported disease types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disease {
    Diabetes,
    Heart,
    Liver,
    Parkinsons,
    Lung,
    Kidney,
    Breast,
    General,
}

impl Disease {
    /// Every disease, in route registration order.
    pub const ALL: [Disease; 8] = [
        Disease::Diabetes,
        Disease::Heart,
        Disease::Liver,
        Disease::Parkinsons,
        Disease::Lung,
        Disease::Kidney,
        Disease::Breast,
        Disease::General,
    ];

    /// Diseases predicted from clinical measurements (everything but `General`).
    pub const CLINICAL: [Disease; 7] = [
        Disease::Diabetes,
        Disease::Heart,
        Disease::Liver,
        Disease::Parkinsons,
        Disease::Lung,
        Disease::Kidney,
        Disease::Breast,
    ];

    /// URL path segment.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Diabetes => "diabetes",
            Self::Heart => "heart",
            Self::Liver => "liver",
            Self::Parkinsons => "parkinsons",
            Self::Lung => "lung",
            Self::Kidney => "kidney",
            Self::Breast => "breast",
            Self::General => "general",
        }
    }

    /// Static contract for this disease.
    #[must_use]
    pub fn spec(&self) -> &'static DiseaseSpec {
        match self {
            Self::Diabetes => &DIABETES,
            Self::Heart => &HEART,
            Self::Liver => &LIVER,
            Self::Parkinsons => &PARKINSONS,
            Self::Lung => &LUNG,
            Self::Kidney => &KIDNEY,
            Self::Breast => &BREAST,
            Self::General => &GENERAL,
        }
    }
}

impl std::fmt::Display for Disease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for Disease {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown disease '{s}'"))
    }
}

/// Immutable per-disease descriptor.
#[derive(Debug)]
pub struct DiseaseSpec {
    pub disease: Disease,

    /// Columns in training order. Empty for the general symptom model, whose
    /// columns come from the symptom vocabulary.
    pub features: &'static [FeatureSpec],

    /// Artifact file name inside the model directory
    pub artifact: &'static str,

    /// Index of the "disease present" slot in `predict_proba` output.
    ///
    /// The lung cancer model reads slot 0. Whether this reflects a label
    /// encoding difference in its training data has not been confirmed; it
    /// is kept as-is pending review by the model owners.
    pub positive_class_index: usize,

    pub encoding: PredictionEncoding,

    /// Probability reported by the stand-in model when the artifact is unusable
    pub fallback_probability: f64,
}

impl DiseaseSpec {
    /// Training column names in order.
    #[must_use]
    pub fn columns(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.column).collect()
    }

    /// Number of model inputs (0 for the general model).
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }
}

static DIABETES: DiseaseSpec = DiseaseSpec {
    disease: Disease::Diabetes,
    features: DIABETES_FEATURES,
    artifact: "diabetes_model.json",
    positive_class_index: 1,
    encoding: PredictionEncoding::Flag,
    fallback_probability: 0.75,
};

static HEART: DiseaseSpec = DiseaseSpec {
    disease: Disease::Heart,
    features: HEART_FEATURES,
    artifact: "heart_disease_model.json",
    positive_class_index: 1,
    encoding: PredictionEncoding::Class,
    fallback_probability: 0.75,
};

static LIVER: DiseaseSpec = DiseaseSpec {
    disease: Disease::Liver,
    features: LIVER_FEATURES,
    artifact: "liver_disease_model.json",
    positive_class_index: 1,
    encoding: PredictionEncoding::Class,
    fallback_probability: 0.68,
};

static PARKINSONS: DiseaseSpec = DiseaseSpec {
    disease: Disease::Parkinsons,
    features: PARKINSONS_FEATURES,
    artifact: "parkinsons_model.json",
    positive_class_index: 1,
    encoding: PredictionEncoding::Class,
    fallback_probability: 0.82,
};

static LUNG: DiseaseSpec = DiseaseSpec {
    disease: Disease::Lung,
    features: LUNG_FEATURES,
    artifact: "lung_cancer_model.json",
    positive_class_index: 0,
    encoding: PredictionEncoding::Flag,
    fallback_probability: 0.75,
};

static KIDNEY: DiseaseSpec = DiseaseSpec {
    disease: Disease::Kidney,
    features: KIDNEY_FEATURES,
    artifact: "chronic_model.json",
    positive_class_index: 1,
    encoding: PredictionEncoding::Flag,
    fallback_probability: 0.75,
};

static BREAST: DiseaseSpec = DiseaseSpec {
    disease: Disease::Breast,
    features: BREAST_FEATURES,
    artifact: "breast_cancer.json",
    positive_class_index: 1,
    encoding: PredictionEncoding::Flag,
    fallback_probability: 0.75,
};

static GENERAL: DiseaseSpec = DiseaseSpec {
    disease: Disease::General,
    features: &[],
    artifact: "xgboost_model.json",
    positive_class_index: 0,
    encoding: PredictionEncoding::Label,
    fallback_probability: 0.0,
};
