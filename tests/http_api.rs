//! End-to-end tests against the real router served on an ephemeral port.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use medpredict::adapters::{FileModelStore, JsonKnowledgeBase};
use medpredict::application::{ModelLoader, PredictionService};
use medpredict::domain::Disease;
use medpredict::http::{router, AppState, HealthResponse, PREDICTION_FAILURE_DETAIL};

const KNOWLEDGE: &str = r#"{
    "symptoms": ["itching", "skin_rash", "headache", "nausea"],
    "diseases": {
        "Fungal infection": {
            "description": "A common fungal skin infection.",
            "precautions": ["bath twice", "use clean towels"]
        },
        "Migraine": {
            "precautions": ["meditation", "reduce stress"]
        }
    }
}"#;

struct TestServer {
    base: String,
    client: reqwest::Client,
    _models: TempDir,
}

impl TestServer {
    async fn start(models: TempDir) -> Self {
        let knowledge = JsonKnowledgeBase::from_slice(KNOWLEDGE.as_bytes()).expect("knowledge");
        let store = Arc::new(FileModelStore::new(models.path()));
        let service = PredictionService::new(ModelLoader::new(store, true), Arc::new(knowledge));
        let app = router(AppState::new(service));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            _models: models,
        }
    }

    async fn post(&self, path: &str, body: &Value) -> (u16, Value) {
        let response = self
            .client
            .post(format!("{}{}", self.base, path))
            .json(body)
            .send()
            .await
            .expect("request");
        let status = response.status().as_u16();
        (status, response.json().await.expect("json body"))
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .expect("request");
        let status = response.status().as_u16();
        (status, response.json().await.expect("json body"))
    }
}

fn write_json(dir: &Path, name: &str, value: &Value) {
    std::fs::write(dir.join(name), value.to_string()).expect("write artifact");
}

fn logistic_artifact(disease: Disease, coef: Vec<f64>, intercept: f64) -> Value {
    json!({
        "format_version": 1,
        "feature_names": disease.spec().columns(),
        "estimator": { "kind": "logistic_regression", "coef": coef, "intercept": intercept }
    })
}

fn symptom_booster() -> Value {
    let stump = |class: usize, feature: usize| {
        json!({ "class": class, "nodes": [
            { "type": "split", "feature": feature, "threshold": 0.5, "left": 1, "right": 2 },
            { "type": "leaf", "value": [-1.0] },
            { "type": "leaf", "value": [2.0] }
        ]})
    };
    json!({
        "format_version": 1,
        "classes": ["Fungal infection", "Migraine"],
        "n_features": 4,
        "trees": [stump(0, 1), stump(1, 2)]
    })
}

fn diabetes_body() -> Value {
    json!({
        "Pregnancies": 2, "Glucose": 138, "BloodPressure": 62, "SkinThickness": 35,
        "Insulin": 0, "BMI": 33.6, "DiabetesPedigreeFunction": 0.127, "Age": 47
    })
}

fn heart_body() -> Value {
    json!({
        "age": 63, "sex": 1, "cp": 3, "trestbps": 145, "chol": 233, "fbs": 1,
        "restecg": 0, "thalach": 150, "exang": 0, "oldpeak": 2.3, "slope": 0,
        "ca": 0, "thal": 1
    })
}

fn kidney_body() -> Value {
    json!({
        "age": 48, "bp": 80, "sg": 1.02, "al": 1, "su": 0,
        "rbc": "normal", "pc": "normal", "pcc": "notpresent", "ba": "notpresent",
        "bgr": 121, "bu": 36, "sc": 1.2, "sod": 135, "pot": 4.2, "hemo": 15.4,
        "pcv": 44, "wc": 7800, "rc": 5.2,
        "htn": "yes", "dm": "no", "cad": "no", "appet": "good", "pe": "no", "ane": "no"
    })
}

const PARKINSONS_VALUES: [(&str, &str, f64); 22] = [
    ("fo", "Fo", 119.992),
    ("fhi", "Fhi", 157.302),
    ("flo", "Flo", 74.997),
    ("jitter_percent", "jitterPercent", 0.00784),
    ("jitter_abs", "jitterAbs", 0.00007),
    ("rap", "RAP", 0.0037),
    ("ppq", "PPQ", 0.00554),
    ("ddp", "DDP", 0.01109),
    ("shimmer", "Shimmer", 0.04374),
    ("shimmer_db", "shimmerDb", 0.426),
    ("apq3", "APQ3", 0.02182),
    ("apq5", "APQ5", 0.0313),
    ("apq", "APQ", 0.02971),
    ("dda", "DDA", 0.06545),
    ("nhr", "NHR", 0.02211),
    ("hnr", "HNR", 21.033),
    ("rpde", "RPDE", 0.414783),
    ("dfa", "DFA", 0.815285),
    ("spread1", "spread1", -4.813031),
    ("spread2", "spread2", 0.266482),
    ("d2", "D2", 2.301442),
    ("ppe", "PPE", 0.284654),
];

#[tokio::test]
async fn test_root_and_health() {
    let dir = TempDir::new().expect("tempdir");
    write_json(
        dir.path(),
        "diabetes_model.json",
        &logistic_artifact(Disease::Diabetes, vec![0.0; 8], 0.0),
    );
    let server = TestServer::start(dir).await;

    let (status, body) = server.get("/").await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Disease Prediction API is running");

    let (status, body) = server.get("/health").await;
    assert_eq!(status, 200);
    let health: HealthResponse = serde_json::from_value(body).expect("health body");
    assert_eq!(health.status, "ok");
    assert!(health.cache_models);
    assert_eq!(health.models.len(), Disease::ALL.len());
    assert_eq!(health.models.get("diabetes"), Some(&true));
    assert_eq!(health.models.get("heart"), Some(&false));
}

#[tokio::test]
async fn test_missing_heart_model_returns_fallback() {
    let server = TestServer::start(TempDir::new().expect("tempdir")).await;

    let (status, body) = server.post("/predict/heart", &heart_body()).await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({ "prediction": 1, "probability": 0.75, "risk_level": "High" })
    );
}

#[tokio::test]
async fn test_corrupt_diabetes_model_returns_fallback() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("diabetes_model.json"), "{ truncated").expect("write");
    let server = TestServer::start(dir).await;

    let (status, body) = server.post("/predict/diabetes", &diabetes_body()).await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({ "prediction": true, "probability": 0.75, "risk_level": "High" })
    );
}

#[tokio::test]
async fn test_trained_diabetes_model() {
    let dir = TempDir::new().expect("tempdir");
    write_json(
        dir.path(),
        "diabetes_model.json",
        &logistic_artifact(Disease::Diabetes, vec![0.0; 8], 0.0),
    );
    let server = TestServer::start(dir).await;

    let (status, body) = server.post("/predict/diabetes", &diabetes_body()).await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({ "prediction": false, "probability": 0.5, "risk_level": "Medium" })
    );
}

#[tokio::test]
async fn test_parkinsons_accepts_names_and_aliases() {
    let dir = TempDir::new().expect("tempdir");
    let mut coef = vec![0.0; 22];
    coef[0] = 0.01;
    write_json(
        dir.path(),
        "parkinsons_model.json",
        &logistic_artifact(Disease::Parkinsons, coef, -1.0),
    );
    let server = TestServer::start(dir).await;

    let by_name: serde_json::Map<String, Value> = PARKINSONS_VALUES
        .iter()
        .map(|(name, _, v)| ((*name).to_string(), json!(v)))
        .collect();
    let by_alias: serde_json::Map<String, Value> = PARKINSONS_VALUES
        .iter()
        .map(|(_, alias, v)| ((*alias).to_string(), json!(v)))
        .collect();

    let (status_a, a) = server.post("/predict/parkinsons", &Value::Object(by_name)).await;
    let (status_b, b) = server.post("/predict/parkinsons", &Value::Object(by_alias)).await;
    assert_eq!(status_a, 200);
    assert_eq!(status_b, 200);
    assert_eq!(a, b);
    assert_eq!(a["prediction"], 1);
    assert_eq!(a["probability"], 0.5498);
    assert_eq!(a["risk_level"], "Medium");
}

#[tokio::test]
async fn test_body_key_order_does_not_change_result() {
    let dir = TempDir::new().expect("tempdir");
    write_json(
        dir.path(),
        "diabetes_model.json",
        &logistic_artifact(
            Disease::Diabetes,
            vec![0.5, 0.01, -0.02, 0.0, 0.001, 0.05, 1.0, 0.03],
            -4.0,
        ),
    );
    let server = TestServer::start(dir).await;

    let forward = r#"{"Pregnancies": 2, "Glucose": 138, "BloodPressure": 62, "SkinThickness": 35,
        "Insulin": 0, "BMI": 33.6, "DiabetesPedigreeFunction": 0.127, "Age": 47}"#;
    let backward = r#"{"Age": 47, "DiabetesPedigreeFunction": 0.127, "BMI": 33.6, "Insulin": 0,
        "SkinThickness": 35, "BloodPressure": 62, "Glucose": 138, "Pregnancies": 2}"#;

    let mut results = Vec::new();
    for raw in [forward, backward] {
        let response = server
            .client
            .post(format!("{}/predict/diabetes", server.base))
            .header("content-type", "application/json")
            .body(raw)
            .send()
            .await
            .expect("request");
        assert_eq!(response.status().as_u16(), 200);
        results.push(response.json::<Value>().await.expect("json body"));
    }
    assert_eq!(results[0], results[1]);
    // 1.0 + 1.38 - 1.24 + 1.68 + 0.127 + 1.41 - 4.0 = 0.357
    assert_eq!(results[0]["prediction"], true);
    assert_eq!(results[0]["probability"], 0.5883);
}

#[tokio::test]
async fn test_validation_errors_are_400() {
    let server = TestServer::start(TempDir::new().expect("tempdir")).await;

    let mut body = kidney_body();
    body["rbc"] = json!("purple");
    let (status, detail) = server.post("/predict/kidney", &body).await;
    assert_eq!(status, 400);
    assert!(detail["detail"].as_str().expect("detail").contains("rbc"));

    let mut body = heart_body();
    body.as_object_mut().expect("object").remove("chol");
    let (status, detail) = server.post("/predict/heart", &body).await;
    assert_eq!(status, 400);
    assert!(detail["detail"].as_str().expect("detail").contains("chol"));

    let mut body = diabetes_body();
    body["Glucose"] = json!("high");
    let (status, _) = server.post("/predict/diabetes", &body).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let server = TestServer::start(TempDir::new().expect("tempdir")).await;
    let response = server
        .client
        .post(format!("{}/predict/liver", server.base))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("json body");
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_model_failure_is_500() {
    let dir = TempDir::new().expect("tempdir");
    write_json(
        dir.path(),
        "diabetes_model.json",
        &logistic_artifact(Disease::Diabetes, vec![1e300; 8], 0.0),
    );
    let server = TestServer::start(dir).await;

    let mut body = diabetes_body();
    body["Glucose"] = json!(1e300);
    let (status, body) = server.post("/predict/diabetes", &body).await;
    assert_eq!(status, 500);
    assert_eq!(body["detail"], PREDICTION_FAILURE_DETAIL);
}

#[tokio::test]
async fn test_general_prediction() {
    let dir = TempDir::new().expect("tempdir");
    write_json(dir.path(), "xgboost_model.json", &symptom_booster());
    let server = TestServer::start(dir).await;

    let (status, body) = server
        .post(
            "/predict/general",
            &json!({ "symptoms": ["Skin Rash", "itching"] }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["prediction"], "Fungal infection");
    assert_eq!(body["probability"], 0.9526);
    assert_eq!(body["description"], "A common fungal skin infection.");
    assert_eq!(body["precautions"], json!(["bath twice", "use clean towels"]));

    let (status, body) = server
        .post("/predict/general", &json!({ "symptoms": ["headache"] }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["prediction"], "Migraine");
    assert_eq!(body["description"], "No description available.");
    assert_eq!(body["precautions"], json!(["meditation", "reduce stress"]));
}

#[tokio::test]
async fn test_general_rejects_empty_and_unknown_symptoms() {
    let server = TestServer::start(TempDir::new().expect("tempdir")).await;

    let (status, body) = server
        .post("/predict/general", &json!({ "symptoms": [] }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["detail"], "At least one symptom is required");

    let (status, body) = server
        .post("/predict/general", &json!({ "symptoms": ["itching", "glowing"] }))
        .await;
    assert_eq!(status, 400);
    assert!(body["detail"].as_str().expect("detail").contains("glowing"));
}

#[tokio::test]
async fn test_general_without_model_reports_unknown() {
    let server = TestServer::start(TempDir::new().expect("tempdir")).await;
    let (status, body) = server
        .post("/predict/general", &json!({ "symptoms": ["nausea"] }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "prediction": "Unknown",
            "probability": 0.0,
            "description": "No description available.",
            "precautions": []
        })
    );
}
