//! HTTP surface: one POST route per disease plus root and health checks.
//!
//! Handlers are thin. Request bodies are handed to the prediction service on
//! the blocking pool, inside a span tagged with a request id and the disease.

mod error;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::task::JoinError;
use tower_http::cors::{Any, CorsLayer};

use crate::application::PredictionService;
use crate::domain::{Disease, GeneralPrediction, PredictionResult};
use crate::ports::{ModelStore, SymptomKnowledge};
use crate::PredictError;

pub use error::{ErrorBody, INTERNAL_ERROR_DETAIL, PREDICTION_FAILURE_DETAIL};

/// Shared handler state.
pub struct AppState<S: ModelStore, K: SymptomKnowledge> {
    service: Arc<PredictionService<S, K>>,
    started_at: DateTime<Utc>,
}

impl<S: ModelStore, K: SymptomKnowledge> Clone for AppState<S, K> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            started_at: self.started_at,
        }
    }
}

impl<S: ModelStore, K: SymptomKnowledge> AppState<S, K> {
    pub fn new(service: PredictionService<S, K>) -> Self {
        Self {
            service: Arc::new(service),
            started_at: Utc::now(),
        }
    }
}

/// Request body of `/predict/general`.
#[derive(Debug, Deserialize)]
pub struct SymptomsRequest {
    pub symptoms: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RootResponse {
    message: &'static str,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub cache_models: bool,
    /// Artifact presence per disease slug
    pub models: BTreeMap<String, bool>,
}

/// Generate a random request id (UUID v4 layout) from a CSPRNG.
fn request_id() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

/// Run `job` on the blocking pool inside a request span.
async fn run_blocking<T, F>(disease: Disease, job: F) -> Result<T, PredictError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PredictError> + Send + 'static,
{
    let request_id = request_id();
    let span = tracing::info_span!("request", %request_id, %disease);
    tokio::task::spawn_blocking(move || span.in_scope(job))
        .await
        .map_err(join_failure)?
}

/// Turn a failed blocking task into an internal error carrying the panic
/// message, if any.
fn join_failure(e: JoinError) -> PredictError {
    if !e.is_panic() {
        return PredictError::Internal(format!("prediction task failed: {e}"));
    }
    let payload = e.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    PredictError::Internal(format!("prediction task panicked: {message}"))
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Disease Prediction API is running",
    })
}

async fn health<S, K>(State(state): State<AppState<S, K>>) -> Json<HealthResponse>
where
    S: ModelStore + 'static,
    K: SymptomKnowledge + 'static,
{
    let loader = state.service.loader();
    Json(HealthResponse {
        status: "ok".into(),
        started_at: state.started_at,
        cache_models: loader.is_caching(),
        models: loader
            .availability()
            .into_iter()
            .map(|(disease, present)| (disease.slug().to_string(), present))
            .collect(),
    })
}

async fn predict_clinical<S, K>(
    state: AppState<S, K>,
    disease: Disease,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<PredictionResult>, PredictError>
where
    S: ModelStore + 'static,
    K: SymptomKnowledge + 'static,
{
    let Json(body) = body?;
    let service = state.service;
    let result = run_blocking(disease, move || service.predict(disease, &body)).await?;
    Ok(Json(result))
}

async fn predict_general<S, K>(
    State(state): State<AppState<S, K>>,
    body: Result<Json<SymptomsRequest>, JsonRejection>,
) -> Result<Json<GeneralPrediction>, PredictError>
where
    S: ModelStore + 'static,
    K: SymptomKnowledge + 'static,
{
    let Json(request) = body?;
    let service = state.service;
    let result = run_blocking(Disease::General, move || {
        service.predict_general(&request.symptoms)
    })
    .await?;
    Ok(Json(result))
}

/// Build the application router.
pub fn router<S, K>(state: AppState<S, K>) -> Router
where
    S: ModelStore + 'static,
    K: SymptomKnowledge + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/", get(root))
        .route("/health", get(health::<S, K>));

    for disease in Disease::CLINICAL {
        app = app.route(
            &format!("/predict/{}", disease.slug()),
            post(
                move |State(state): State<AppState<S, K>>,
                      body: Result<Json<Map<String, Value>>, JsonRejection>| {
                    predict_clinical(state, disease, body)
                },
            ),
        );
    }

    app.route("/predict/general", post(predict_general::<S, K>))
        .layer(cors)
        .with_state(state)
}
