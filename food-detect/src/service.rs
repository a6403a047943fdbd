use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, DefaultBodyLimit, Multipart,
        Query, State,
    },
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::PredictError;
use crate::pipeline::{FoodPipeline, DEFAULT_CONFIDENCE};
use crate::types::{iso_timestamp, HealthResponse, ModelInfo, PredictionResponse};

pub const SERVICE_NAME: &str = "Food Detection API";
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<FoodPipeline>,
}

#[derive(Debug, Deserialize)]
pub struct PredictParams {
    #[serde(default = "default_conf")]
    pub conf: f32,
}

fn default_conf() -> f32 {
    DEFAULT_CONFIDENCE
}

pub fn router(pipeline: Arc<FoodPipeline>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/model_info", get(model_info))
        .route("/predict", post(predict))
        .with_state(AppState { pipeline })
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "endpoints": {
            "health": "GET /health",
            "model_info": "GET /model_info",
            "predict": "POST /predict?conf=<float> (multipart field `file`)",
        },
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        model_loaded: state.pipeline.is_model_loaded(),
        timestamp: iso_timestamp(),
    })
}

async fn model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    let mapping = state.pipeline.mapping();
    Json(ModelInfo {
        model_path: state.pipeline.model_path().to_string(),
        num_classes: mapping.len(),
        classes: mapping.classes().clone(),
    })
}

/// Detect food in an uploaded image.
///
/// # Request Format:
/// - multipart/form-data with the image in field "file"
/// - optional query `conf` (default 0.5)
async fn predict(
    State(state): State<AppState>,
    params: Result<Query<PredictParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>, PredictError> {
    let Query(params) = params.map_err(|e| PredictError::InvalidQuery(e.body_text()))?;
    // A request that is not multipart at all has no file either
    let mut multipart = multipart.map_err(|_| PredictError::MissingFile)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PredictError::InvalidInput(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().map(str::to_owned);
            let data = field
                .bytes()
                .await
                .map_err(|e| PredictError::InvalidInput(format!("Read error: {}", e)))?;
            upload = Some((filename, data));
            break;
        }
    }
    let (filename, data) = upload.ok_or(PredictError::MissingFile)?;
    info!(
        "Received predict request: {:?} ({} bytes, conf={})",
        filename, data.len(), params.conf
    );

    let pipeline = state.pipeline.clone();
    let conf = params.conf;
    tokio::task::spawn_blocking(move || pipeline.predict(&data, filename, conf))
        .await
        .map_err(PredictError::from_detector)?
        .map(Json)
}
