// Error types for model loading, class mapping and the predict path.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Failures inside the ONNX detector.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),

    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("image preprocessing failed: {0}")]
    Preprocess(String),

    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),
}

/// Failures while loading the class mapping file.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid class mapping JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("id_to_class key {0:?} is not a class index")]
    InvalidId(String),
}

/// Everything `/predict` can fail with.
///
/// `PredictionFailed` is the catch-all: any detector error is downgraded to a
/// client error carrying the underlying message. Build it through
/// [`PredictError::from_detector`] so the downgrade lives in one place.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Invalid image file")]
    InvalidImage(#[source] image::ImageError),

    #[error("Field required: file")]
    MissingFile,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
}

impl PredictError {
    pub fn from_detector(err: impl std::fmt::Display) -> Self {
        PredictError::PredictionFailed(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PredictError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            PredictError::MissingFile | PredictError::InvalidQuery(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PredictError::InvalidImage(_)
            | PredictError::InvalidInput(_)
            | PredictError::PredictionFailed(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Prediction error: {}", self);
        } else {
            tracing::warn!("Prediction rejected: {}", self);
        }
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}
