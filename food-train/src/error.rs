use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the MLflow tracking server.
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("MLflow request failed: {0}")]
    Http(#[from] Box<ureq::Error>),

    #[error("MLflow response could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact store {0:?} is not served by the tracking server")]
    UnsupportedArtifactStore(String),
}

impl From<ureq::Error> for TrackingError {
    fn from(err: ureq::Error) -> Self {
        TrackingError::Http(Box::new(err))
    }
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("failed to start trainer {bin:?}: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("trainer exited with status {0:?}")]
    TrainerFailed(Option<i32>),

    #[error("training results not found at {0}")]
    MissingResults(PathBuf),

    #[error("invalid results file: {0}")]
    Results(#[from] csv::Error),

    #[error(transparent)]
    Tracking(#[from] TrackingError),
}
