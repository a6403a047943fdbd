pub mod cli;
pub mod error;
pub mod results;
pub mod tracking;
pub mod trainer;

pub use cli::Args;
pub use error::{TrackingError, TrainError};
pub use results::{read_final_metrics, TrainMetrics};
pub use tracking::{LogTracker, MlflowClient, RunStatus, Tracker};
pub use trainer::{run_training, TrainConfig, Trainer, YoloCli};
