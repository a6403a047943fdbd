pub mod cli;
pub mod detector;
pub mod error;
pub mod helpers;
pub mod mapping;
pub mod model;
pub mod nutrition;
pub mod pipeline;
pub mod postprocess;
pub mod preprocess;
pub mod service;
pub mod types;

pub use crate::cli::{Args, Command};
pub use crate::detector::{Detector, DetectorConfig, RawDetection, YoloDetector};
pub use crate::error::{MappingError, ModelError, PredictError};
pub use crate::mapping::{load_class_mapping, ClassMapping};
pub use crate::model::OnnxModel;
pub use crate::pipeline::FoodPipeline;
pub use crate::preprocess::{Letterbox, PreprocessConfig, Processor};
pub use crate::postprocess::{decode_predictions, non_maximum_suppression};
pub use crate::service::router;
pub use crate::types::{BoundingBox, Detection, PredictionResponse};
