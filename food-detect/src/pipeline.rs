// Detection -> naming -> nutrition lookup for a single uploaded image.

use std::io::Cursor;

use image::{DynamicImage, ImageDecoder, ImageReader};
use tracing::{info, warn};

use crate::detector::{Detector, RawDetection};
use crate::error::PredictError;
use crate::mapping::ClassMapping;
use crate::nutrition::{self, round_to};
use crate::types::{iso_timestamp, BoundingBox, Detection, PredictionResponse};

pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Model and class mapping, loaded once at startup and read-only after.
pub struct FoodPipeline {
    detector: Option<Box<dyn Detector>>,
    mapping: ClassMapping,
    model_path: String,
}

impl FoodPipeline {
    pub fn new(
        detector: Option<Box<dyn Detector>>,
        mapping: ClassMapping,
        model_path: impl Into<String>,
    ) -> Self {
        Self {
            detector,
            mapping,
            model_path: model_path.into(),
        }
    }

    pub fn is_model_loaded(&self) -> bool {
        self.detector.is_some()
    }

    pub fn mapping(&self) -> &ClassMapping {
        &self.mapping
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    /// Log mapping names without nutrition data and disagreements between
    /// the model and the mapping. Returns the number of problems found.
    pub fn check_consistency(&self) -> usize {
        let mut problems = 0;
        for issue in self.mapping.inconsistencies() {
            warn!("Class mapping: {}", issue);
            problems += 1;
        }
        let missing = nutrition::missing_entries(self.mapping.classes().values().map(String::as_str));
        for name in &missing {
            warn!("No nutrition data for class {:?}", name);
        }
        problems += missing.len();
        if let Some(nc) = self.detector.as_ref().and_then(|d| d.num_classes()) {
            if !self.mapping.is_empty() && nc != self.mapping.len() {
                warn!(
                    "Model predicts {} classes but the mapping has {}",
                    nc,
                    self.mapping.len()
                );
                problems += 1;
            }
        }
        problems
    }

    /// Decode `bytes`, run the detector and attach names and nutrition.
    pub fn predict(
        &self,
        bytes: &[u8],
        filename: Option<String>,
        conf: f32,
    ) -> Result<PredictionResponse, PredictError> {
        let detector = self.detector.as_deref().ok_or(PredictError::ModelUnavailable)?;
        if !conf.is_finite() {
            return Err(PredictError::InvalidInput(format!(
                "conf must be a finite number, got {}",
                conf
            )));
        }

        let image = decode_image(bytes).map_err(PredictError::InvalidImage)?;

        let t = std::time::Instant::now();
        let raw = detector
            .detect(&image, conf)
            .map_err(PredictError::from_detector)?;
        let detections: Vec<Detection> = raw.into_iter().map(|r| self.assemble(r)).collect();
        info!(
            "Predicted {} detections for {:?} in {:?}",
            detections.len(),
            filename.as_deref().unwrap_or("<unnamed>"),
            t.elapsed()
        );

        Ok(PredictionResponse {
            image: filename,
            num_detections: detections.len(),
            detections,
            timestamp: iso_timestamp(),
        })
    }

    fn assemble(&self, raw: RawDetection) -> Detection {
        let class_name = self.mapping.name_of(raw.class_id);
        let estimate = nutrition::estimate(&class_name);
        Detection {
            class_id: raw.class_id,
            class_name,
            confidence: round_to(f64::from(raw.confidence), 4),
            bbox: BoundingBox::from_xyxy(raw.bbox),
            portion_desc: estimate.portion_desc,
            portion_g: estimate.portion_g,
            calories_estimate: estimate.calories_estimate,
        }
    }
}

/// Decode an uploaded image and rotate it upright per its EXIF orientation.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}
