use image::DynamicImage;
use ndarray::ArrayViewD;
use ort::session::Session;
use tracing::debug;

use crate::error::ModelError;
use crate::model::{output_shape, OnnxModel};
use crate::postprocess::{decode_predictions, non_maximum_suppression, num_classes_from_shape};
use crate::preprocess::{PreprocessConfig, Processor};

/// One box as produced by the detection model, before any naming.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// x1, y1, x2, y2 in original image pixels
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_id: usize,
}

/// Anything that can turn an image into raw detections.
pub trait Detector: Send + Sync {
    fn detect(&self, image: &DynamicImage, conf: f32) -> Result<Vec<RawDetection>, ModelError>;

    /// Class count the model was exported with, when known.
    fn num_classes(&self) -> Option<usize> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub imgsz: u32,
    pub iou: f32,
    pub max_det: usize,
    pub cuda: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            imgsz: 640,
            iou: 0.7,
            max_det: 300,
            cuda: false,
        }
    }
}

/// YOLOv8 detector backed by an ONNX Runtime session.
pub struct YoloDetector {
    session: Session,
    processor: Processor,
    iou: f32,
    max_det: usize,
    num_classes: Option<usize>,
}

impl YoloDetector {
    pub fn load(model_path: &str, config: &DetectorConfig) -> Result<Self, ModelError> {
        let session = OnnxModel::new(config.cuda).load_model(model_path)?;
        let num_classes = output_shape(&session).and_then(|shape| num_classes_from_shape(&shape));
        Ok(Self {
            session,
            processor: Processor::new(PreprocessConfig {
                size: config.imgsz,
                ..PreprocessConfig::default()
            }),
            iou: config.iou,
            max_det: config.max_det,
            num_classes,
        })
    }
}

impl Detector for YoloDetector {
    fn detect(&self, image: &DynamicImage, conf: f32) -> Result<Vec<RawDetection>, ModelError> {
        let t = std::time::Instant::now();
        let (xs, letterbox) = self.processor.preprocess(image)?;
        debug!("[preprocess]: {:?}", t.elapsed());

        let t = std::time::Instant::now();
        let ys = self.session.run(ort::inputs![xs.view()]?)?;
        debug!("[model]: {:?}", t.elapsed());

        let (_name, output) = ys
            .iter()
            .next()
            .ok_or_else(|| ModelError::UnexpectedOutput("model produced no outputs".into()))?;
        let output: ArrayViewD<'_, f32> = output.try_extract_tensor::<f32>()?;

        let candidates = decode_predictions(output, conf, &letterbox)?;
        let found = candidates.len();
        let kept = non_maximum_suppression(candidates, self.iou, self.max_det);
        debug!("[postprocess]: {} candidates, {} after NMS", found, kept.len());
        Ok(kept)
    }

    fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }
}
