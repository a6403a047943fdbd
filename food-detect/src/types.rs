use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    /// Truncates toward zero, matching an integer cast of the model output.
    pub fn from_xyxy(xyxy: [f32; 4]) -> Self {
        Self {
            x1: xyxy[0] as i32,
            y1: xyxy[1] as i32,
            x2: xyxy[2] as i32,
            y2: xyxy[3] as i32,
        }
    }
}

/// A named detection with its nutrition estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub class_id: usize,
    pub class_name: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
    pub portion_desc: String,
    pub portion_g: Option<u32>,
    pub calories_estimate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    pub image: Option<String>,
    pub num_detections: usize,
    pub detections: Vec<Detection>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_path: String,
    pub num_classes: usize,
    pub classes: std::collections::BTreeMap<usize, String>,
}

/// Local server time, ISO-8601 with microseconds and no offset.
pub fn iso_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_truncates_instead_of_rounding() {
        let bbox = BoundingBox::from_xyxy([10.9, 20.5, 99.99, 150.0]);
        assert_eq!(bbox, BoundingBox { x1: 10, y1: 20, x2: 99, y2: 150 });
    }

    #[test]
    fn timestamp_parses_back() {
        let ts = iso_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
    }

    #[test]
    fn absent_nutrition_serializes_as_null() {
        let det = Detection {
            class_id: 9,
            class_name: "class_9".into(),
            confidence: 0.5,
            bbox: BoundingBox { x1: 0, y1: 0, x2: 1, y2: 1 },
            portion_desc: "Unknown".into(),
            portion_g: None,
            calories_estimate: None,
        };
        let json = serde_json::to_value(&det).unwrap();
        assert!(json["portion_g"].is_null());
        assert!(json["calories_estimate"].is_null());
        assert_eq!(json["bbox"]["x2"], 1);
    }
}
