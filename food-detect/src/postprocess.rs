use std::collections::HashMap;

use ndarray::{ArrayViewD, Axis, Ix3};

use crate::detector::RawDetection;
use crate::error::ModelError;
use crate::preprocess::Letterbox;

/// Number of classes encoded in a `[1, 4 + nc, anchors]` output.
pub fn num_classes_from_shape(shape: &[usize]) -> Option<usize> {
    match shape {
        [_, rows, _] if *rows > 4 => Some(rows - 4),
        _ => None,
    }
}

/// Decode a YOLOv8 head output of shape `[1, 4 + nc, anchors]`.
///
/// Each anchor column is `cx, cy, w, h` followed by one score per class.
/// Anchors whose best class score is strictly above `threshold` are kept,
/// with their box converted to xyxy in original image pixels.
pub fn decode_predictions(
    output: ArrayViewD<'_, f32>,
    threshold: f32,
    letterbox: &Letterbox,
) -> Result<Vec<RawDetection>, ModelError> {
    let output = output.into_dimensionality::<Ix3>()?;
    if num_classes_from_shape(output.shape()).is_none() {
        return Err(ModelError::UnexpectedOutput(format!(
            "expected [1, 4 + classes, anchors], got {:?}",
            output.shape()
        )));
    }
    let preds = output.index_axis(Axis(0), 0); // (4 + nc, anchors)

    let mut candidates = Vec::new();
    for anchor in preds.axis_iter(Axis(1)) {
        let (class_id, score) = anchor
            .iter()
            .skip(4)
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |(max_idx, max_val), (i, &val)| {
                if val > max_val { (i, val) } else { (max_idx, max_val) }
            });
        if score <= threshold {
            continue;
        }
        let (cx, cy, w, h) = (anchor[0], anchor[1], anchor[2], anchor[3]);
        let bbox = letterbox.restore([cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0]);
        candidates.push(RawDetection {
            bbox,
            confidence: score,
            class_id,
        });
    }
    Ok(candidates)
}

/// Compute the Intersection over Union (IoU) of two xyxy boxes.
pub fn compute_iou(b1: &[f32; 4], b2: &[f32; 4]) -> f32 {
    let (x1_1, y1_1, x2_1, y2_1) = (b1[0], b1[1], b1[2], b1[3]);
    let (x1_2, y1_2, x2_2, y2_2) = (b2[0], b2[1], b2[2], b2[3]);

    let inter_x1 = x1_1.max(x1_2);
    let inter_y1 = y1_1.max(y1_2);
    let inter_x2 = x2_1.min(x2_2);
    let inter_y2 = y2_1.min(y2_2);

    let inter_area = ((inter_x2 - inter_x1).max(0.0)) * ((inter_y2 - inter_y1).max(0.0));
    let area1 = (x2_1 - x1_1).max(0.0) * (y2_1 - y1_1).max(0.0);
    let area2 = (x2_2 - x1_2).max(0.0) * (y2_2 - y1_2).max(0.0);
    let union_area = area1 + area2 - inter_area;
    if union_area <= 0.0 { 0.0 } else { inter_area / union_area }
}

/// Class-aware NMS. Returns at most `max_det` detections, highest
/// confidence first.
pub fn non_maximum_suppression(
    detections: Vec<RawDetection>,
    iou_threshold: f32,
    max_det: usize,
) -> Vec<RawDetection> {
    // Group indices by class id.
    let mut by_class: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, det) in detections.iter().enumerate() {
        by_class.entry(det.class_id).or_default().push(i);
    }

    let mut keep_indices: Vec<usize> = Vec::new();

    for indices in by_class.values_mut() {
        indices.sort_by(|&i1, &i2| {
            detections[i2]
                .confidence
                .total_cmp(&detections[i1].confidence)
        });

        let mut suppressed = vec![false; indices.len()];
        for i in 0..indices.len() {
            if suppressed[i] {
                continue;
            }
            let idx_i = indices[i];
            keep_indices.push(idx_i);
            for j in (i + 1)..indices.len() {
                if suppressed[j] {
                    continue;
                }
                let idx_j = indices[j];
                let iou = compute_iou(&detections[idx_i].bbox, &detections[idx_j].bbox);
                if iou > iou_threshold {
                    suppressed[j] = true;
                }
            }
        }
    }

    // Highest confidence first, ties broken by original position
    keep_indices.sort_by(|&a, &b| {
        detections[b]
            .confidence
            .total_cmp(&detections[a].confidence)
            .then(a.cmp(&b))
    });
    keep_indices.truncate(max_det);

    let mut slots: Vec<Option<RawDetection>> = detections.into_iter().map(Some).collect();
    keep_indices
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}
