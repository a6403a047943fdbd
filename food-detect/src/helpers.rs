use anyhow::Result;
use image::{DynamicImage, Rgba};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

use crate::types::Detection;

const BOX_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Draw each detection box on a copy of the image.
pub fn draw_boxes(image: &DynamicImage, detections: &[Detection]) -> DynamicImage {
    let mut img = image.to_rgba8();

    for det in detections {
        let width = det.bbox.x2 - det.bbox.x1;
        let height = det.bbox.y2 - det.bbox.y1;
        // Red rectangle with 2px thickness
        for inset in 0..2 {
            let (w, h) = (width - 2 * inset, height - 2 * inset);
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(det.bbox.x1 + inset, det.bbox.y1 + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut img, rect, BOX_COLOR);
        }
    }

    DynamicImage::ImageRgba8(img)
}

pub fn save_annotated(image: &DynamicImage, detections: &[Detection], output_path: &str) -> Result<()> {
    draw_boxes(image, detections).save(output_path)?;
    Ok(())
}
