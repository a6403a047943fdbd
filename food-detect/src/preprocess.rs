use image::{DynamicImage, RgbImage};
use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, ResizeAlg, ResizeOptions, Resizer};
use ndarray::Array4;

use crate::error::ModelError;

#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// square network input size
    pub size: u32,
    pub pad_value: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            size: 640,
            pad_value: 114,
        }
    }
}

/// Geometry of one letterboxed image, used to map boxes back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub orig_w: u32,
    pub orig_h: u32,
}

impl Letterbox {
    /// Map an xyxy box from network input space to original pixels,
    /// clipped to the image.
    pub fn restore(&self, xyxy: [f32; 4]) -> [f32; 4] {
        let w = self.orig_w as f32;
        let h = self.orig_h as f32;
        [
            ((xyxy[0] - self.pad_x as f32) / self.scale).clamp(0.0, w),
            ((xyxy[1] - self.pad_y as f32) / self.scale).clamp(0.0, h),
            ((xyxy[2] - self.pad_x as f32) / self.scale).clamp(0.0, w),
            ((xyxy[3] - self.pad_y as f32) / self.scale).clamp(0.0, h),
        ]
    }
}

#[derive(Debug)]
pub struct Processor {
    pub config: PreprocessConfig,
}

impl Processor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Resize keeping aspect ratio, centre on a padded square and lay the
    /// pixels out as NCHW floats in [0, 1].
    pub fn preprocess(&self, x: &DynamicImage) -> Result<(Array4<f32>, Letterbox), ModelError> {
        let size = self.config.size;
        let (orig_width, orig_height) = (x.width(), x.height());
        if orig_width == 0 || orig_height == 0 {
            return Err(ModelError::Preprocess(format!(
                "image has no pixels ({}x{})",
                orig_width, orig_height
            )));
        }

        let scale = (size as f32 / orig_width as f32).min(size as f32 / orig_height as f32);
        let new_width = ((orig_width as f32 * scale).round() as u32).clamp(1, size);
        let new_height = ((orig_height as f32 * scale).round() as u32).clamp(1, size);

        let src = DynamicImage::ImageRgb8(x.to_rgb8());
        let mut dst_image = Image::new(new_width, new_height, PixelType::U8x3);
        let mut resizer = Resizer::new();
        let resize_options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
            fast_image_resize::FilterType::Bilinear,
        ));
        resizer
            .resize(&src, &mut dst_image, Some(&resize_options))
            .map_err(|e| ModelError::Preprocess(e.to_string()))?;
        let resized = RgbImage::from_raw(new_width, new_height, dst_image.into_vec())
            .ok_or_else(|| ModelError::Preprocess("resized buffer has the wrong length".into()))?;

        let pad = self.config.pad_value;
        let mut padded = RgbImage::from_pixel(size, size, image::Rgb([pad, pad, pad]));
        // Offsets that centre the resized image in the padded square
        let x_offset = (size - new_width) / 2;
        let y_offset = (size - new_height) / 2;
        image::imageops::overlay(&mut padded, &resized, x_offset as i64, y_offset as i64);

        let side = size as usize;
        let mut img_arr = Array4::<f32>::zeros((1, 3, side, side));
        for (x, y, rgb) in padded.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            img_arr[[0, 0, y, x]] = rgb[0] as f32 / 255.0;
            img_arr[[0, 1, y, x]] = rgb[1] as f32 / 255.0;
            img_arr[[0, 2, y, x]] = rgb[2] as f32 / 255.0;
        }

        Ok((
            img_arr,
            Letterbox {
                scale,
                pad_x: x_offset,
                pad_y: y_offset,
                orig_w: orig_width,
                orig_h: orig_height,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([255, 0, 0])))
    }

    #[test]
    fn wide_image_is_padded_top_and_bottom() {
        let processor = Processor::new(PreprocessConfig::default());
        let (xs, lb) = processor.preprocess(&solid(1280, 640)).unwrap();

        assert_eq!(xs.shape(), &[1, 3, 640, 640]);
        assert_eq!(lb.scale, 0.5);
        assert_eq!((lb.pad_x, lb.pad_y), (0, 160));
        // padding row above the image
        assert!((xs[[0, 0, 10, 320]] - 114.0 / 255.0).abs() < 1e-6);
        // inside the image
        assert!((xs[[0, 0, 320, 320]] - 1.0).abs() < 1e-6);
        assert!(xs[[0, 1, 320, 320]].abs() < 1e-6);
    }

    #[test]
    fn restore_inverts_letterbox() {
        let processor = Processor::new(PreprocessConfig::default());
        let (_, lb) = processor.preprocess(&solid(1280, 640)).unwrap();

        // (100, 50)-(300, 250) in the original lands at (50, 185)-(150, 285)
        let restored = lb.restore([50.0, 185.0, 150.0, 285.0]);
        let expected = [100.0, 50.0, 300.0, 250.0];
        for (got, want) in restored.iter().zip(expected) {
            assert!((got - want).abs() <= 1.0, "{got} vs {want}");
        }
    }

    #[test]
    fn restore_clips_to_image() {
        let lb = Letterbox { scale: 1.0, pad_x: 0, pad_y: 0, orig_w: 100, orig_h: 80 };
        assert_eq!(lb.restore([-5.0, -1.0, 120.0, 90.0]), [0.0, 0.0, 100.0, 80.0]);
    }
}
