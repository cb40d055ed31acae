use crate::transforms::Transform;
use anyhow::{bail, ensure, Context, Result};
use image::{DynamicImage, GenericImageView, GrayImage, RgbImage, RgbaImage};
use ndarray::Array3;

// ============================================================================
// ToTensor
// ============================================================================

/// Converts an image to a channel-last `f32` tensor in [0.0, 1.0] range.
///
/// Channel Handling
/// | Input Format  | Output Shape |
/// |---------------|--------------|
/// | Grayscale (L) | `[H, W, 1]`  |
/// | RGB           | `[H, W, 3]`  |
/// | RGBA          | `[H, W, 4]`  |
/// | Other         | `[H, W, 3]`  |
/// Note: *16-bit and float formats are converted to 8-bit RGB first.*
///
/// # Example
/// ```ignore
/// let tensor: Array3<f32> = ToTensor.apply(image)?;
/// ```
#[derive(Debug, Clone)]
pub struct ToTensor;

impl Transform<DynamicImage, Array3<f32>> for ToTensor {
    fn apply(&self, img: DynamicImage) -> Result<Array3<f32>> {
        let (width, height) = img.dimensions();
        ensure!(
            width > 0 && height > 0,
            "Image dimensions must be positive (got {}x{})",
            width,
            height
        );

        let (channels, raw) = match img {
            DynamicImage::ImageLuma8(img) => (1, img.into_raw()),
            DynamicImage::ImageRgb8(img) => (3, img.into_raw()),
            DynamicImage::ImageRgba8(img) => (4, img.into_raw()),
            // Handle all other cases via conversion to RGB
            other => (3, other.to_rgb8().into_raw()),
        };

        let tensor = Array3::from_shape_vec((height as usize, width as usize, channels), raw)
            .context("Pixel buffer does not match image dimensions")?;
        Ok(tensor.mapv(|v| v as f32 / 255.0))
    }
}

// ============================================================================
// ToImage
// ============================================================================

/// Converts a `[H, W, C]` tensor in [0.0, 1.0] back to an 8-bit image.
/// Values are clamped; `C` must be 1, 3 or 4.
#[derive(Debug, Clone)]
pub struct ToImage;

impl Transform<Array3<f32>, DynamicImage> for ToImage {
    fn apply(&self, tensor: Array3<f32>) -> Result<DynamicImage> {
        let (height, width, channels) = tensor.dim();
        let raw: Vec<u8> = tensor
            .iter()
            .map(|&v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect();
        let (w, h) = (width as u32, height as u32);

        let img = match channels {
            1 => GrayImage::from_raw(w, h, raw).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(w, h, raw).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(w, h, raw).map(DynamicImage::ImageRgba8),
            n => bail!("Cannot build an image with {} channels", n),
        };
        img.context("Tensor buffer does not match image dimensions")
    }
}
