use super::ops::{resize, smart_resize};
use crate::config::Interpolation;
use crate::error::{ConfigError, Result as ConfigResult};
use crate::tensor::Element;
use crate::transforms::Transform;
use anyhow::{ensure, Result};
use image::DynamicImage;
use ndarray::Array3;

// ============================================================================
// EnsureRGB
// ============================================================================
/// Ensures that the image is indeed 3-channel RGB
#[derive(Debug, Clone)]
pub struct EnsureRGB;

impl Transform<DynamicImage, DynamicImage> for EnsureRGB {
    fn apply(&self, img: DynamicImage) -> Result<DynamicImage> {
        Ok(match img {
            DynamicImage::ImageRgb8(_) => img,
            _ => DynamicImage::ImageRgb8(img.to_rgb8()),
        })
    }
}

fn checked_size(height: usize, width: usize) -> ConfigResult<(usize, usize)> {
    if height == 0 || width == 0 {
        return Err(ConfigError::InvalidTargetSize { height, width });
    }
    Ok((height, width))
}

// ============================================================================
// Resize
// ============================================================================

/// Resizes an `(H, W, C)` tensor to exactly `(height, width)`, stretching if
/// the aspect ratios differ.
///
/// # Examples
/// ``` ignore
/// let resize = Resize::new(256, 256, Interpolation::Bilinear)?;
/// let resized: Array3<f32> = resize.apply(tensor)?;
/// ```
#[derive(Debug, Clone)]
pub struct Resize {
    size: (usize, usize),
    interpolation: Interpolation,
}

impl Resize {
    pub fn new(height: usize, width: usize, interpolation: Interpolation) -> ConfigResult<Self> {
        Ok(Self {
            size: checked_size(height, width)?,
            interpolation,
        })
    }
}

impl<T: Element> Transform<Array3<T>, Array3<T>> for Resize {
    fn apply(&self, image: Array3<T>) -> Result<Array3<T>> {
        let (height, width, _) = image.dim();
        ensure!(
            height > 0 && width > 0,
            "Image dimensions must be positive (got {}x{})",
            width,
            height
        );
        Ok(resize(image.view(), self.size, self.interpolation))
    }
}

// ============================================================================
// SmartResize
// ============================================================================

/// Resizes without distortion: centre-crops the largest window with the
/// target aspect ratio, then resizes it to `(height, width)`.
///
/// This is what `RandomResizedCrop` runs in inference mode.
#[derive(Debug, Clone)]
pub struct SmartResize {
    size: (usize, usize),
    interpolation: Interpolation,
}

impl SmartResize {
    pub fn new(height: usize, width: usize, interpolation: Interpolation) -> ConfigResult<Self> {
        Ok(Self {
            size: checked_size(height, width)?,
            interpolation,
        })
    }
}

impl<T: Element> Transform<Array3<T>, Array3<T>> for SmartResize {
    fn apply(&self, image: Array3<T>) -> Result<Array3<T>> {
        let (height, width, _) = image.dim();
        ensure!(
            height > 0 && width > 0,
            "Image dimensions must be positive (got {}x{})",
            width,
            height
        );
        Ok(smart_resize(image.view(), self.size, self.interpolation))
    }
}
