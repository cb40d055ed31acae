//! Random crop rectangles in normalized image coordinates.
//!
//! A rectangle is built from four draws, in this order:
//!
//! ```text
//! area   ~ area_factor
//! aspect ~ aspect_ratio_factor
//! h = clip(sqrt(area / aspect), 0, 1)      w = clip(sqrt(area * aspect), 0, 1)
//! y1 ~ U[min(0, 1 - h), max(0, 1 - h)]     x1 ~ U[min(0, 1 - w), max(0, 1 - w)]
//! (y1, x1, y2, x2) = (y1, x1, y1 + h, x1 + w)
//! ```
//!
//! Clipping `h` and `w` keeps the crop inside the image when an area/aspect
//! pair would imply a side longer than the image. The offset intervals stay
//! valid when `h` or `w` is exactly 0 or 1: the interval collapses to a point
//! but the draw is still taken, so the stream advances the same amount on
//! every call.

use crate::config::AugmentationConfig;
use crate::factor::FactorSampler;
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// `(y1, x1, y2, x2)` as fractions of image height and width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRectangle {
    pub y1: f64,
    pub x1: f64,
    pub y2: f64,
    pub x2: f64,
}

impl CropRectangle {
    /// The whole image.
    pub const FULL: CropRectangle = CropRectangle {
        y1: 0.0,
        x1: 0.0,
        y2: 1.0,
        x2: 1.0,
    };

    pub fn new(y1: f64, x1: f64, y2: f64, x2: f64) -> Self {
        Self { y1, x1, y2, x2 }
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn area(&self) -> f64 {
        self.height() * self.width()
    }

    /// `[y1, x1, y2, x2]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.y1, self.x1, self.y2, self.x2]
    }
}

/// Clamps to `[0, 1]`, sending NaN to 0.
#[inline]
fn unit_clip(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Turns area and aspect-ratio draws into crop rectangles.
#[derive(Debug, Clone)]
pub struct CropGeometrySampler {
    area_factor: FactorSampler,
    aspect_ratio_factor: FactorSampler,
}

impl CropGeometrySampler {
    /// Creates a sampler for `config`'s factors.
    ///
    /// Logs a warning if both factors are pinned to 0, since every crop is
    /// then empty and the augmentation does nothing useful.
    pub fn new(config: &AugmentationConfig) -> Self {
        if config.is_degenerate() {
            warn!(
                "RandomResizedCrop received both `area_factor=0.0` and \
                 `aspect_ratio_factor=0.0`. As a result, the layer will perform no augmentation."
            );
        }
        Self {
            area_factor: config.area_factor().clone(),
            aspect_ratio_factor: config.aspect_ratio_factor().clone(),
        }
    }

    /// Normalized `(height, width)` of a crop for one area/aspect pair.
    pub fn crop_extent(area_factor: f64, aspect_ratio: f64) -> (f64, f64) {
        let height = unit_clip((area_factor / aspect_ratio).sqrt());
        let width = unit_clip((area_factor * aspect_ratio).sqrt());
        (height, width)
    }

    /// Draws one rectangle. Takes exactly four draws from `rng` when both
    /// factors are built-in samplers.
    pub fn sample(&self, rng: &mut dyn RandomSource) -> CropRectangle {
        let area_factor = self.area_factor.draw(rng);
        let aspect_ratio = self.aspect_ratio_factor.draw(rng);
        let (height, width) = Self::crop_extent(area_factor, aspect_ratio);

        let height_offset = rng.uniform(f64::min(0.0, 1.0 - height), f64::max(0.0, 1.0 - height));
        let width_offset = rng.uniform(f64::min(0.0, 1.0 - width), f64::max(0.0, 1.0 - width));

        let rect = CropRectangle::new(
            height_offset,
            width_offset,
            height_offset + height,
            width_offset + width,
        );
        trace!(area_factor, aspect_ratio, ?rect, "sampled crop rectangle");
        rect
    }
}
