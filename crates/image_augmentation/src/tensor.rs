//! Image tensors and their element types.
//!
//! Images are `(height, width, channel)` arrays and batches are
//! `(batch, height, width, channel)` arrays. Resampling kernels compute in
//! `f32` and cast back through [`Element`], so the output element type always
//! matches the input's.

use ndarray::{Array3, Array4};

pub type Image<T = f32> = Array3<T>;
pub type ImageBatch<T = f32> = Array4<T>;

/// Pixel element type a layer can compute in.
pub trait Element: Copy + Default + Send + Sync + 'static {
    fn to_f32(self) -> f32;
    fn from_f32(value: f32) -> Self;
}

impl Element for f32 {
    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }
}

impl Element for f64 {
    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value as f64
    }
}

/// Rounds and saturates to `[0, 255]`.
impl Element for u8 {
    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value.round().clamp(0.0, 255.0) as u8
    }
}
