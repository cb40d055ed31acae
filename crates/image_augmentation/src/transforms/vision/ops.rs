//! Resampling primitives on `(H, W, C)` tensors.
//!
//! - [`crop_and_resize`]: samples normalized boxes out of a batch at a fixed
//!   output size. Box edges map to pixel centres `y * (H - 1)`, so fractional
//!   boundaries are interpolated and samples that fall outside the image take
//!   the extrapolation value.
//! - [`resize`]: half-pixel-centre resampling of a whole image, no antialiasing.
//! - [`smart_resize`]: centre-crops to the target aspect ratio, then resizes,
//!   so content is never stretched.
//!
//! All kernels compute in `f32` and cast the result back to the element type.

use super::crop_geometry::CropRectangle;
use crate::config::Interpolation;
use crate::tensor::Element;
use anyhow::{ensure, Result};
use ndarray::{Array3, Array4, ArrayView3, ArrayView4, Axis};

/// Source sample for one output row or column.
/// `lo == hi` with `frac == 0` is a nearest-neighbour tap.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    lo: usize,
    hi: usize,
    frac: f32,
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Slack, relative to the axis length, within which a sample is snapped onto
/// the image edge instead of being treated as outside it.
const EDGE_SNAP: f32 = 1e-5;

/// Taps for one axis of a normalized crop `[start, end]`.
fn crop_axis(
    start: f32,
    end: f32,
    in_len: usize,
    out_len: usize,
    method: Interpolation,
) -> Vec<Option<Tap>> {
    let span = in_len as f32 - 1.0;
    let slack = EDGE_SNAP * span.max(1.0);
    let step = if out_len > 1 {
        (end - start) * span / (out_len - 1) as f32
    } else {
        0.0
    };

    (0..out_len)
        .map(|i| {
            let mut pos = if out_len > 1 {
                start * span + i as f32 * step
            } else {
                0.5 * (start + end) * span
            };
            if span >= 0.0 && pos > span && pos - span <= slack {
                pos = span;
            } else if span >= 0.0 && pos < 0.0 && pos >= -slack {
                pos = 0.0;
            }
            if !pos.is_finite() || pos < 0.0 || pos > span {
                return None;
            }
            Some(match method {
                Interpolation::Bilinear => {
                    let lo = pos.floor();
                    Tap {
                        lo: lo as usize,
                        hi: pos.ceil() as usize,
                        frac: pos - lo,
                    }
                }
                Interpolation::Nearest => {
                    let n = pos.round() as usize;
                    Tap {
                        lo: n,
                        hi: n,
                        frac: 0.0,
                    }
                }
            })
        })
        .collect()
}

/// Taps for one axis of a half-pixel-centre resize.
fn resize_axis(in_len: usize, out_len: usize, method: Interpolation) -> Vec<Option<Tap>> {
    if in_len == 0 {
        return vec![None; out_len];
    }
    let last = in_len - 1;
    let scale = in_len as f32 / out_len as f32;

    (0..out_len)
        .map(|i| {
            Some(match method {
                Interpolation::Bilinear => {
                    let pos = ((i as f32 + 0.5) * scale - 0.5).max(0.0);
                    let floor = pos.floor();
                    let lo = (floor as usize).min(last);
                    Tap {
                        lo,
                        hi: (lo + 1).min(last),
                        frac: pos - floor,
                    }
                }
                Interpolation::Nearest => {
                    let n = (((i as f32 + 0.5) * scale).floor() as usize).min(last);
                    Tap {
                        lo: n,
                        hi: n,
                        frac: 0.0,
                    }
                }
            })
        })
        .collect()
}

fn resample<T: Element>(
    image: ArrayView3<T>,
    rows: &[Option<Tap>],
    cols: &[Option<Tap>],
    extrapolation_value: f32,
) -> Array3<T> {
    let channels = image.dim().2;
    Array3::from_shape_fn((rows.len(), cols.len(), channels), |(y, x, c)| {
        match (rows[y], cols[x]) {
            (Some(r), Some(q)) => {
                let px = |yy: usize, xx: usize| image[[yy, xx, c]].to_f32();
                let top = lerp(px(r.lo, q.lo), px(r.lo, q.hi), q.frac);
                let bottom = lerp(px(r.hi, q.lo), px(r.hi, q.hi), q.frac);
                T::from_f32(lerp(top, bottom, r.frac))
            }
            _ => T::from_f32(extrapolation_value),
        }
    })
}

/// Crops `rect` out of one image and resamples it to `(height, width)`.
pub fn crop_and_resize_image<T: Element>(
    image: ArrayView3<T>,
    rect: &CropRectangle,
    (height, width): (usize, usize),
    method: Interpolation,
    extrapolation_value: f32,
) -> Array3<T> {
    let (in_h, in_w, _) = image.dim();
    let rows = crop_axis(rect.y1 as f32, rect.y2 as f32, in_h, height, method);
    let cols = crop_axis(rect.x1 as f32, rect.x2 as f32, in_w, width, method);
    resample(image, &rows, &cols, extrapolation_value)
}

/// Batched crop-and-resize.
///
/// `boxes[i]` is cropped from `images[box_indices[i]]`; the result holds one
/// `crop_size` image per box, in box order.
pub fn crop_and_resize<T: Element>(
    images: ArrayView4<T>,
    boxes: &[CropRectangle],
    box_indices: &[usize],
    crop_size: (usize, usize),
    method: Interpolation,
    extrapolation_value: f32,
) -> Result<Array4<T>> {
    ensure!(
        boxes.len() == box_indices.len(),
        "Got {} boxes but {} box indices",
        boxes.len(),
        box_indices.len()
    );
    let (batch, _, _, channels) = images.dim();
    if let Some(&bad) = box_indices.iter().find(|&&i| i >= batch) {
        anyhow::bail!("Box index {} is out of range for a batch of {}", bad, batch);
    }

    let mut out = Array4::<T>::default((boxes.len(), crop_size.0, crop_size.1, channels));
    for (i, (rect, &src)) in boxes.iter().zip(box_indices).enumerate() {
        let crop = crop_and_resize_image(
            images.index_axis(Axis(0), src),
            rect,
            crop_size,
            method,
            extrapolation_value,
        );
        out.index_axis_mut(Axis(0), i).assign(&crop);
    }
    Ok(out)
}

/// Resizes a whole image to `(height, width)`.
pub fn resize<T: Element>(
    image: ArrayView3<T>,
    (height, width): (usize, usize),
    method: Interpolation,
) -> Array3<T> {
    let (in_h, in_w, _) = image.dim();
    let rows = resize_axis(in_h, height, method);
    let cols = resize_axis(in_w, width, method);
    resample(image, &rows, &cols, 0.0)
}

/// Largest centred window of an `in_h x in_w` image with the aspect ratio of
/// `target`, as `(top, left, height, width)` in pixels.
pub fn center_crop_window(
    (in_h, in_w): (usize, usize),
    (target_h, target_w): (usize, usize),
) -> (usize, usize, usize, usize) {
    let crop_h = ((in_w as f64 * target_h as f64 / target_w as f64) as usize)
        .clamp(1, in_h.max(1))
        .min(in_h);
    let crop_w = ((in_h as f64 * target_w as f64 / target_h as f64) as usize)
        .clamp(1, in_w.max(1))
        .min(in_w);
    ((in_h - crop_h) / 2, (in_w - crop_w) / 2, crop_h, crop_w)
}

/// Aspect-preserving resize: minimal centre crop, then resize.
pub fn smart_resize<T: Element>(
    image: ArrayView3<T>,
    size: (usize, usize),
    method: Interpolation,
) -> Array3<T> {
    let (in_h, in_w, _) = image.dim();
    let (top, left, crop_h, crop_w) = center_crop_window((in_h, in_w), size);
    let window = image.slice(ndarray::s![top..top + crop_h, left..left + crop_w, ..]);
    resize(window, size, method)
}

/// [`smart_resize`] over every element of a batch.
pub fn smart_resize_batch<T: Element>(
    images: ArrayView4<T>,
    size: (usize, usize),
    method: Interpolation,
) -> Array4<T> {
    let (batch, in_h, in_w, channels) = images.dim();
    let (top, left, crop_h, crop_w) = center_crop_window((in_h, in_w), size);
    let rows = resize_axis(crop_h, size.0, method);
    let cols = resize_axis(crop_w, size.1, method);

    let mut out = Array4::<T>::default((batch, size.0, size.1, channels));
    for (src, mut dst) in images.outer_iter().zip(out.outer_iter_mut()) {
        let window = src.slice(ndarray::s![top..top + crop_h, left..left + crop_w, ..]);
        dst.assign(&resample(window, &rows, &cols, 0.0));
    }
    out
}
