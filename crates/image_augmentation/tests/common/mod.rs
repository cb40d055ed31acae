#![allow(dead_code)]

use image_augmentation::{AugmentationConfig, RandomSource, SeededRng};

use anyhow::Result;
use image::{DynamicImage, Rgb, RgbImage};
use ndarray::{Array, Array3};
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Seeded source that counts every draw in a shared counter, so a test can
/// keep observing it after the source is moved into a layer.
pub struct CountingRng {
    inner: SeededRng,
    draws: Arc<AtomicUsize>,
}

impl CountingRng {
    pub fn new(seed: u64) -> (Self, Arc<AtomicUsize>) {
        let draws = Arc::new(AtomicUsize::new(0));
        let rng = Self {
            inner: SeededRng::new(seed),
            draws: Arc::clone(&draws),
        };
        (rng, draws)
    }
}

impl RandomSource for CountingRng {
    fn next_unit(&mut self) -> f64 {
        self.draws.fetch_add(1, Ordering::SeqCst);
        self.inner.next_unit()
    }
}

/// `(height, width, channels)` tensor with a distinct value per pixel and channel
pub fn gradient_tensor(height: usize, width: usize, channels: usize) -> Array3<f32> {
    Array::from_shape_fn((height, width, channels), |(y, x, c)| {
        (y * width + x) as f32 / (height * width) as f32 + c as f32
    })
}

/// RGB image with red growing left to right and green top to bottom
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width) as u8;
            let g = (y * 255 / height) as u8;
            img.put_pixel(x, y, Rgb([r, g, 128]));
        }
    }
    DynamicImage::ImageRgb8(img)
}

/// Config with the given factors and seed
pub fn seeded_config(
    target_size: (usize, usize),
    area: (f64, f64),
    aspect: (f64, f64),
    seed: u64,
) -> Result<AugmentationConfig> {
    Ok(AugmentationConfig::builder(target_size)
        .area_factor(area)
        .aspect_ratio_factor(aspect)
        .seed(seed)
        .build()?)
}

/// In-memory log sink shared between a test and its subscriber.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a thread-scoped subscriber that records WARN and above,
/// returning `f`'s result and the formatted records.
pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}
