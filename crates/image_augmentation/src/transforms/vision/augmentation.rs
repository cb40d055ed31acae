use super::crop_geometry::{CropGeometrySampler, CropRectangle};
use super::ops::{crop_and_resize_image, smart_resize, smart_resize_batch};
use crate::config::{AugmentationConfig, BatchSampling};
use crate::rng::{RandomSource, SeededRng, WorkerRng};
use crate::tensor::{Element, Image, ImageBatch};
use crate::transforms::Transform;
use anyhow::{ensure, Result};
use ndarray::{Array3, Array4, ArrayView3, ArrayView4};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Whether a layer augments (training) or only resizes (inference).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Training,
    Inference,
}

// ============================================================================
// RandomResizedCrop
// ============================================================================

/// Randomly crops part of an image and resizes it to the target size.
///
/// In training mode a rectangle is drawn from the area and aspect-ratio
/// factors (see [`CropGeometrySampler`]), cropped with fractional
/// boundaries and resampled to exactly `target_size`. In inference mode the
/// rectangle sampler is skipped and the image is smart-resized (centre crop
/// to the target aspect ratio, then resize).
///
/// Batches follow the config's [`BatchSampling`]: one rectangle per element
/// by default, or one rectangle shared by the whole batch.
///
/// Random draws come from a [`SeededRng`] when the config carries a seed,
/// otherwise from the loader worker's stream ([`WorkerRng`]).
///
/// # Example
/// ```ignore
/// let config = AugmentationConfig::builder((224, 224)).seed(42).build()?;
/// let crop = RandomResizedCrop::new(config);
/// let pipeline = EnsureRGB.then(ToTensor).then(crop);
/// let out: Array3<f32> = pipeline.apply(image)?;
/// assert_eq!(out.dim(), (224, 224, 3));
/// ```
pub struct RandomResizedCrop {
    config: AugmentationConfig,
    sampler: CropGeometrySampler,
    rng: Mutex<Box<dyn RandomSource>>,
    mode: Mode,
}

fn default_rng(config: &AugmentationConfig) -> Box<dyn RandomSource> {
    match config.seed() {
        Some(seed) => Box::new(SeededRng::new(seed)),
        None => Box::new(WorkerRng),
    }
}

impl RandomResizedCrop {
    pub fn new(config: AugmentationConfig) -> Self {
        debug!(
            target_size = ?config.target_size(),
            area_factor = ?config.area_factor().bounds(),
            aspect_ratio_factor = ?config.aspect_ratio_factor().bounds(),
            interpolation = %config.interpolation(),
            seed = ?config.seed(),
            "building RandomResizedCrop"
        );
        Self {
            sampler: CropGeometrySampler::new(&config),
            rng: Mutex::new(default_rng(&config)),
            config,
            mode: Mode::Training,
        }
    }

    /// Replaces the random source.
    pub fn with_rng(self, rng: impl RandomSource + 'static) -> Self {
        Self {
            rng: Mutex::new(Box::new(rng)),
            ..self
        }
    }

    /// Switches to training mode (random crops).
    pub fn train(mut self) -> Self {
        self.mode = Mode::Training;
        self
    }

    /// Switches to inference mode (smart resize only).
    pub fn eval(mut self) -> Self {
        self.mode = Mode::Inference;
        self
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &AugmentationConfig {
        &self.config
    }

    /// Swaps in a new configuration.
    ///
    /// The random source is reseeded only when the seed changes, so an
    /// injected source survives updates that keep the seed.
    pub fn reconfigure(&mut self, config: AugmentationConfig) {
        debug!(target_size = ?config.target_size(), seed = ?config.seed(), "reconfiguring RandomResizedCrop");
        if config.seed() != self.config.seed() {
            *self.rng.get_mut().unwrap_or_else(PoisonError::into_inner) = default_rng(&config);
        }
        self.sampler = CropGeometrySampler::new(&config);
        self.config = config;
    }

    fn rng(&self) -> MutexGuard<'_, Box<dyn RandomSource>> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Draws the next crop rectangle from the layer's random source.
    pub fn sample_rectangle(&self) -> CropRectangle {
        let mut rng = self.rng();
        self.sampler.sample(&mut **rng)
    }

    /// Crops `rect` out of `image` and resamples it to the target size.
    pub fn crop_resize<T: Element>(&self, image: ArrayView3<T>, rect: &CropRectangle) -> Array3<T> {
        crop_and_resize_image(
            image,
            rect,
            self.config.target_size(),
            self.config.interpolation(),
            0.0,
        )
    }

    /// Inference path for one image.
    pub fn resize<T: Element>(&self, image: ArrayView3<T>) -> Array3<T> {
        smart_resize(image, self.config.target_size(), self.config.interpolation())
    }

    /// Runs one image through the layer.
    pub fn forward_image<T: Element>(&self, image: ArrayView3<T>, training: bool) -> Array3<T> {
        if !training {
            return self.resize(image);
        }
        let rect = self.sample_rectangle();
        self.crop_resize(image, &rect)
    }

    /// Runs a `(batch, H, W, C)` tensor through the layer.
    pub fn forward_batch<T: Element>(&self, images: ArrayView4<T>, training: bool) -> Array4<T> {
        if !training {
            return smart_resize_batch(images, self.config.target_size(), self.config.interpolation());
        }

        let (batch, _, _, channels) = images.dim();
        let (height, width) = self.config.target_size();
        let mut out = Array4::<T>::default((batch, height, width, channels));

        let shared = match self.config.batch_sampling() {
            BatchSampling::Shared => Some(self.sample_rectangle()),
            BatchSampling::PerImage => None,
        };
        for (src, mut dst) in images.outer_iter().zip(out.outer_iter_mut()) {
            let rect = shared.unwrap_or_else(|| self.sample_rectangle());
            dst.assign(&self.crop_resize(src, &rect));
        }
        out
    }
}

impl fmt::Debug for RandomResizedCrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomResizedCrop")
            .field("config", &self.config)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl<T: Element> Transform<Image<T>, Image<T>> for RandomResizedCrop {
    fn apply(&self, image: Image<T>) -> Result<Image<T>> {
        let (height, width, _) = image.dim();
        ensure!(
            height > 0 && width > 0,
            "Image dimensions must be positive (got {}x{})",
            width,
            height
        );
        Ok(self.forward_image(image.view(), self.mode == Mode::Training))
    }
}

impl<T: Element> Transform<ImageBatch<T>, ImageBatch<T>> for RandomResizedCrop {
    fn apply(&self, images: ImageBatch<T>) -> Result<ImageBatch<T>> {
        let (_, height, width, _) = images.dim();
        ensure!(
            height > 0 && width > 0,
            "Image dimensions must be positive (got {}x{})",
            width,
            height
        );
        Ok(self.forward_batch(images.view(), self.mode == Mode::Training))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Interpolation;
    use crate::rng::ScriptedRng;
    use ndarray::{Array, Axis};

    fn layer(target: (usize, usize), mode: BatchSampling) -> anyhow::Result<RandomResizedCrop> {
        let config = AugmentationConfig::builder(target)
            .area_factor((0.3, 0.9))
            .batch_sampling(mode)
            .seed(42)
            .build()?;
        Ok(RandomResizedCrop::new(config))
    }

    fn gradient_batch(batch: usize, height: usize, width: usize) -> Array4<f32> {
        Array::from_shape_fn((batch, height, width, 3), |(b, y, x, c)| {
            (b * 7 + y * width + x + c) as f32
        })
    }

    #[test]
    fn test_single_image_output_size() -> Result<()> {
        let crop = layer((20, 30), BatchSampling::PerImage)?;
        for (h, w) in [(64, 64), (17, 93), (200, 11)] {
            let out: Array3<f32> = crop.apply(Array3::zeros((h, w, 3)))?;
            assert_eq!(out.dim(), (20, 30, 3));
        }
        Ok(())
    }

    #[test]
    fn test_shared_batch_uses_one_rectangle() -> Result<()> {
        let crop = layer((8, 8), BatchSampling::Shared)?.with_rng(ScriptedRng::new([0.1, 0.6, 0.3, 0.8]));
        let batch = Array4::from_shape_fn((3, 16, 16, 1), |(_, y, x, _)| (y * 16 + x) as f32);
        let out: Array4<f32> = crop.apply(batch)?;
        assert_eq!(out.index_axis(Axis(0), 0), out.index_axis(Axis(0), 1));
        assert_eq!(out.index_axis(Axis(0), 1), out.index_axis(Axis(0), 2));
        Ok(())
    }

    #[test]
    fn test_per_image_batch_draws_per_element() -> Result<()> {
        let crop = layer((8, 8), BatchSampling::PerImage)?;
        let batch = Array4::from_shape_fn((4, 16, 16, 1), |(_, y, x, _)| (y * 16 + x) as f32);
        let out: Array4<f32> = crop.apply(batch)?;
        let first = out.index_axis(Axis(0), 0);
        assert!((1..4).any(|b| out.index_axis(Axis(0), b) != first));
        Ok(())
    }

    #[test]
    fn test_eval_batch_is_smart_resized() -> Result<()> {
        let crop = layer((6, 6), BatchSampling::PerImage)?.eval();
        let batch = gradient_batch(2, 12, 24);
        let expected = smart_resize_batch(batch.view(), (6, 6), Interpolation::Bilinear);
        let out: Array4<f32> = crop.apply(batch)?;
        assert_eq!(out, expected);
        Ok(())
    }

    #[test]
    fn test_u8_images_stay_u8() -> Result<()> {
        let crop = layer((5, 5), BatchSampling::PerImage)?;
        let out: Array3<u8> = crop.apply(Array3::from_elem((9, 9, 3), 77u8))?;
        assert!(out.iter().all(|&v| v == 77));
        Ok(())
    }

    #[test]
    fn test_empty_image_is_rejected() -> Result<()> {
        let crop = layer((5, 5), BatchSampling::PerImage)?;
        let result: Result<Array3<f32>> = crop.apply(Array3::zeros((0, 4, 3)));
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_reconfigure_reseeds_only_on_seed_change() -> Result<()> {
        let mut crop = layer((4, 4), BatchSampling::PerImage)?;
        let first = crop.sample_rectangle();

        let same_seed = crop.config().to_builder().target_size((6, 6)).build()?;
        crop.reconfigure(same_seed);
        assert_eq!(crop.config().target_size(), (6, 6));
        assert_ne!(crop.sample_rectangle(), first);

        let reseeded = crop.config().to_builder().seed(43).build()?;
        crop.reconfigure(reseeded);
        let fresh = RandomResizedCrop::new(crop.config().clone());
        assert_eq!(crop.sample_rectangle(), fresh.sample_rectangle());
        Ok(())
    }
}
