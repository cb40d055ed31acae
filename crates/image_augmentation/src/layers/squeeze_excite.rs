//! Squeeze-and-excite channel attention (Hu et al., 2018).
//!
//! ```text
//! x: (N, H, W, C)
//!   -> global average pool      (N, C)
//!   -> dense C -> C * ratio     + squeeze activation (ReLU)
//!   -> dense C * ratio -> C     + excite activation (sigmoid)
//!   -> x * scale                broadcast over H and W
//! ```
//!
//! The two dense layers are the 1x1 convolutions of the reference block
//! applied to a 1x1 feature map.

use crate::error::{ConfigError, Result as ConfigResult};
use crate::rng::{RandomSource, SeededRng, WorkerRng};
use crate::transforms::Transform;
use anyhow::{ensure, Result};
use ndarray::{Array1, Array2, Array4, ArrayView4, Axis};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    Sigmoid,
    /// `clip(0.2 * x + 0.5, 0, 1)`
    HardSigmoid,
    /// `x * sigmoid(x)`
    Swish,
    Linear,
}

impl Activation {
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::HardSigmoid => (0.2 * x + 0.5).clamp(0.0, 1.0),
            Activation::Swish => x / (1.0 + (-x).exp()),
            Activation::Linear => x,
        }
    }
}

impl FromStr for Activation {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s {
            "relu" => Ok(Activation::Relu),
            "sigmoid" => Ok(Activation::Sigmoid),
            "hard_sigmoid" => Ok(Activation::HardSigmoid),
            "swish" | "silu" => Ok(Activation::Swish),
            "linear" => Ok(Activation::Linear),
            other => Err(ConfigError::InvalidFactor {
                param: "activation",
                reason: format!("unknown activation `{other}`"),
            }),
        }
    }
}

fn default_ratio() -> f64 {
    0.25
}

fn default_squeeze() -> Activation {
    Activation::Relu
}

fn default_excite() -> Activation {
    Activation::Sigmoid
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqueezeExciteConfig {
    /// Input and output channel count.
    pub filters: usize,
    /// Bottleneck width as a fraction of `filters`, strictly inside (0, 1).
    #[serde(default = "default_ratio")]
    pub ratio: f64,
    #[serde(default = "default_squeeze")]
    pub squeeze_activation: Activation,
    #[serde(default = "default_excite")]
    pub excite_activation: Activation,
    /// Seed for weight initialization.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SqueezeExciteConfig {
    pub fn new(filters: usize) -> Self {
        Self {
            filters,
            ratio: default_ratio(),
            squeeze_activation: default_squeeze(),
            excite_activation: default_excite(),
            seed: None,
        }
    }

    pub fn ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn squeeze_activation(mut self, activation: Activation) -> Self {
        self.squeeze_activation = activation;
        self
    }

    pub fn excite_activation(mut self, activation: Activation) -> Self {
        self.excite_activation = activation;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of bottleneck filters, `floor(filters * ratio)`.
    pub fn bottleneck_filters(&self) -> usize {
        (self.filters as f64 * self.ratio) as usize
    }

    fn validate(&self) -> ConfigResult<()> {
        if !(self.ratio > 0.0 && self.ratio < 1.0) {
            return Err(ConfigError::InvalidRatio(self.ratio));
        }
        if self.filters == 0 {
            return Err(ConfigError::InvalidFilters(self.filters));
        }
        if self.bottleneck_filters() == 0 {
            return Err(ConfigError::EmptyBottleneck {
                filters: self.filters,
                ratio: self.ratio,
            });
        }
        Ok(())
    }
}

/// Glorot-uniform `(fan_in, fan_out)` matrix.
fn glorot_uniform(rng: &mut dyn RandomSource, fan_in: usize, fan_out: usize) -> Array2<f32> {
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    Array2::from_shape_simple_fn((fan_in, fan_out), || rng.uniform(-limit, limit) as f32)
}

#[derive(Debug, Clone)]
pub struct SqueezeExcite {
    config: SqueezeExciteConfig,
    squeeze_kernel: Array2<f32>,
    squeeze_bias: Array1<f32>,
    excite_kernel: Array2<f32>,
    excite_bias: Array1<f32>,
}

impl SqueezeExcite {
    /// Validates `config` and initializes weights (Glorot-uniform kernels,
    /// zero biases).
    pub fn new(config: SqueezeExciteConfig) -> ConfigResult<Self> {
        config.validate()?;
        let filters = config.filters;
        let bottleneck = config.bottleneck_filters();

        let mut rng: Box<dyn RandomSource> = match config.seed {
            Some(seed) => Box::new(SeededRng::new(seed)),
            None => Box::new(WorkerRng),
        };
        let squeeze_kernel = glorot_uniform(&mut *rng, filters, bottleneck);
        let excite_kernel = glorot_uniform(&mut *rng, bottleneck, filters);

        debug!(filters, bottleneck, "built squeeze-excite block");
        Ok(Self {
            config,
            squeeze_kernel,
            squeeze_bias: Array1::zeros(bottleneck),
            excite_kernel,
            excite_bias: Array1::zeros(filters),
        })
    }

    /// Replaces all weights after checking their shapes.
    pub fn with_weights(
        mut self,
        squeeze_kernel: Array2<f32>,
        squeeze_bias: Array1<f32>,
        excite_kernel: Array2<f32>,
        excite_bias: Array1<f32>,
    ) -> ConfigResult<Self> {
        let filters = self.config.filters;
        let bottleneck = self.config.bottleneck_filters();
        check_shape("squeeze_kernel", &[filters, bottleneck], squeeze_kernel.shape())?;
        check_shape("squeeze_bias", &[bottleneck], squeeze_bias.shape())?;
        check_shape("excite_kernel", &[bottleneck, filters], excite_kernel.shape())?;
        check_shape("excite_bias", &[filters], excite_bias.shape())?;

        self.squeeze_kernel = squeeze_kernel;
        self.squeeze_bias = squeeze_bias;
        self.excite_kernel = excite_kernel;
        self.excite_bias = excite_bias;
        Ok(self)
    }

    pub fn config(&self) -> &SqueezeExciteConfig {
        &self.config
    }

    /// Per-channel scale factors, shape `(N, C)`.
    pub fn channel_scales(&self, input: ArrayView4<f32>) -> Result<Array2<f32>> {
        let (_, height, width, channels) = input.dim();
        ensure!(
            channels == self.config.filters,
            "Channel count mismatch: input has {} channels but the block expects {}",
            channels,
            self.config.filters
        );
        ensure!(
            height > 0 && width > 0,
            "Feature map must be non-empty (got {}x{})",
            height,
            width
        );

        let pixels = (height * width) as f32;
        let pooled = input.sum_axis(Axis(1)).sum_axis(Axis(1)) / pixels;

        let squeeze_act = self.config.squeeze_activation;
        let excite_act = self.config.excite_activation;
        let squeezed = (pooled.dot(&self.squeeze_kernel) + &self.squeeze_bias).mapv(|v| squeeze_act.apply(v));
        let excited = (squeezed.dot(&self.excite_kernel) + &self.excite_bias).mapv(|v| excite_act.apply(v));
        Ok(excited)
    }

    /// Rescales each channel of an `(N, H, W, C)` feature map.
    pub fn forward(&self, input: ArrayView4<f32>) -> Result<Array4<f32>> {
        let scales = self.channel_scales(input)?;
        let scales = scales.insert_axis(Axis(1)).insert_axis(Axis(1));
        Ok(&input * &scales)
    }
}

fn check_shape(name: &'static str, expected: &[usize], found: &[usize]) -> ConfigResult<()> {
    if expected != found {
        return Err(ConfigError::WeightShape {
            name,
            expected: expected.to_vec(),
            found: found.to_vec(),
        });
    }
    Ok(())
}

impl Transform<Array4<f32>, Array4<f32>> for SqueezeExcite {
    fn apply(&self, input: Array4<f32>) -> Result<Array4<f32>> {
        self.forward(input.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array;

    #[test]
    fn test_output_shape_matches_input() -> Result<()> {
        let block = SqueezeExcite::new(SqueezeExciteConfig::new(16).seed(0))?;
        let input = Array4::<f32>::ones((1, 5, 5, 16));
        let out = block.apply(input)?;
        assert_eq!(out.dim(), (1, 5, 5, 16));
        Ok(())
    }

    #[test]
    fn test_ratio_and_filters_validation() {
        for ratio in [0.0, 1.0, -0.5, 1.5] {
            let err = SqueezeExcite::new(SqueezeExciteConfig::new(8).ratio(ratio)).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRatio(_)));
        }
        let err = SqueezeExcite::new(SqueezeExciteConfig::new(0)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFilters(0)));

        let err = SqueezeExcite::new(SqueezeExciteConfig::new(3).ratio(0.25)).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyBottleneck { .. }));
    }

    #[test]
    fn test_zero_weights_halve_every_channel() -> Result<()> {
        // zero kernels and biases give sigmoid(0) = 0.5 for every channel
        let block = SqueezeExcite::new(SqueezeExciteConfig::new(4).ratio(0.5).seed(1))?.with_weights(
            Array2::zeros((4, 2)),
            Array1::zeros(2),
            Array2::zeros((2, 4)),
            Array1::zeros(4),
        )?;
        let input = Array::from_shape_fn((2, 3, 3, 4), |(n, y, x, c)| (n + y + x + c) as f32);
        let out = block.forward(input.view())?;
        for (o, i) in out.iter().zip(input.iter()) {
            assert_abs_diff_eq!(*o, i * 0.5, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_scales_follow_channel_means() -> Result<()> {
        // identity-like weights with linear activations: scale == channel mean
        let block = SqueezeExcite::new(
            SqueezeExciteConfig::new(2)
                .ratio(0.5)
                .squeeze_activation(Activation::Linear)
                .excite_activation(Activation::Linear),
        )?
        .with_weights(
            Array2::from_shape_vec((2, 1), vec![1.0, 0.0])?,
            Array1::zeros(1),
            Array2::from_shape_vec((1, 2), vec![1.0, 1.0])?,
            Array1::zeros(2),
        )?;
        let input = Array::from_shape_fn((1, 2, 2, 2), |(_, y, x, c)| if c == 0 { (y * 2 + x) as f32 } else { 9.0 });
        let scales = block.channel_scales(input.view())?;
        assert_abs_diff_eq!(scales[[0, 0]], 1.5, epsilon = 1e-6);
        assert_abs_diff_eq!(scales[[0, 1]], 1.5, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_wrong_weight_shape_is_rejected() -> Result<()> {
        let block = SqueezeExcite::new(SqueezeExciteConfig::new(4).ratio(0.5).seed(0))?;
        let err = block
            .with_weights(Array2::zeros((2, 4)), Array1::zeros(2), Array2::zeros((2, 4)), Array1::zeros(4))
            .unwrap_err();
        assert_eq!(err.param(), Some("squeeze_kernel"));
        Ok(())
    }

    #[test]
    fn test_channel_mismatch_fails_at_call_time() -> Result<()> {
        let block = SqueezeExcite::new(SqueezeExciteConfig::new(8).seed(0))?;
        assert!(block.forward(Array4::zeros((1, 2, 2, 4)).view()).is_err());
        Ok(())
    }

    #[test]
    fn test_config_json_defaults() -> Result<()> {
        let config: SqueezeExciteConfig = serde_json::from_str(r#"{"filters": 32, "seed": 3}"#)?;
        assert_eq!(config, SqueezeExciteConfig::new(32).seed(3));
        let same = SqueezeExcite::new(config.clone())?;
        let again = SqueezeExcite::new(config)?;
        assert_eq!(same.squeeze_kernel, again.squeeze_kernel);
        Ok(())
    }

    #[test]
    fn test_activation_names() -> Result<()> {
        assert_eq!("hard_sigmoid".parse::<Activation>()?, Activation::HardSigmoid);
        assert!("gelu".parse::<Activation>().is_err());
        assert_abs_diff_eq!(Activation::HardSigmoid.apply(0.0), 0.5);
        Ok(())
    }

    #[test]
    fn test_hard_sigmoid_is_piecewise_linear() {
        let hs = Activation::HardSigmoid;
        assert_abs_diff_eq!(hs.apply(-1.0), 0.3, epsilon = 1e-6);
        assert_abs_diff_eq!(hs.apply(1.0), 0.7, epsilon = 1e-6);
        // saturates outside [-2.5, 2.5]
        assert_eq!(hs.apply(-2.5), 0.0);
        assert_eq!(hs.apply(-4.0), 0.0);
        assert_eq!(hs.apply(2.5), 1.0);
        assert_eq!(hs.apply(4.0), 1.0);
    }
}
