//! Configuration for `RandomResizedCrop`.
//!
//! `AugmentationConfig` is validated once, when it is built, and is immutable
//! afterwards. Invalid ratio bounds or malformed factors never reach the
//! sampler.
//!
//! Example:
//! ```ignore
//! let config = AugmentationConfig::builder((224, 224))
//!     .area_factor((0.08, 1.0))
//!     .aspect_ratio_factor((3.0 / 4.0, 4.0 / 3.0))
//!     .interpolation(Interpolation::Bilinear)
//!     .seed(42)
//!     .build()?;
//! ```
//!
//! The same configuration as JSON:
//! ```text
//! {
//!   "target_size": [224, 224],
//!   "area_factor": [0.08, 1.0],
//!   "aspect_ratio_factor": [0.75, 1.3333333333333333],
//!   "interpolation": "bilinear",
//!   "seed": 42
//! }
//! ```

use crate::error::{ConfigError, Result};
use crate::factor::{describe_json, FactorDomain, FactorSampler, FactorSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_AREA_FACTOR: (f64, f64) = (0.08, 1.0);
pub const DEFAULT_ASPECT_RATIO_FACTOR: (f64, f64) = (3.0 / 4.0, 4.0 / 3.0);

/// Sampling method used when resampling pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Bilinear,
    Nearest,
}

impl FromStr for Interpolation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bilinear" => Ok(Interpolation::Bilinear),
            "nearest" => Ok(Interpolation::Nearest),
            _ => Err(ConfigError::UnknownInterpolation(s.to_string())),
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interpolation::Bilinear => write!(f, "bilinear"),
            Interpolation::Nearest => write!(f, "nearest"),
        }
    }
}

/// How crop rectangles are drawn for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchSampling {
    /// One rectangle per batch element.
    #[default]
    PerImage,
    /// One rectangle per call, applied to every element.
    Shared,
}

/// Validated, immutable configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentationConfig {
    target_size: (usize, usize),
    area_factor: FactorSampler,
    aspect_ratio_factor: FactorSampler,
    interpolation: Interpolation,
    seed: Option<u64>,
    batch_sampling: BatchSampling,
}

impl AugmentationConfig {
    /// Starts a builder for output images of `(height, width)`.
    pub fn builder(target_size: (usize, usize)) -> AugmentationConfigBuilder {
        AugmentationConfigBuilder::new(target_size)
    }

    /// `(height, width)` of every output image.
    pub fn target_size(&self) -> (usize, usize) {
        self.target_size
    }

    pub fn area_factor(&self) -> &FactorSampler {
        &self.area_factor
    }

    pub fn aspect_ratio_factor(&self) -> &FactorSampler {
        &self.aspect_ratio_factor
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn batch_sampling(&self) -> BatchSampling {
        self.batch_sampling
    }

    /// True when both factors are pinned to zero, i.e. the crop collapses.
    pub fn is_degenerate(&self) -> bool {
        self.area_factor.as_constant() == Some(0.0)
            && self.aspect_ratio_factor.as_constant() == Some(0.0)
    }

    /// Builder pre-filled with this configuration.
    pub fn to_builder(&self) -> AugmentationConfigBuilder {
        AugmentationConfigBuilder {
            target_size: self.target_size,
            area_factor: FactorInput::Sampler(self.area_factor.clone()),
            aspect_ratio_factor: FactorInput::Sampler(self.aspect_ratio_factor.clone()),
            interpolation: self.interpolation,
            seed: self.seed,
            batch_sampling: self.batch_sampling,
        }
    }

    /// Parses and validates a JSON configuration.
    ///
    /// Missing or `null` factors take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(json)?;

        let mut builder = AugmentationConfig::builder(raw.target_size).batch_sampling(raw.batch_sampling);
        if let Some(value) = raw.area_factor {
            builder = builder.area_factor(FactorSpec::from_value("area_factor", value)?);
        }
        if let Some(value) = raw.aspect_ratio_factor {
            builder = builder.aspect_ratio_factor(FactorSpec::from_value("aspect_ratio_factor", value)?);
        }
        if let Some(name) = raw.interpolation {
            builder = builder.interpolation(name.parse()?);
        }
        if let Some(seed) = raw.seed {
            builder = builder.seed(seed);
        }
        builder.build()
    }

    /// Serializes the configuration. Fails if a factor is a custom sampler.
    pub fn to_json(&self) -> Result<String> {
        let record = ConfigRecord {
            target_size: self.target_size,
            area_factor: self
                .area_factor
                .to_spec()
                .ok_or(ConfigError::NotSerializable { param: "area_factor" })?,
            aspect_ratio_factor: self
                .aspect_ratio_factor
                .to_spec()
                .ok_or(ConfigError::NotSerializable {
                    param: "aspect_ratio_factor",
                })?,
            interpolation: self.interpolation,
            seed: self.seed,
            batch_sampling: self.batch_sampling,
        };
        Ok(serde_json::to_string_pretty(&record)?)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    target_size: (usize, usize),
    #[serde(default)]
    area_factor: Option<serde_json::Value>,
    #[serde(default)]
    aspect_ratio_factor: Option<serde_json::Value>,
    #[serde(default)]
    interpolation: Option<String>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    batch_sampling: BatchSampling,
}

#[derive(Serialize)]
struct ConfigRecord {
    target_size: (usize, usize),
    area_factor: FactorSpec,
    aspect_ratio_factor: FactorSpec,
    interpolation: Interpolation,
    seed: Option<u64>,
    batch_sampling: BatchSampling,
}

#[derive(Debug, Clone)]
enum FactorInput {
    Spec(FactorSpec),
    Sampler(FactorSampler),
}

/// Builder for AugmentationConfig with method chaining
#[derive(Debug, Clone)]
pub struct AugmentationConfigBuilder {
    target_size: (usize, usize),
    area_factor: FactorInput,
    aspect_ratio_factor: FactorInput,
    interpolation: Interpolation,
    seed: Option<u64>,
    batch_sampling: BatchSampling,
}

impl AugmentationConfigBuilder {
    fn new(target_size: (usize, usize)) -> Self {
        Self {
            target_size,
            area_factor: FactorInput::Spec(DEFAULT_AREA_FACTOR.into()),
            aspect_ratio_factor: FactorInput::Spec(DEFAULT_ASPECT_RATIO_FACTOR.into()),
            interpolation: Interpolation::default(),
            seed: None,
            batch_sampling: BatchSampling::default(),
        }
    }

    /// Set the output `(height, width)` (both must be > 0)
    pub fn target_size(mut self, target_size: (usize, usize)) -> Self {
        self.target_size = target_size;
        self
    }

    /// Set the area factor as a range, a scalar upper bound or a sampler spec.
    /// Bounds must lie in `[0, 1]` and be ordered.
    pub fn area_factor(mut self, factor: impl Into<FactorSpec>) -> Self {
        self.area_factor = FactorInput::Spec(factor.into());
        self
    }

    /// Set the area factor from a ready-made sampler
    pub fn area_sampler(mut self, sampler: FactorSampler) -> Self {
        self.area_factor = FactorInput::Sampler(sampler);
        self
    }

    /// Set the aspect ratio factor as a range or a sampler spec.
    /// Range ends may be given in either order; a bare scalar is rejected.
    pub fn aspect_ratio_factor(mut self, factor: impl Into<FactorSpec>) -> Self {
        self.aspect_ratio_factor = FactorInput::Spec(factor.into());
        self
    }

    /// Set the aspect ratio factor from a ready-made sampler
    pub fn aspect_ratio_sampler(mut self, sampler: FactorSampler) -> Self {
        self.aspect_ratio_factor = FactorInput::Sampler(sampler);
        self
    }

    pub fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set the random seed for reproducible crops.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set how rectangles are drawn for batched input.
    pub fn batch_sampling(mut self, mode: BatchSampling) -> Self {
        self.batch_sampling = mode;
        self
    }

    /// Validate and build the final configuration.
    pub fn build(self) -> Result<AugmentationConfig> {
        let (height, width) = self.target_size;
        if height == 0 || width == 0 {
            return Err(ConfigError::InvalidTargetSize { height, width });
        }

        let area_factor = match self.area_factor {
            FactorInput::Spec(spec) => spec.parse("area_factor", FactorDomain::UNIT)?,
            FactorInput::Sampler(sampler) => {
                sampler.validate("area_factor", FactorDomain::UNIT)?;
                sampler
            }
        };

        let aspect_ratio_factor = match self.aspect_ratio_factor {
            FactorInput::Spec(FactorSpec::Range(a, b)) => {
                FactorSpec::Range(a.min(b), a.max(b))
                    .parse("aspect_ratio_factor", FactorDomain::NON_NEGATIVE)?
            }
            FactorInput::Spec(FactorSpec::Scalar(value)) => {
                return Err(ConfigError::UnsupportedFactorType {
                    param: "aspect_ratio_factor",
                    found: describe_json(&serde_json::json!(value)),
                });
            }
            FactorInput::Spec(spec) => {
                spec.parse("aspect_ratio_factor", FactorDomain::NON_NEGATIVE)?
            }
            FactorInput::Sampler(sampler) => {
                sampler.validate("aspect_ratio_factor", FactorDomain::NON_NEGATIVE)?;
                sampler
            }
        };

        Ok(AugmentationConfig {
            target_size: self.target_size,
            area_factor,
            aspect_ratio_factor,
            interpolation: self.interpolation,
            seed: self.seed,
            batch_sampling: self.batch_sampling,
        })
    }
}
