//! Scalar factor samplers.
//!
//! A factor is either a constant, a uniform range, or a user-supplied
//! distribution. All three expose the same two things: a `draw` and the
//! `[min, max]` interval every draw is guaranteed to fall in.
//!
//! ```ignore
//! let area = FactorSpec::Range(0.08, 1.0).parse("area_factor", FactorDomain::UNIT)?;
//! let value = area.draw(&mut SeededRng::new(0));
//! assert!((0.08..=1.0).contains(&value));
//! ```

use crate::error::{ConfigError, Result};
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A user-supplied distribution.
///
/// Draws are clamped into [`FactorDistribution::bounds`] by [`FactorSampler`].
/// Implementations should take one unit draw per call to keep stream
/// positions comparable with the built-in samplers.
pub trait FactorDistribution: fmt::Debug + Send + Sync {
    fn draw(&self, rng: &mut dyn RandomSource) -> f64;

    /// Closed interval `(min, max)` the distribution lives in.
    fn bounds(&self) -> (f64, f64);
}

#[derive(Debug, Clone)]
pub enum FactorSampler {
    Constant(f64),
    Uniform { min: f64, max: f64 },
    Custom(Arc<dyn FactorDistribution>),
}

impl FactorSampler {
    /// Draws one value. Every variant advances `rng` (constants discard the draw).
    pub fn draw(&self, rng: &mut dyn RandomSource) -> f64 {
        match self {
            FactorSampler::Constant(value) => {
                rng.next_unit();
                *value
            }
            FactorSampler::Uniform { min, max } => rng.uniform(*min, *max),
            FactorSampler::Custom(dist) => {
                let (min, max) = dist.bounds();
                let value = dist.draw(rng);
                if value.is_nan() {
                    min
                } else {
                    value.clamp(min, max)
                }
            }
        }
    }

    pub fn bounds(&self) -> (f64, f64) {
        match self {
            FactorSampler::Constant(value) => (*value, *value),
            FactorSampler::Uniform { min, max } => (*min, *max),
            FactorSampler::Custom(dist) => dist.bounds(),
        }
    }

    pub fn min_value(&self) -> f64 {
        self.bounds().0
    }

    pub fn max_value(&self) -> f64 {
        self.bounds().1
    }

    pub fn custom(dist: impl FactorDistribution + 'static) -> Self {
        FactorSampler::Custom(Arc::new(dist))
    }

    /// `Some(value)` when every draw returns the same value.
    pub fn as_constant(&self) -> Option<f64> {
        match self.bounds() {
            (min, max) if min == max => Some(min),
            _ => None,
        }
    }

    /// Serializable description, `None` for custom distributions.
    pub fn to_spec(&self) -> Option<FactorSpec> {
        match self {
            FactorSampler::Constant(value) => Some(FactorSpec::Sampler(SamplerSpec::Constant {
                value: *value,
            })),
            FactorSampler::Uniform { min, max } => Some(FactorSpec::Range(*min, *max)),
            FactorSampler::Custom(_) => None,
        }
    }

    /// Checks the sampler's interval against `domain`.
    pub(crate) fn validate(&self, param: &'static str, domain: FactorDomain) -> Result<()> {
        let (low, high) = self.bounds();
        if !low.is_finite() || !high.is_finite() {
            return Err(ConfigError::InvalidFactor {
                param,
                reason: format!("bounds must be finite, got ({low}, {high})"),
            });
        }
        if low > high {
            return Err(ConfigError::InvalidFactor {
                param,
                reason: format!("`{param}[0]` must be <= `{param}[1]`, got ({low}, {high})"),
            });
        }
        if low < domain.min || high > domain.max {
            return Err(ConfigError::FactorOutOfRange {
                param,
                min: domain.min,
                max: domain.max,
                low,
                high,
            });
        }
        Ok(())
    }
}

impl PartialEq for FactorSampler {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FactorSampler::Constant(a), FactorSampler::Constant(b)) => a == b,
            (
                FactorSampler::Uniform { min: a0, max: a1 },
                FactorSampler::Uniform { min: b0, max: b1 },
            ) => a0 == b0 && a1 == b1,
            (FactorSampler::Custom(a), FactorSampler::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Admissible interval for a parameter, used both to expand scalars and to
/// reject out-of-range bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorDomain {
    pub min: f64,
    pub max: f64,
}

impl FactorDomain {
    pub const UNIT: FactorDomain = FactorDomain { min: 0.0, max: 1.0 };
    pub const NON_NEGATIVE: FactorDomain = FactorDomain {
        min: 0.0,
        max: f64::INFINITY,
    };
}

/// Serializable factor description.
///
/// JSON forms: `[0.08, 1.0]`, `0.5`, `{"kind": "uniform", "min": 0.1, "max": 0.9}`
/// or `{"kind": "constant", "value": 1.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactorSpec {
    Range(f64, f64),
    Scalar(f64),
    Sampler(SamplerSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SamplerSpec {
    Constant { value: f64 },
    Uniform { min: f64, max: f64 },
}

impl From<(f64, f64)> for FactorSpec {
    fn from((low, high): (f64, f64)) -> Self {
        FactorSpec::Range(low, high)
    }
}

impl From<f64> for FactorSpec {
    fn from(value: f64) -> Self {
        FactorSpec::Scalar(value)
    }
}

impl FactorSpec {
    /// Builds a validated sampler.
    ///
    /// A scalar `x` means the range `(domain.min, x)`. A range with equal
    /// ends becomes a constant.
    pub fn parse(&self, param: &'static str, domain: FactorDomain) -> Result<FactorSampler> {
        let sampler = match *self {
            FactorSpec::Range(low, high) => range_sampler(low, high),
            FactorSpec::Scalar(value) => range_sampler(domain.min, value),
            FactorSpec::Sampler(SamplerSpec::Constant { value }) => FactorSampler::Constant(value),
            FactorSpec::Sampler(SamplerSpec::Uniform { min, max }) => range_sampler(min, max),
        };
        sampler.validate(param, domain)?;
        Ok(sampler)
    }

    /// Parses a raw JSON value, naming `param` when the value has the wrong shape.
    pub fn from_value(
        param: &'static str,
        value: serde_json::Value,
    ) -> Result<FactorSpec> {
        let found = describe_json(&value);
        serde_json::from_value(value)
            .map_err(|_| ConfigError::UnsupportedFactorType { param, found })
    }
}

fn range_sampler(low: f64, high: f64) -> FactorSampler {
    if low == high {
        FactorSampler::Constant(low)
    } else {
        FactorSampler::Uniform {
            min: low,
            max: high,
        }
    }
}

pub(crate) fn describe_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => format!("bool `{b}`"),
        serde_json::Value::Number(n) => format!("number `{n}`"),
        serde_json::Value::String(s) => format!("string `{s}`"),
        serde_json::Value::Array(items) => format!("array of {} elements", items.len()),
        serde_json::Value::Object(_) => format!("object `{value}`"),
    }
}
