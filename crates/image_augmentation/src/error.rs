//! Construction-time error type and `Result` alias.
//!
//! Every variant is raised while building or reconfiguring a layer. Once a
//! layer exists, sampling and resizing do not produce configuration errors.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`target_size` must be positive in both dimensions, got ({height}, {width})")]
    InvalidTargetSize { height: usize, width: usize },

    #[error("Invalid `{param}`: {reason}")]
    InvalidFactor { param: &'static str, reason: String },

    #[error("`{param}` should be inside of range [{min}, {max}], got ({low}, {high})")]
    FactorOutOfRange {
        param: &'static str,
        min: f64,
        max: f64,
        low: f64,
        high: f64,
    },

    #[error("Expected `{param}` to be a range or a factor sampler, got {found}")]
    UnsupportedFactorType { param: &'static str, found: String },

    #[error("Unknown interpolation `{0}`, expected one of: bilinear, nearest")]
    UnknownInterpolation(String),

    #[error("`ratio` should be a float between 0 and 1, got {0}")]
    InvalidRatio(f64),

    #[error("`filters` should be a positive integer, got {0}")]
    InvalidFilters(usize),

    #[error("`filters * ratio` must leave at least one bottleneck filter ({filters} * {ratio})")]
    EmptyBottleneck { filters: usize, ratio: f64 },

    #[error("Weight `{name}` has shape {found:?}, expected {expected:?}")]
    WeightShape {
        name: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("`{param}` uses a custom sampler and cannot be serialized")]
    NotSerializable { param: &'static str },

    #[error("Malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Name of the offending parameter, when the error is tied to one.
    pub fn param(&self) -> Option<&'static str> {
        match self {
            ConfigError::InvalidTargetSize { .. } => Some("target_size"),
            ConfigError::InvalidFactor { param, .. }
            | ConfigError::FactorOutOfRange { param, .. }
            | ConfigError::UnsupportedFactorType { param, .. }
            | ConfigError::NotSerializable { param } => Some(*param),
            ConfigError::UnknownInterpolation(_) => Some("interpolation"),
            ConfigError::InvalidRatio(_) => Some("ratio"),
            ConfigError::InvalidFilters(_) | ConfigError::EmptyBottleneck { .. } => Some("filters"),
            ConfigError::WeightShape { name, .. } => Some(*name),
            ConfigError::Json(_) => None,
        }
    }
}
