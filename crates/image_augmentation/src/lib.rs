pub mod config;
pub mod error;
pub mod factor;
pub mod layers;
pub mod rng;
pub mod tensor;
pub mod transforms;

pub use config::{AugmentationConfig, AugmentationConfigBuilder, BatchSampling, Interpolation};
pub use error::{ConfigError, Result};
pub use factor::{FactorDistribution, FactorSampler, FactorSpec};
pub use layers::{SqueezeExcite, SqueezeExciteConfig};
pub use rng::{RandomSource, SeededRng, WorkerRng};
pub use transforms::vision::{CropGeometrySampler, CropRectangle, RandomResizedCrop};
pub use transforms::Transform;
