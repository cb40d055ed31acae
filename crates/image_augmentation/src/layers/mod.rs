pub mod squeeze_excite;

pub use squeeze_excite::{Activation, SqueezeExcite, SqueezeExciteConfig};
