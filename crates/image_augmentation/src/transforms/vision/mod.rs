//! src/transforms/vision/mod.rs
//!
//! Vision transforms for image preprocessing and augmentation.
//!
//! # Module Organization
//!
//! ```text
//! transforms/vision/
//! ├── crop_geometry.rs → Random crop rectangles (area / aspect-ratio sampling)
//! ├── augmentation.rs  → RandomResizedCrop layer (train: crop+resize, eval: smart resize)
//! ├── geometric.rs     → Deterministic spatial transforms (resize, smart resize)
//! ├── conversion.rs    → Format conversions (image <-> tensor)
//! └── ops.rs           → Resampling kernels shared by the above
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use crate::transforms::Transform;
//! use crate::transforms::vision::{EnsureRGB, RandomResizedCrop, ToTensor};
//!
//! let config = AugmentationConfig::builder((224, 224)).seed(0).build()?;
//! let pipeline = EnsureRGB
//!     .then(ToTensor)
//!     .then(RandomResizedCrop::new(config));
//! ```

pub mod augmentation;
pub mod conversion;
pub mod crop_geometry;
pub mod geometric;
pub mod ops;

pub use augmentation::{Mode, RandomResizedCrop};
pub use conversion::{ToImage, ToTensor};
pub use crop_geometry::{CropGeometrySampler, CropRectangle};
pub use geometric::{EnsureRGB, Resize, SmartResize};
