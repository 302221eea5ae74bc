//! aniso-diffusion: edge-preserving smoothing for grayscale images
//!
//! This library implements Perona-Malik nonlinear diffusion and a cheap
//! 5-point averaging filter over single-channel byte images, with scalar,
//! SSE4.1 and AVX2 variants that produce bit-identical results.
//!
//! # Quick Start
//!
//! ```
//! use aniso_diffusion::{GrayImage, ImageOperator, OptimizationLevel, PeronaMalik};
//!
//! let mut image = GrayImage::new(32, 32, true).unwrap();
//! image.row_mut(16)[16] = 255;
//!
//! let filter = PeronaMalik::new(1.0, 1.0, 30, false, OptimizationLevel::detect());
//! let denoised = filter.apply(&image).unwrap();
//!
//! assert_eq!(denoised.width(), 32);
//! ```
//!
//! # Alignment
//!
//! The filters stream whole rows through SIMD registers and therefore
//! require [`GrayImage`]s built with the `aligned` flag: a 32-byte-aligned
//! buffer and a width that is a multiple of 32, so every row supports
//! aligned loads and non-temporal stores.
//!
//! # Variants
//!
//! [`OptimizationLevel`] selects the implementation; it never changes the
//! numbers. All float-to-int conversions truncate toward zero and all
//! saturation happens in the same order in every variant, so outputs can
//! be compared byte for byte across CPUs and levels.

pub mod alloc;
pub mod avg5;
pub mod diffusion;
pub mod error;
pub mod image;
pub mod level;
pub mod operator;

#[cfg(target_arch = "x86_64")]
mod simd;


pub use avg5::Avg5;
pub use diffusion::PeronaMalik;
pub use error::FilterError;
pub use image::GrayImage;
pub use level::OptimizationLevel;
pub use operator::ImageOperator;
