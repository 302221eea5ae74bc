//! Denoir - edge-preserving grayscale denoiser
//!
//! Image loading, storing and timing around the [`aniso_diffusion`]
//! filters, plus the [`qlisp`] scripting frontend.
//! This library exposes modules for integration testing.

pub mod error;
pub mod imaging;
pub mod timing;
