//! x86-64 vector kernels for the filters.
//!
//! Both backends stream whole rows: bytes are widened to 16-bit lanes with
//! unpack, the diffusion math runs on 32-bit float lanes, and results are
//! narrowed back with saturating packs and written with non-temporal
//! stores. Unpack and pack shuffle 256-bit registers the same way per
//! 128-bit half, so the shuffles cancel and the packed bytes come out in
//! source order.
//!
//! The only subtle idiom is the neighbor access across register
//! boundaries: the left neighbor of lane 0 is carried in from the previous
//! register with a byte-wise `alignr`, the right neighbor of the last lane
//! comes from the next register the same way, and the very first and last
//! chunk of a row use a zeroed register for the carry, which is exactly
//! the scalar zero-padding rule.
//!
//! Callers must guarantee the required CPU features, 32-byte-aligned rows
//! and a width that is a multiple of the register width.

pub(crate) mod avx;
pub(crate) mod sse;

/// Bounds applied to the Euler step before float-to-int conversion, so
/// truncation saturates to the 16-bit offset range exactly like the
/// scalar path.
pub(crate) const OFFSET_MIN: f32 = i16::MIN as f32;
pub(crate) const OFFSET_MAX: f32 = i16::MAX as f32;
