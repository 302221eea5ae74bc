//! 5-point cross averaging filter.
//!
//! A cheap smoothing pass that replaces every pixel with the floor of the
//! mean of itself and its four 4-neighbors. Neighbors outside the image
//! read as zero, so border pixels are biased toward black rather than
//! reflected.

use crate::alloc::AlignedBuf;
use crate::error::FilterError;
use crate::image::GrayImage;
use crate::level::OptimizationLevel;
use crate::operator::ImageOperator;

/// Fixed-point reciprocal used by the SIMD paths to divide the 16-bit
/// neighborhood sums by 5: `floor(2^16 / 5) + 2`. The high 16 bits of
/// `sum * AVG5_FACTOR` equal `sum / 5` for every sum in `0..=1275`
/// (five times the maximum pixel value), which is the whole input range.
pub(crate) const AVG5_FACTOR: i16 = ((1 << 16) / 5 + 2) as i16;

/// The 5-point averaging operator.
///
/// Requires an aligned input image and produces a new aligned image of the
/// same shape. The scalar, SSE4.1 and AVX2 variants agree bit for bit.
///
/// # Example
///
/// ```
/// use aniso_diffusion::{Avg5, GrayImage, ImageOperator, OptimizationLevel};
///
/// let mut image = GrayImage::new(32, 32, true).unwrap();
/// image.row_mut(10)[10] = 255;
///
/// let smoothed = Avg5::new(OptimizationLevel::None).apply(&image).unwrap();
/// assert_eq!(smoothed.row(10)[10], 51); // 255 / 5
/// ```
pub struct Avg5 {
    level: OptimizationLevel,
}

impl Avg5 {
    /// Creates the operator with the given vectorization level.
    pub fn new(level: OptimizationLevel) -> Self {
        Self { level }
    }
}

impl ImageOperator for Avg5 {
    fn apply(&self, image: &GrayImage) -> Result<GrayImage, FilterError> {
        if !image.is_aligned() {
            return Err(FilterError::UnalignedInput);
        }
        if image.is_empty() {
            return image.try_clone();
        }

        let mut result = GrayImage::new(image.width(), image.height(), true)?;
        // Synthetic all-zero row standing in for the rows above and below
        // the image.
        let zero_row = AlignedBuf::<u8>::zeroed(image.width())?;

        match self.level.effective() {
            OptimizationLevel::None => scalar(image, &mut result, zero_row.as_slice()),
            #[cfg(target_arch = "x86_64")]
            OptimizationLevel::Sse4 => unsafe {
                crate::simd::sse::avg5(image, &mut result, zero_row.as_ptr());
            },
            #[cfg(target_arch = "x86_64")]
            OptimizationLevel::Avx2 => unsafe {
                crate::simd::avx::avg5(image, &mut result, zero_row.as_ptr());
            },
            #[cfg(not(target_arch = "x86_64"))]
            _ => scalar(image, &mut result, zero_row.as_slice()),
        }

        Ok(result)
    }
}

fn scalar(src: &GrayImage, dst: &mut GrayImage, zero_row: &[u8]) {
    let w = src.width();
    let h = src.height();

    for y in 0..h {
        let prev_row = if y > 0 { src.row(y - 1) } else { zero_row };
        let next_row = if y + 1 < h { src.row(y + 1) } else { zero_row };
        let src_row = src.row(y);
        let dst_row = dst.row_mut(y);

        dst_row[0] = ((src_row[0] as u16 + src_row[1] as u16 + prev_row[0] as u16
            + next_row[0] as u16)
            / 5) as u8;
        for x in 1..w - 1 {
            dst_row[x] = ((src_row[x - 1] as u16
                + src_row[x] as u16
                + src_row[x + 1] as u16
                + prev_row[x] as u16
                + next_row[x] as u16)
                / 5) as u8;
        }
        dst_row[w - 1] = ((src_row[w - 2] as u16 + src_row[w - 1] as u16 + prev_row[w - 1] as u16
            + next_row[w - 1] as u16)
            / 5) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_aligned_input() {
        let image = GrayImage::new(30, 4, false).unwrap();
        let err = Avg5::new(OptimizationLevel::None).apply(&image).unwrap_err();
        assert_eq!(err, FilterError::UnalignedInput);
    }

    #[test]
    fn test_shape_preserved() {
        let image = GrayImage::new(64, 7, true).unwrap();
        let result = Avg5::new(OptimizationLevel::None).apply(&image).unwrap();
        assert_eq!(result.width(), 64);
        assert_eq!(result.height(), 7);
        assert!(result.is_aligned());
    }

    #[test]
    fn test_zero_image_stays_zero() {
        let image = GrayImage::new(32, 32, true).unwrap();
        let result = Avg5::new(OptimizationLevel::None).apply(&image).unwrap();
        assert!(result.as_bytes().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_block_corner_and_interior() {
        // An 8x8 block of 128 in the corner of an otherwise black image.
        let mut image = GrayImage::new(32, 32, true).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                image.row_mut(y)[x] = 128;
            }
        }

        let result = Avg5::new(OptimizationLevel::None).apply(&image).unwrap();

        // Interior of the block: all five samples are 128.
        assert_eq!(result.row(3)[3], 128);
        // Image corner: only self, right and below contribute.
        assert_eq!(result.row(0)[0], ((128u32 * 3) / 5) as u8);
        assert_eq!(result.row(0)[0], 76);
    }

    #[test]
    fn test_fixed_point_factor_matches_floor_division() {
        // The mulhi approximation must equal floor division over the whole
        // range of 5-sample sums.
        for sum in 0u32..=1275 {
            let approx = (sum * AVG5_FACTOR as u32) >> 16;
            assert_eq!(approx, sum / 5, "mismatch at sum {}", sum);
        }
    }

    #[test]
    fn test_right_edge_uses_zero_neighbor() {
        let mut image = GrayImage::new(32, 4, true).unwrap();
        for y in 0..4 {
            for x in 0..32 {
                image.row_mut(y)[x] = 100;
            }
        }
        let result = Avg5::new(OptimizationLevel::None).apply(&image).unwrap();
        // Interior row, last column: left + self + above + below = 400.
        assert_eq!(result.row(1)[31], (400u32 / 5) as u8);
    }
}
