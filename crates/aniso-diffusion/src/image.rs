//! Grayscale image container with optional SIMD alignment.

use crate::alloc::{AlignedBuf, BUFFER_ALIGNMENT};
use crate::error::FilterError;

/// A single-channel grayscale image.
///
/// Pixels are stored row by row in one contiguous buffer whose row stride
/// equals the width, so row `y` starts at byte offset `y * width`. The
/// buffer base address is always 32-byte aligned.
///
/// # Alignment
///
/// An image created with `aligned = true` additionally guarantees that its
/// width is a multiple of 32, which makes *every* row start on a 32-byte
/// boundary. The SIMD filter paths require this; construction fails with
/// [`FilterError::UnalignableWidth`] for widths that cannot satisfy it.
///
/// # Example
///
/// ```
/// use aniso_diffusion::GrayImage;
///
/// let mut image = GrayImage::new(32, 4, true).unwrap();
/// image.row_mut(1)[5] = 200;
///
/// assert_eq!(image.row(1)[5], 200);
/// assert!(image.is_aligned());
/// ```
#[derive(Debug)]
pub struct GrayImage {
    width: usize,
    height: usize,
    aligned: bool,
    data: AlignedBuf<u8>,
}

impl GrayImage {
    /// Creates a zero-filled image.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnalignableWidth`] if `aligned` is requested
    /// with a width that is not a multiple of 32, and
    /// [`FilterError::Allocation`] if the buffer cannot be allocated.
    pub fn new(width: usize, height: usize, aligned: bool) -> Result<Self, FilterError> {
        if aligned && width % BUFFER_ALIGNMENT != 0 {
            return Err(FilterError::UnalignableWidth { width });
        }
        let len = width
            .checked_mul(height)
            .ok_or(FilterError::Allocation { bytes: usize::MAX })?;
        Ok(Self {
            width,
            height,
            aligned,
            data: AlignedBuf::zeroed(len)?,
        })
    }

    /// Allocates a new image with the same shape, alignment flag and pixels.
    pub fn try_clone(&self) -> Result<Self, FilterError> {
        Ok(Self {
            width: self.width,
            height: self.height,
            aligned: self.aligned,
            data: self.data.try_clone()?,
        })
    }

    /// The width of the image in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// The height of the image in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether all rows are 32-byte aligned for SSE/AVX loads and stores.
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.aligned
    }

    /// Returns true if the image has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Read access to row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.data.as_slice()[y * self.width..(y + 1) * self.width]
    }

    /// Write access to row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        &mut self.data.as_mut_slice()[y * self.width..(y + 1) * self.width]
    }

    /// The whole pixel buffer in row-major order.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Mutable access to the whole pixel buffer in row-major order.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.data.as_mut_slice()
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    #[inline]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr()
    }
}
