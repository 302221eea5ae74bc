//! The image-transforming operator capability.

use crate::error::FilterError;
use crate::image::GrayImage;

/// An operator that maps an image to a new image of the same shape.
///
/// Implemented by [`Avg5`](crate::Avg5) and [`PeronaMalik`](crate::PeronaMalik).
/// Operators never modify their input; they allocate and return a fresh
/// image, so a caller can keep the original for comparison.
pub trait ImageOperator {
    /// Applies the operator.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnalignedInput`] when the operator requires an
    /// aligned image and the input is not aligned, and
    /// [`FilterError::Allocation`] when a working buffer cannot be allocated.
    fn apply(&self, image: &GrayImage) -> Result<GrayImage, FilterError>;
}
