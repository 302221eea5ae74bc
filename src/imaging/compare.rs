//! Exact image comparison.

use aniso_diffusion::GrayImage;

/// Whether two images have the same shape and identical pixels.
pub fn compare(a: &GrayImage, b: &GrayImage) -> bool {
    a.width() == b.width() && a.height() == b.height() && a.as_bytes() == b.as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_images_compare_equal() {
        let mut a = GrayImage::new(32, 2, true).unwrap();
        a.row_mut(0)[3] = 17;
        let b = a.try_clone().unwrap();
        assert!(compare(&a, &b));
    }

    #[test]
    fn test_pixel_difference_detected() {
        let a = GrayImage::new(32, 2, true).unwrap();
        let mut b = a.try_clone().unwrap();
        b.row_mut(1)[31] = 1;
        assert!(!compare(&a, &b));
    }

    #[test]
    fn test_shape_difference_detected() {
        let a = GrayImage::new(32, 2, true).unwrap();
        let b = GrayImage::new(32, 3, true).unwrap();
        assert!(!compare(&a, &b));
    }
}
