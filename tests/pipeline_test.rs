//! End-to-end pipeline: decode, filter, encode, decode again.

use aniso_diffusion::{GrayImage, ImageOperator, OptimizationLevel, PeronaMalik};
use denoir::imaging::{self, ImageFormat};

#[test]
fn test_denoise_pipeline_round_trips_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("input.png");
    let output_path = dir.path().join("output.png");

    // A noisy-ish gradient.
    let mut image = GrayImage::new(64, 16, true).unwrap();
    for y in 0..16 {
        for x in 0..64 {
            let base = (x * 4) as i32;
            let noise = ((x * 31 + y * 17) % 13) as i32 - 6;
            image.row_mut(y)[x] = (base + noise).clamp(0, 255) as u8;
        }
    }
    imaging::store_grayscale(&input_path, &image).unwrap();

    let loaded = imaging::load_luminance(&input_path, ImageFormat::YCbCr).unwrap();
    assert!(imaging::compare(&image, &loaded));

    let filter = PeronaMalik::new(4.0, 0.5, 8, false, OptimizationLevel::detect());
    let denoised = filter.apply(&loaded).unwrap();
    assert_eq!(denoised.width(), 64);
    assert_eq!(denoised.height(), 16);

    imaging::store_grayscale(&output_path, &denoised).unwrap();
    let reloaded = imaging::load_luminance(&output_path, ImageFormat::YCbCr).unwrap();
    assert!(imaging::compare(&denoised, &reloaded));
}

#[test]
fn test_zero_iterations_round_trip_is_identity() {
    let mut image = GrayImage::new(32, 32, true).unwrap();
    for y in 0..32 {
        for x in 0..32 {
            image.row_mut(y)[x] = ((y * 32 + x) % 256) as u8;
        }
    }

    let filter = PeronaMalik::new(1.0, 1.0, 0, false, OptimizationLevel::detect());
    let result = filter.apply(&image).unwrap();
    assert!(imaging::compare(&image, &result));
}
