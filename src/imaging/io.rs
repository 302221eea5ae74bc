//! PNG decode/encode and luminance extraction.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use aniso_diffusion::GrayImage;
use clap::ValueEnum;

use crate::error::ImageIoError;

/// How the decoded channels of an input image are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageFormat {
    /// The channels carry real red, green and blue; luminance is computed
    /// with the BT.601 weights.
    #[value(name = "rgb")]
    Rgb,
    /// The PNG stores Y'CbCr planes in its RGB channels (common for
    /// camera-sourced material); the luminance is the R byte verbatim.
    #[value(name = "ycbcr")]
    YCbCr,
}

/// Loads a PNG and reduces it to a luminance image.
///
/// The image is created aligned when its width is a multiple of 32, so it
/// can be fed to the SIMD filters directly.
pub fn load_luminance(path: &Path, format: ImageFormat) -> Result<GrayImage, ImageIoError> {
    let (rgba, width, height) = decode_rgba(path)?;

    let aligned = width % 32 == 0;
    let mut image = GrayImage::new(width, height, aligned)?;
    for y in 0..height {
        let row = image.row_mut(y);
        for (x, pixel) in rgba[y * width * 4..(y + 1) * width * 4].chunks_exact(4).enumerate() {
            row[x] = match format {
                ImageFormat::YCbCr => pixel[0],
                ImageFormat::Rgb => luminance(pixel[0], pixel[1], pixel[2]),
            };
        }
    }
    Ok(image)
}

/// Writes a luminance image as an RGBA PNG with `R = G = B = pixel` and
/// full alpha.
pub fn store_grayscale(path: &Path, image: &GrayImage) -> Result<(), ImageIoError> {
    let mut rgba = Vec::with_capacity(image.width() * image.height() * 4);
    for &pixel in image.as_bytes() {
        rgba.extend_from_slice(&[pixel, pixel, pixel, 255]);
    }

    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        image.width() as u32,
        image.height() as u32,
    );
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| ImageIoError::Encode(e.to_string()))?;
    writer
        .write_image_data(&rgba)
        .map_err(|e| ImageIoError::Encode(e.to_string()))?;
    Ok(())
}

/// BT.601 luma, rounded and clamped to a byte.
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}

/// Decodes a PNG into a packed RGBA8 buffer.
///
/// The decoder normalizes palettes and 16-bit channels to 8 bits; the
/// remaining color types are expanded to RGBA here.
fn decode_rgba(path: &Path) -> Result<(Vec<u8>, usize, usize), ImageIoError> {
    let mut decoder = png::Decoder::new(BufReader::new(File::open(path)?));
    decoder.set_transformations(png::Transformations::normalize_to_color8());

    let mut reader = decoder
        .read_info()
        .map_err(|e| ImageIoError::Decode(e.to_string()))?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| ImageIoError::Decode(e.to_string()))?;
    let width = info.width as usize;
    let height = info.height as usize;
    let bytes = &buf[..info.buffer_size()];

    let rgba = match info.color_type {
        png::ColorType::Rgba => bytes.to_vec(),
        png::ColorType::Rgb => bytes
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::Grayscale => bytes.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        png::ColorType::GrayscaleAlpha => bytes
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        other => {
            return Err(ImageIoError::UnsupportedLayout(format!(
                "color type {:?}",
                other
            )))
        }
    };

    Ok((rgba, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance_weights() {
        assert_eq!(luminance(0, 0, 0), 0);
        assert_eq!(luminance(255, 255, 255), 255);
        // Pure primaries hit the BT.601 weights.
        assert_eq!(luminance(255, 0, 0), 76); // round(76.245)
        assert_eq!(luminance(0, 255, 0), 150); // round(149.685)
        assert_eq!(luminance(0, 0, 255), 29); // round(29.07)
    }

    #[test]
    fn test_luminance_rounds() {
        // 0.299*1 = 0.299 -> 0; 0.299*2 = 0.598 -> 1
        assert_eq!(luminance(1, 0, 0), 0);
        assert_eq!(luminance(2, 0, 0), 1);
    }
}
