//! # Grayscale Codec
//!
//! Converts container bytes (PNG or JPEG) into an [`Image`] of 8-bit
//! intensities and back into a single-channel PNG.
//!
//! ## Luma conversion
//!
//! `Y = 0.299 R + 0.587 G + 0.114 B`, truncated. It is evaluated in integer
//! arithmetic as `(299 R + 587 G + 114 B) / 1000`, which is exact, so a gray
//! pixel (`R = G = B = v`) always maps back to `v`.

use std::io::Cursor;

use image::{GrayImage, ImageFormat};
use log::error;

use super::image::Image;
use crate::error::CodecError;

/// Decode a PNG or JPEG payload into a grayscale intensity matrix.
///
/// # Errors
/// - [`CodecError::UnsupportedFormat`] if the signature is not PNG or JPEG
/// - [`CodecError::Decode`] if the container is corrupt
///
/// # Example
/// ```ignore
/// let bytes = std::fs::read("photo.jpg")?;
/// let img = decode(&bytes)?;
/// ```
pub fn decode(bytes: &[u8]) -> Result<Image, CodecError> {
    let format = image::guess_format(bytes).map_err(|_| CodecError::UnsupportedFormat)?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(CodecError::UnsupportedFormat);
    }

    let rgb = image::load_from_memory_with_format(bytes, format)
        .map_err(CodecError::Decode)?
        .to_rgb8();
    let (width, height) = rgb.dimensions();

    let pixels = rgb.pixels().map(|p| luma(p[0], p[1], p[2])).collect();
    Image::from_raw(width as usize, height as usize, pixels)
}

/// Encode an intensity matrix as a lossless 8-bit grayscale PNG.
///
/// Values are clamped to `[0, 255]` first.
///
/// # Errors
/// - [`CodecError::DimensionMismatch`] if pixel storage disagrees with the geometry
/// - [`CodecError::Encode`] if the PNG writer fails
pub fn encode(img: &Image) -> Result<Vec<u8>, CodecError> {
    let expected = img.width() * img.height();
    if img.pixels().len() != expected {
        return Err(CodecError::DimensionMismatch {
            expected,
            actual: img.pixels().len(),
        });
    }

    let samples: Vec<u8> = img.pixels().iter().map(|&v| clamp_u8(v)).collect();
    let width = u32::try_from(img.width()).map_err(|_| too_large(img))?;
    let height = u32::try_from(img.height()).map_err(|_| too_large(img))?;
    let canvas = GrayImage::from_raw(width, height, samples).ok_or(CodecError::DimensionMismatch {
        expected,
        actual: img.pixels().len(),
    })?;

    let mut output_bytes = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut output_bytes), ImageFormat::Png)
        .map_err(CodecError::Encode)?;
    Ok(output_bytes)
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> i32 {
    (299 * r as i32 + 587 * g as i32 + 114 * b as i32) / 1000
}

#[inline]
pub(crate) fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

fn too_large(img: &Image) -> CodecError {
    error!(
        "❌ Image {}x{} exceeds PNG dimension limits",
        img.width(),
        img.height()
    );
    CodecError::Encode(image::ImageError::Limits(
        image::error::LimitError::from_kind(image::error::LimitErrorKind::DimensionError),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_bytes(img: &RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_applies_luma_weights() {
        let mut rgb = RgbImage::new(3, 1);
        rgb.put_pixel(0, 0, Rgb([255, 0, 0]));
        rgb.put_pixel(1, 0, Rgb([0, 255, 0]));
        rgb.put_pixel(2, 0, Rgb([0, 0, 255]));

        let img = decode(&png_bytes(&rgb)).unwrap();
        // 0.299*255 = 76.2, 0.587*255 = 149.6, 0.114*255 = 29.07, all truncated
        assert_eq!(img.row(0), &[76, 149, 29]);
    }

    #[test]
    fn test_gray_round_trip_is_lossless() {
        let rows: Vec<Vec<i32>> = (0..16)
            .map(|y| (0..16).map(|x| (y * 16 + x) as i32).collect())
            .collect();
        let img = Image::from_rows(rows).unwrap();

        let decoded = decode(&encode(&img).unwrap()).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_encode_clamps_out_of_range_values() {
        let img = Image::from_rows(vec![vec![-40, 0, 128, 255, 900]]).unwrap();
        let decoded = decode(&encode(&img).unwrap()).unwrap();
        assert_eq!(decoded.row(0), &[0, 0, 128, 255, 255]);
    }

    #[test]
    fn test_encode_produces_single_channel_png() {
        let bytes = encode(&Image::filled(4, 4, 255)).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let loaded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(loaded.color(), image::ColorType::L8);
    }

    #[test]
    fn test_decode_jpeg() {
        let rgb = RgbImage::from_pixel(8, 8, Rgb([120, 120, 120]));
        let mut bytes = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .unwrap();

        let img = decode(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (8, 8));
        // Lossy, but a flat gray block stays close to its value.
        assert!(img.pixels().iter().all(|&v| (v - 120).abs() <= 3));
    }

    #[test]
    fn test_unknown_signature_is_unsupported() {
        assert!(matches!(
            decode(b"definitely not an image"),
            Err(CodecError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_recognized_but_unsupported_container() {
        // GIF signature: known to the image crate, not accepted by the service.
        assert!(matches!(
            decode(b"GIF89a\x01\x00\x01\x00"),
            Err(CodecError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_corrupt_png_is_decode_error() {
        let mut bytes = encode(&Image::filled(4, 4, 10)).unwrap();
        bytes.truncate(20);
        assert!(matches!(decode(&bytes), Err(CodecError::Decode(_))));
    }
}
