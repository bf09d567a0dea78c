//! # Sobel Edge Detection
//!
//! Runs two raw convolution passes (horizontal and vertical Sobel kernels) in
//! parallel, combines them into the gradient magnitude
//! `floor(sqrt(gx² + gy²))`, and thresholds the result into a binary mask
//! (`255` = edge, `0` = background).
//!
//! Magnitudes of 8-bit inputs range over roughly `[0, 1443]`, so there is no
//! universally right threshold; callers always pass one.

use super::convolution::{self, Kernel, Mode};
use super::image::Image;
use super::pool::Deadline;
use crate::error::ComputeError;

/// Horizontal gradient kernel.
pub const SOBEL_X: Kernel = Kernel::new([[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]]);

/// Vertical gradient kernel.
pub const SOBEL_Y: Kernel = Kernel::new([[-1, -2, -1], [0, 0, 0], [1, 2, 1]]);

/// Mask value of an edge pixel.
pub const EDGE: i32 = 255;

/// Binary edge mask of `img`: pixels whose gradient magnitude is strictly
/// greater than `threshold` become [`EDGE`], everything else (including the
/// border) becomes `0`.
///
/// # Example
/// ```ignore
/// let mask = detect(&img, 200, 8)?;
/// ```
///
/// # Errors
/// [`ComputeError::Pool`] if the worker threads could not be started.
pub fn detect(img: &Image, threshold: u32, workers: usize) -> Result<Image, ComputeError> {
    detect_until(img, threshold, workers, Deadline::none())
}

/// Like [`detect`], but both passes stop once `deadline` has passed.
///
/// # Errors
/// [`ComputeError::DeadlineExceeded`] if either pass did not finish in time.
pub fn detect_until(
    img: &Image,
    threshold: u32,
    workers: usize,
    deadline: Deadline,
) -> Result<Image, ComputeError> {
    let (gx, gy) = gradients(img, workers, deadline)?;

    let threshold = threshold as i64;
    let mut mask = Image::new(img.width(), img.height());
    for ((dst, &x), &y) in mask.pixels_mut().iter_mut().zip(gx.pixels()).zip(gy.pixels()) {
        if magnitude(x, y) > threshold {
            *dst = EDGE;
        }
    }
    Ok(mask)
}

/// Gradient magnitude image, `floor(sqrt(gx² + gy²))` per pixel, without thresholding.
pub fn magnitudes(img: &Image, workers: usize) -> Result<Image, ComputeError> {
    let (gx, gy) = gradients(img, workers, Deadline::none())?;

    let mut out = Image::new(img.width(), img.height());
    for ((dst, &x), &y) in out.pixels_mut().iter_mut().zip(gx.pixels()).zip(gy.pixels()) {
        *dst = magnitude(x, y).min(i32::MAX as i64) as i32;
    }
    Ok(out)
}

/// Compute the `gx` and `gy` passes concurrently; both finish before returning.
fn gradients(
    img: &Image,
    workers: usize,
    deadline: Deadline,
) -> Result<(Image, Image), ComputeError> {
    let (gx, gy) = rayon::join(
        || convolution::apply_until(img, &SOBEL_X, workers, Mode::Raw, deadline),
        || convolution::apply_until(img, &SOBEL_Y, workers, Mode::Raw, deadline),
    );
    Ok((gx?, gy?))
}

#[inline]
fn magnitude(gx: i32, gy: i32) -> i64 {
    let (gx, gy) = (gx as i64, gy as i64);
    let squared = gx.saturating_mul(gx).saturating_add(gy.saturating_mul(gy));
    (squared as f64).sqrt().floor() as i64
}
