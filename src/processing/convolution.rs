//! # Parallel 3×3 Convolution
//!
//! Applies an integer kernel to the interior of an [`Image`], one row per job,
//! on a fixed pool of workers (see [`pool`](super::pool)).
//!
//! The one-pixel border is never computed and stays zero. Every output cell
//! depends only on the read-only input and is written by exactly one worker, so
//! the result is identical for any worker count or scheduling order.

use super::image::Image;
use super::pool::{self, Deadline};
use crate::error::ComputeError;

/// Immutable 3×3 matrix of signed integer weights, indexed `[ky][kx]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel([[i32; 3]; 3]);

impl Kernel {
    pub const fn new(weights: [[i32; 3]; 3]) -> Self {
        Self(weights)
    }

    /// Weighted sum of the kernel against the neighborhood centered on `(x, y)`.
    ///
    /// The caller guarantees `(x, y)` is an interior pixel.
    #[inline]
    fn weighted_sum(&self, input: &Image, x: usize, y: usize) -> i64 {
        let mut sum = 0i64;
        for (ky, weights) in self.0.iter().enumerate() {
            let src = input.row(y + ky - 1);
            for (kx, &w) in weights.iter().enumerate() {
                sum += w as i64 * src[x + kx - 1] as i64;
            }
        }
        sum
    }
}

/// How a weighted sum is stored in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Clamp to `[0, 255]`.
    Saturating,
    /// Keep the signed sum, e.g. for a later gradient magnitude.
    Raw,
}

impl Mode {
    #[inline]
    fn store(self, sum: i64) -> i32 {
        match self {
            Mode::Saturating => sum.clamp(0, 255) as i32,
            Mode::Raw => sum.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        }
    }
}

/// Convolve `input` with `kernel` using `workers` row workers.
///
/// # Example
/// ```ignore
/// let gx = apply(&img, &SOBEL_X, 8, Mode::Raw)?;
/// ```
///
/// # Errors
/// [`ComputeError::Pool`] if the worker threads could not be started.
pub fn apply(
    input: &Image,
    kernel: &Kernel,
    workers: usize,
    mode: Mode,
) -> Result<Image, ComputeError> {
    apply_until(input, kernel, workers, mode, Deadline::none())
}

/// Like [`apply`], but workers give up once `deadline` has passed.
///
/// # Errors
/// [`ComputeError::DeadlineExceeded`] if the pass did not finish in time,
/// [`ComputeError::Pool`] if the worker threads could not be started.
pub fn apply_until(
    input: &Image,
    kernel: &Kernel,
    workers: usize,
    mode: Mode,
    deadline: Deadline,
) -> Result<Image, ComputeError> {
    let width = input.width();
    let height = input.height();
    let mut output = Image::new(width, height);
    if !input.has_interior() {
        return Ok(output);
    }

    pool::for_each_row(
        output.pixels_mut(),
        width,
        1..height - 1,
        workers,
        deadline,
        |y, row| {
            for x in 1..width - 1 {
                row[x] = mode.store(kernel.weighted_sum(input, x, y));
            }
        },
    )?;

    Ok(output)
}
