//! Dense row-major intensity matrix.

use crate::error::CodecError;

/// Grayscale image as a flat row-major matrix of signed intensities.
///
/// Finalized images hold values in `[0, 255]`; raw gradient components may be
/// negative or larger than 255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<i32>,
}

impl Image {
    /// All-zero image of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    /// Wrap an existing row-major buffer.
    ///
    /// # Errors
    /// [`CodecError::DimensionMismatch`] if `pixels.len() != width * height`.
    pub fn from_raw(width: usize, height: usize, pixels: Vec<i32>) -> Result<Self, CodecError> {
        let expected = width * height;
        if pixels.len() != expected {
            return Err(CodecError::DimensionMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build from nested rows. The width is taken from the first row.
    ///
    /// # Errors
    /// [`CodecError::DimensionMismatch`] if any row has a different length.
    pub fn from_rows(rows: Vec<Vec<i32>>) -> Result<Self, CodecError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut pixels = Vec::with_capacity(width * height);
        for row in rows {
            if row.len() != width {
                return Err(CodecError::DimensionMismatch {
                    expected: width * height,
                    actual: pixels.len() + row.len(),
                });
            }
            pixels.extend(row);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image with every pixel set to `value`.
    pub fn filled(width: usize, height: usize, value: i32) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> i32 {
        self.pixels[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: i32) {
        self.pixels[y * self.width + x] = value;
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[i32] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn pixels(&self) -> &[i32] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [i32] {
        &mut self.pixels
    }

    pub fn to_rows(&self) -> Vec<Vec<i32>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height];
        }
        self.pixels.chunks(self.width).map(<[i32]>::to_vec).collect()
    }

    /// Whether the image has at least one pixel with all eight neighbors in bounds.
    pub fn has_interior(&self) -> bool {
        self.width >= 3 && self.height >= 3
    }
}
