//! # Image Processing
//!
//! Grayscale decoding, parallel convolution and Sobel edge detection.
//!
//! ```text
//! bytes ──decode──▶ Image ──detect (gx ∥ gy, row workers)──▶ mask ──encode──▶ PNG
//! ```

pub mod codec;
pub mod convolution;
pub mod image;
pub mod pool;
pub mod sobel;

// Re-export main items for convenience
pub use codec::{decode, encode};
pub use convolution::{apply, apply_until, Kernel, Mode};
pub use self::image::Image;
pub use pool::Deadline;
pub use sobel::{detect, detect_until, SOBEL_X, SOBEL_Y};
