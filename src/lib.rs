//! # Sobel Edge Service
//!
//! A TCP service that receives an image in a length-prefixed frame, converts it
//! to grayscale, runs a parallel Sobel gradient convolution, thresholds the
//! magnitude into a binary edge mask and returns it as a PNG.
//!
//! - [`common`]: framing, response protocol, configuration, logging
//! - [`processing`]: image model, codec, worker pool, convolution, Sobel
//! - [`server`]: listener and per-connection pipeline
//! - [`client`]: one request/response exchange

pub mod client;
pub mod common;
pub mod error;
pub mod processing;
pub mod server;

pub use client::ClientCore;
pub use error::{ClientError, CodecError, ComputeError, FrameError, ServiceError};
pub use server::Server;
