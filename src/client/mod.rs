//! # Client Components
//!
//! [`ClientCore`] reads a local image, sends it to the server in one frame and
//! writes the returned edge mask to disk.

pub mod client;

pub use client::ClientCore;
