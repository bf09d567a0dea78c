//! # Common Components
//!
//! Shared utilities used by both client and server components.
//!
//! ## Modules
//!
//! - [`connection`]: length-prefixed framing over a byte stream
//! - [`protocol`]: tagged response payloads
//! - [`config`]: TOML configuration for both binaries
//! - [`logging`]: logger setup shared by the binaries

pub mod config;
pub mod connection;
pub mod logging;
pub mod protocol;
