//! # Server Components
//!
//! - [`server`]: the edge-detection pipeline ([`ServerCore`])
//! - [`listener`]: TCP accept loop and per-connection exchange ([`Server`])
//! - [`metrics`]: request counters shared across connections

pub mod listener;
pub mod metrics;
pub mod server;

pub use listener::Server;
pub use metrics::ServerMetrics;
pub use server::ServerCore;
