//! # Configuration
//!
//! TOML configuration for the server and client binaries.
//!
//! ```toml
//! [server]
//! address = "0.0.0.0:8000"
//!
//! [detection]
//! threshold = 200
//! workers = 8
//!
//! [limits]
//! max_frame_bytes = 67108864
//! io_timeout_secs = 30
//! compute_timeout_secs = 30
//! ```
//!
//! The edge threshold has no default: useful values depend on the images being
//! processed, so every deployment has to pick one.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::connection::DEFAULT_MAX_FRAME_SIZE;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Example
/// ```ignore
/// let config: ServerConfig = load_config("config/server.toml")?;
/// ```
pub fn load_config<T>(path: impl AsRef<Path>) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Complete server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub server: ListenConfig,
    pub detection: DetectionConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Where the server listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenConfig {
    /// Socket address to bind (e.g., "0.0.0.0:8000")
    pub address: String,
}

/// Edge detection parameters applied to every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Gradient magnitudes strictly above this value become edges
    pub threshold: u32,
    /// Row workers per convolution pass
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Resource limits for a single connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Bound on each frame read and write
    #[serde(default = "default_timeout_secs")]
    pub io_timeout_secs: u64,
    /// Bound on decode + detection + encode for one request
    #[serde(default = "default_timeout_secs")]
    pub compute_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: default_max_frame_bytes(),
            io_timeout_secs: default_timeout_secs(),
            compute_timeout_secs: default_timeout_secs(),
        }
    }
}

impl LimitsConfig {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    pub fn compute_timeout(&self) -> Duration {
        Duration::from_secs(self.compute_timeout_secs)
    }
}

impl ServerConfig {
    /// Build a configuration without a file, listening on all interfaces.
    pub fn for_port(port: u16, threshold: u32) -> Self {
        Self {
            server: ListenConfig {
                address: format!("0.0.0.0:{}", port),
            },
            detection: DetectionConfig {
                threshold,
                workers: default_workers(),
            },
            limits: LimitsConfig::default(),
        }
    }

    /// Replace the port of the listen address, keeping its host.
    pub fn set_port(&mut self, port: u16) {
        let host = self
            .server
            .address
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or("0.0.0.0");
        self.server.address = format!("{}:{}", host, port);
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.detection.workers == 0 {
            bail!("detection.workers must be at least 1");
        }
        if self.limits.max_frame_bytes == 0 {
            bail!("limits.max_frame_bytes must be at least 1");
        }
        if self.limits.io_timeout_secs == 0 {
            bail!("limits.io_timeout_secs must be at least 1");
        }
        if self.limits.compute_timeout_secs == 0 {
            bail!("limits.compute_timeout_secs must be at least 1");
        }
        Ok(())
    }
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_server_address")]
    pub server_address: String,
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    #[serde(default = "default_timeout_secs")]
    pub io_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_address: default_server_address(),
            max_frame_bytes: default_max_frame_bytes(),
            io_timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(8)
}

fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_SIZE
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_server_address() -> String {
    "127.0.0.1:8000".to_string()
}
