//! # Server Binary Entry Point
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin server -- --config config/server.toml
//! cargo run --bin server -- --port 8000 --threshold 200
//! ```
//!
//! Command-line flags override the corresponding configuration values.

use anyhow::{bail, Result};
use clap::Parser;
use log::LevelFilter;

use sobel_edge_service::common::config::{load_config, ServerConfig};
use sobel_edge_service::common::logging::init_logger;
use sobel_edge_service::Server;

/// Command-line arguments for the server binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the server configuration file (TOML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Gradient magnitude above which a pixel is an edge
    #[arg(short, long)]
    threshold: Option<u32>,

    /// Row workers per convolution pass
    #[arg(short, long)]
    workers: Option<usize>,
}

fn build_config(args: &Args) -> Result<ServerConfig> {
    let mut config = match (&args.config, args.threshold) {
        (Some(path), _) => load_config::<ServerConfig>(path)?,
        (None, Some(threshold)) => ServerConfig::for_port(args.port.unwrap_or(8000), threshold),
        (None, None) => bail!("either --config or --threshold is required"),
    };

    if let Some(port) = args.port {
        config.set_port(port);
    }
    if let Some(threshold) = args.threshold {
        config.detection.threshold = threshold;
    }
    if let Some(workers) = args.workers {
        config.detection.workers = workers;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger(LevelFilter::Info);

    let args = Args::parse();
    let config = build_config(&args)?;

    let server = Server::new(config);
    server.run().await
}
