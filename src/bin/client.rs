//! # Client Binary Entry Point
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin client -- photo.jpg edges.png
//! cargo run --bin client -- --server 10.0.0.5:8000 photo.png edges.png
//! ```

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use sobel_edge_service::common::config::{load_config, ClientConfig};
use sobel_edge_service::common::logging::init_logger;
use sobel_edge_service::ClientCore;

/// Command-line arguments for the client binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image to process (PNG or JPEG)
    input: String,

    /// Where to write the PNG edge mask
    output: String,

    /// Server address (overrides the configuration file)
    #[arg(short, long)]
    server: Option<String>,

    /// Path to the client configuration file (TOML format)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger(LevelFilter::Info);

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config::<ClientConfig>(path)?,
        None => ClientConfig::default(),
    };
    if let Some(server) = args.server {
        config.server_address = server;
    }

    let core = ClientCore::new(config);
    core.process_file(&args.input, &args.output).await?;

    Ok(())
}
