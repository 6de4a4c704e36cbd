//! edge-migrator service.
//!
//! Accepts CloudFront distribution documents over HTTP, compiles them to
//! VCL snippets and deploys those to an edge service.
//!
//! # Architecture Overview
//!
//! ```text
//!     POST /cloudfront/service/{id}
//!     ──────────────────────────────▶ http ──▶ source ──▶ compiler ──▶ snippet
//!                                      │                                 │
//!                                      │                                 ▼
//!     JSON report / error             │                              deploy ──────▶ Platform API
//!     ◀───────────────────────────────┘◀────────────────────────────────┘             (versions)
//!
//!     Cross-cutting: config (TOML), observability (tracing, Prometheus)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_migrator::config::{load_config, ServiceConfig};
use edge_migrator::observability::{init_logging, init_metrics};
use edge_migrator::HttpServer;

#[derive(Parser)]
#[command(name = "edge-migrator", version, about = "CloudFront to edge VCL migration service")]
struct Args {
    /// Path to a TOML configuration file; defaults apply when omitted
    #[arg(short, long, env = "EDGE_MIGRATOR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    init_logging(Some(&config.observability.log_level));

    tracing::info!("edge-migrator v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        api_base_url = %config.platform.api_base_url,
        strict_policy_values = config.compiler.strict_policy_values,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(&config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
