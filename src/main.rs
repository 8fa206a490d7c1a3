//! Edge gate binary.
//!
//! Loads configuration (TOML file plus environment, `.env` honored), starts
//! logging and metrics, then serves until SIGINT/SIGTERM.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_gate::config::{load_config, load_from_env};
use edge_gate::lifecycle::signals::wait_for_signal;
use edge_gate::observability::{logging, metrics};
use edge_gate::{GateServer, Shutdown};

#[derive(Parser)]
#[command(name = "edge-gate")]
#[command(about = "Request gate for a web application", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults plus environment when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _ = dotenvy::dotenv();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    logging::init_logging(&config.observability);
    tracing::info!("edge-gate v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        domain = %config.site.domain_url,
        rate_limit_points = config.rate_limit.points,
        rate_limit_duration_secs = config.rate_limit.duration_secs,
        tracking = config.tracking.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let server = GateServer::new(config, shutdown)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
