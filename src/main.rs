//! IoT measurement anchoring gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────────┐
//!                      │                  MEASUREMENT GATEWAY                     │
//!                      │                                                          │
//!   POST /notify       │  ┌─────────┐    ┌──────────┐    ┌──────────────┐         │
//!   ───────────────────┼─▶│  http   │───▶│ pipeline │───▶│    access    │─────────┼──▶ Access registry
//!                      │  │ server  │    │  ingest  │    │     gate     │         │
//!                      │  └─────────┘    └────┬─────┘    └──────────────┘         │
//!                      │                      │                                   │
//!                      │          ┌───────────┼───────────────┐                   │
//!                      │          ▼           ▼               ▼                   │
//!                      │    ┌──────────┐ ┌──────────┐  ┌────────────┐            │
//!                      │    │  crypto  │ │ storage  │  │ anchoring  │────────────┼──▶ Data ledger
//!                      │    │ envelope │ │ ipfs/    │  │ record +   │            │    Balance ledger
//!                      │    └──────────┘ │ broker   │  │ price      │            │
//!                      │                 └────┬─────┘  └────────────┘            │
//!                      │                      │                                   │
//!                      │  ┌───────────────────┼────────────────────────────────┐ │
//!                      │  │  config · observability · resilience · lifecycle   │ │
//!                      │  └───────────────────┼────────────────────────────────┘ │
//!                      └──────────────────────┼───────────────────────────────────┘
//!                                             ▼
//!                                       Object storage
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use measurement_gateway::config::load_config;
use measurement_gateway::http::HttpServer;
use measurement_gateway::lifecycle::{self, signals, Shutdown, StartupError};
use measurement_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "measurement-gateway", version)]
#[command(about = "Signs, stores and anchors IoT measurements on a ledger", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "MEASUREMENT_GATEWAY_CONFIG", default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "measurement-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.listener.request_timeout_secs,
        confirmation_timeout_secs = config.anchoring.confirmation_timeout_secs,
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

    let gateway = lifecycle::initialize(&config).await?;

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(&config.listener, gateway.pipeline);
    server.run(listener, shutdown.signalled()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
