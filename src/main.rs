//! Circuit-breaking API gateway.
//!
//! Fronts a set of HTTP services and isolates their failures: every service
//! gets its own circuit breaker, and a failing upstream is short-circuited
//! instead of tying up callers.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                    GATEWAY                       │
//!                      │                                                  │
//!     Client Request   │  ┌─────────┐    ┌──────────┐    ┌────────────┐   │
//!     ─────────────────┼─▶│  http   │───▶│ routing  │───▶│ resilience │   │
//!                      │  │ server  │    │  table   │    │  breaker   │   │
//!                      │  └─────────┘    └──────────┘    └─────┬──────┘   │
//!                      │                                       │          │
//!                      │                                       ▼          │
//!     Client Response  │  ┌──────────┐                  ┌────────────┐    │
//!     ◀────────────────┼──│ response │◀─────────────────│  forward   │◀───┼──── Upstream
//!                      │  │  relay   │                  │  action    │    │     Service
//!                      │  └──────────┘                  └────────────┘    │
//!                      │                                                  │
//!                      │  ┌────────────────────────────────────────────┐  │
//!                      │  │           Cross-Cutting Concerns           │  │
//!                      │  │  config · observability · admin · lifecycle│  │
//!                      │  └────────────────────────────────────────────┘  │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use breaker_gateway::config::load_config;
use breaker_gateway::lifecycle::{spawn_signal_listener, Shutdown};
use breaker_gateway::observability::{init_logging, metrics};
use breaker_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "breaker-gateway")]
#[command(about = "HTTP gateway with per-service circuit breakers", long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "breaker-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = ?config.environment,
        services = config.services.len(),
        timeout_ms = config.breaker.timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = GatewayServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
