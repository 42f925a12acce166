//! CORS relay (v1)
//!
//! A stateless relay built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                      CORS RELAY                      │
//!                    │                                                      │
//!   Client Request   │  ┌─────────┐    ┌──────────┐    ┌────────────────┐   │
//!   ─────────────────┼─▶│  http   │───▶│ security │───▶│   forwarder    │───┼──▶ Target
//!                    │  │ server  │    │  policy  │    │ (reqwest, one  │   │
//!                    │  └────┬────┘    │ + headers│    │    attempt)    │   │
//!                    │       │         └──────────┘    └───────┬────────┘   │
//!                    │       │ no target / OPTIONS             │            │
//!                    │       ▼                                 ▼            │
//!   Client Response  │  ┌─────────┐                    ┌────────────────┐   │
//!   ◀────────────────┼──│info page│◀───────────────────│ CORS rewriter  │◀──┼─── Target
//!                    │  │preflight│                    │ + header mirror│   │
//!                    │  └─────────┘                    └────────────────┘   │
//!                    │                                                      │
//!                    │  config · observability · lifecycle                  │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cors_relay::config::{load_config, RelayConfig};
use cors_relay::lifecycle::{signals, Shutdown};
use cors_relay::observability::{logging, metrics};
use cors_relay::HttpServer;

#[derive(Parser)]
#[command(name = "cors-relay")]
#[command(about = "Stateless relay adding CORS headers to any URL", long_about = None)]
struct Cli {
    /// TOML configuration file. Built-in defaults apply without one.
    #[arg(short, long, env = "CORS_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long, env = "CORS_RELAY_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!("cors-relay v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        config_file = ?cli.config,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
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
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config)?;

    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
