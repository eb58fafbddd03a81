//! HTTP behavior exerciser (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                  HTTP EXERCISER                      │
//!                      │                                                      │
//!     Client Request   │  ┌─────────┐    ┌──────────┐    ┌───────────────┐    │
//!     ─────────────────┼─▶│  http   │───▶│ dispatch │───▶│   handlers    │    │
//!                      │  │ server  │    │ (routing)│    │               │    │
//!                      │  └─────────┘    └──────────┘    └──────┬────────┘    │
//!                      │                                        │             │
//!                      │        ┌──────────┬──────────┬─────────┴──┐          │
//!                      │        ▼          ▼          ▼            ▼          │
//!                      │   ┌────────┐ ┌────────┐ ┌─────────┐ ┌──────────┐     │
//!                      │   │  auth  │ │ range  │ │selection│ │streaming │     │
//!                      │   └────────┘ └────────┘ └─────────┘ └──────────┘     │
//!                      │                                                      │
//!                      │  ┌─────────────────────────────────────────────────┐ │
//!                      │  │            Cross-Cutting Concerns               │ │
//!                      │  │  config · lifecycle · observability · templates │ │
//!                      │  └─────────────────────────────────────────────────┘ │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use http_exerciser::http::HttpServer;
use http_exerciser::lifecycle::{signals, startup, Shutdown};
use http_exerciser::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "http-exerciser")]
#[command(about = "Serve reproducible HTTP behaviors for client testing", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = startup::resolve_config(cli.config.as_deref(), cli.bind.as_deref())?;
    logging::init(&config.observability);

    tracing::info!("http-exerciser v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
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

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_signal(shutdown));

    server.run(listener, rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
