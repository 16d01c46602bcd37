//! Service bootstrap binary.
//!
//! Loads configuration, installs logging and the process supervisor, then
//! serves the admin routes until SIGTERM or Ctrl-C.

use std::path::PathBuf;

use clap::Parser;

use service_bootstrap::config::{load_config, ServiceConfig};
use service_bootstrap::lifecycle::shutdown_signal;
use service_bootstrap::observability::logging::init_logging;
use service_bootstrap::observability::metrics::init_metrics;
use service_bootstrap::{ServerBuilder, Supervisor, TracingLogger};

#[derive(Parser)]
#[command(name = "service-bootstrap")]
#[command(about = "JSON-over-HTTP service with admin endpoints", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Application name (overrides the file)
    #[arg(short, long)]
    name: Option<String>,

    /// Listen port (overrides the file)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(name) = args.name {
        config.server.name = name;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_logging(&config.observability);
    tracing::info!(
        name = %config.server.name,
        port = config.server.port,
        audit = config.audit.enabled,
        "Configuration loaded"
    );

    let logger = TracingLogger::shared(config.server.name.clone());
    let supervisor = Supervisor::install(logger.clone())?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let handle = match ServerBuilder::from_config(config, Some(logger)) {
        Ok(builder) => builder.start().await,
        Err(e) => Err(e),
    };
    let handle = match handle {
        Ok(handle) => handle,
        Err(e) => {
            supervisor.fail(&e);
            return Err(e.into());
        }
    };

    shutdown_signal().await;
    tracing::info!("Shutting down");
    if let Err(e) = handle.shutdown().await {
        supervisor.fail(&e);
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
