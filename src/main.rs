//! ipconf service
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                       IPCONF                          │
//!                    │                                                       │
//!   Client Request   │  ┌─────────┐    ┌──────────┐    ┌──────────────────┐ │
//!   ─────────────────┼─▶│  http   │───▶│ handlers │───▶│   ConfigStore    │ │
//!                    │  │ server  │    │          │    │ snapshot (Arc)   │ │
//!                    │  └─────────┘    └────┬─────┘    └────────┬─────────┘ │
//!                    │                      │                   │  ▲        │
//!                    │                 client_ip          save  │  │ reload │
//!                    │                      │                   ▼  │        │
//!   Client Response  │  ┌─────────┐         │           ┌──────────────────┐│
//!   ◀────────────────┼──│envelope │◀────────┘           │ Data/config.json ││◀── operator edits
//!                    │  └─────────┘                     └──────────────────┘│
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use ipconf::config::loader::load_config;
use ipconf::config::validation::validate_config;
use ipconf::config::ServiceConfig;
use ipconf::lifecycle::startup;
use ipconf::observability::logging;

#[derive(Parser)]
#[command(name = "ipconf")]
#[command(about = "Client IP lookup and hot-reloaded configuration over HTTP", long_about = None)]
struct Cli {
    /// Settings file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override store.content_root.
    #[arg(long)]
    content_root: Option<PathBuf>,

    /// Override observability.log_level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.settings {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(root) = cli.content_root {
        config.store.content_root = root;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    validate_config(&config).map_err(|errors| {
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    })?;

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ipconf starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        config_file = %config.store.file_path().display(),
        request_timeout_secs = config.timeouts.request_secs,
        "Settings loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
