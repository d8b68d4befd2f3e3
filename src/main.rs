//! GitHub mirror reverse proxy.
//!
//! Serves GitHub and its satellite hosts under a mirror domain, rewriting
//! links in redirects and textual bodies so browsing stays on the mirror.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────┐
//!                              │                   GH MIRROR                       │
//!                              │                                                   │
//!     Client Request           │  ┌─────────┐    ┌──────────┐    ┌────────────┐   │
//!     ─────────────────────────┼─▶│  http   │───▶│ routing  │───▶│  upstream  │───┼──▶ Origin
//!                              │  │ server  │    │ resolver │    │ forwarder  │   │
//!                              │  └─────────┘    └──────────┘    └─────┬──────┘   │
//!                              │                                       │          │
//!                              │                                       ▼          │
//!     Client Response          │  ┌─────────┐    ┌──────────┐    ┌────────────┐   │
//!     ◀────────────────────────┼──│response │◀───│ rewrite  │◀───│  origin    │◀──┼─── Origin
//!                              │  │ headers │    │ body/loc │    │  response  │   │
//!                              │  └─────────┘    └──────────┘    └────────────┘   │
//!                              │                                                   │
//!                              │  ┌─────────────────────────────────────────────┐ │
//!                              │  │  config │ observability │ lifecycle        │ │
//!                              │  └─────────────────────────────────────────────┘ │
//!                              └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use gh_mirror::config::{load_config, ProxyConfig};
use gh_mirror::lifecycle::{startup, Shutdown};
use gh_mirror::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "gh-mirror", version, about = "GitHub mirror reverse proxy")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_tracing(&config.observability);

    tracing::info!("gh-mirror v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        connect_timeout_secs = config.timeouts.connect_secs,
        metrics_enabled = config.observability.metrics_enabled,
        custom_domains = config.domains.is_some(),
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    startup::run(config, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
