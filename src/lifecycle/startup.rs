//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the domain table from validated configuration
//! - Initialize the origin transport and metrics exporter
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::{ProxyConfig, ValidationError};
use crate::http::HttpServer;
use crate::observability::metrics;
use crate::routing::domains::DomainTable;
use crate::upstream::ReqwestUpstream;

/// Fatal errors while bringing the mirror up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid domain table: {0:?}")]
    Domains(Vec<ValidationError>),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// The configured domain table, or the built-in one.
pub fn domain_table(config: &ProxyConfig) -> Result<DomainTable, StartupError> {
    match &config.domains {
        Some(entries) => DomainTable::from_entries(entries.clone()).map_err(StartupError::Domains),
        None => Ok(DomainTable::builtin()),
    }
}

/// Bring up every subsystem and serve until shutdown.
pub async fn run(config: ProxyConfig, shutdown: broadcast::Receiver<()>) -> Result<(), StartupError> {
    let table = domain_table(&config)?;
    tracing::info!(
        domains = table.entries().len(),
        relay = config.rewrite.relay().unwrap_or("disabled"),
        "Domain table loaded"
    );

    let upstream = ReqwestUpstream::new(&config.timeouts)?;

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let server = HttpServer::new(config, table, Arc::new(upstream));
    server.run(listener, shutdown).await?;
    Ok(())
}
