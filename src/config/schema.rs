//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the mirror.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::domains::DomainEntry;

/// Relay that release assets and source archives are sent through.
pub const DEFAULT_RELEASE_RELAY: &str = "https://proxy.syshub.top/https://github.com";

/// Root configuration for the mirror.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream transport timeouts.
    pub timeouts: TimeoutConfig,

    /// Body rewriting options.
    pub rewrite: RewriteConfig,

    /// Domain table override. `None` uses the built-in GitHub table.
    pub domains: Option<Vec<DomainEntry>>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for the origin transport.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { connect_secs: 10 }
    }
}

/// Response body rewriting options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Base URL prepended to release/archive paths.
    /// An empty string disables the relay passes.
    pub release_relay: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            release_relay: DEFAULT_RELEASE_RELAY.to_string(),
        }
    }
}

impl RewriteConfig {
    /// The relay base, if relay rewriting is enabled.
    pub fn relay(&self) -> Option<&str> {
        let relay = self.release_relay.trim_end_matches('/');
        (!relay.is_empty()).then_some(relay)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
