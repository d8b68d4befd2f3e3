//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Enforce the domain table invariant: prefixes unique, non-empty, none a
//!   prefix of another
//! - Validate addresses and timeouts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::routing::domains::DomainEntry;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("connect timeout must be greater than zero")]
    ConnectTimeout,

    #[error("release relay '{0}' must be an http(s) url")]
    ReleaseRelay(String),

    #[error("domain table is empty")]
    EmptyDomains,

    #[error("domain entry {index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },

    #[error("proxy prefix '{0}' is used more than once")]
    DuplicatePrefix(String),

    #[error("proxy prefix '{shorter}' is a prefix of '{longer}'")]
    OverlappingPrefix { shorter: String, longer: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ConnectTimeout);
    }

    if let Some(relay) = config.rewrite.relay() {
        if url::Url::parse(relay)
            .map(|u| !matches!(u.scheme(), "http" | "https"))
            .unwrap_or(true)
        {
            errors.push(ValidationError::ReleaseRelay(relay.to_string()));
        }
    }

    if let Some(domains) = &config.domains {
        errors.extend(validate_domains(domains));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check the prefix invariant that keeps first-match host resolution deterministic.
pub fn validate_domains(entries: &[DomainEntry]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if entries.is_empty() {
        errors.push(ValidationError::EmptyDomains);
        return errors;
    }

    for (index, entry) in entries.iter().enumerate() {
        if entry.origin.is_empty() {
            errors.push(ValidationError::EmptyField { index, field: "origin" });
        }
        if entry.prefix.is_empty() {
            errors.push(ValidationError::EmptyField { index, field: "prefix" });
        }
    }

    for (i, a) in entries.iter().enumerate() {
        for b in entries.iter().skip(i + 1) {
            if a.prefix.is_empty() || b.prefix.is_empty() {
                continue;
            }
            if a.prefix == b.prefix {
                errors.push(ValidationError::DuplicatePrefix(a.prefix.clone()));
            } else if b.prefix.starts_with(&a.prefix) {
                errors.push(ValidationError::OverlappingPrefix {
                    shorter: a.prefix.clone(),
                    longer: b.prefix.clone(),
                });
            } else if a.prefix.starts_with(&b.prefix) {
                errors.push(ValidationError::OverlappingPrefix {
                    shorter: b.prefix.clone(),
                    longer: a.prefix.clone(),
                });
            }
        }
    }

    errors
}
