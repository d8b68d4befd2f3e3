//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, method)
//!     → resolver.rs (blocklist, preflight, host lookup, path sanitizing)
//!     → domains.rs (first prefix match in table order)
//!     → Return: Resolution
//! ```
//!
//! # Design Decisions
//! - Table built at startup, immutable at runtime
//! - Deterministic: same input always matches same entry
//! - First match wins (table order)

pub mod domains;
pub mod resolver;

pub use domains::{DomainEntry, DomainTable, ResolvedRoute};
pub use resolver::{Resolution, Resolver};
