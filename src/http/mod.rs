//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → routing::resolver (block / preflight / not found / resolve)
//!     → upstream (origin fetch)
//!     → rewrite (redirect or body)
//!     → response.rs (merge headers, assemble)
//!     → Send to client
//! ```

pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};
