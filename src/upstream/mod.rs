//! Origin transport subsystem.
//!
//! # Data Flow
//! ```text
//! ResolvedRoute + sanitized path + inbound parts/body
//!     → forwarder.rs (origin URL, filtered headers, body policy)
//!     → OriginRequest
//!     → Upstream::fetch (client.rs: reqwest, redirects disabled)
//!     → OriginResponse (status, headers, body stream)
//! ```
//!
//! # Design Decisions
//! - The transport is a trait so the pipeline can run against a scripted
//!   origin in tests
//! - Exactly one fetch per inbound request; no retries
//! - Response bodies arrive as streams; the pipeline drains them before
//!   answering so a broken read still becomes a 500

pub mod client;
pub mod forwarder;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, StatusCode};
use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream, StreamExt};
use url::Url;

use crate::error::{ProxyError, Result};

pub use client::ReqwestUpstream;

/// Streamed origin response body.
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// A fully built request for an origin server.
#[derive(Debug)]
pub struct OriginRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// `None` for methods that must not carry a body.
    pub body: Option<Body>,
}

/// The raw origin response, redirects not followed.
pub struct OriginResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BodyStream,
}

impl OriginResponse {
    /// Build a response from an in-memory body.
    pub fn from_bytes(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self {
            status,
            headers,
            body: stream::once(async move { Ok(body) }).boxed(),
        }
    }

    /// Drain the body into memory.
    pub async fn bytes(self) -> Result<Vec<u8>> {
        let mut body = self.body;
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }

    /// Drain the body and decode it as UTF-8.
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes).map_err(ProxyError::from)
    }
}

impl std::fmt::Debug for OriginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OriginResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// A way of reaching origin servers.
pub trait Upstream: Send + Sync + 'static {
    /// Issue one request. Redirects must be returned, not followed.
    fn fetch(&self, request: OriginRequest) -> BoxFuture<'_, Result<OriginResponse>>;
}
