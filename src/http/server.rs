//! HTTP server setup and the mirror pipeline.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener, shut down gracefully
//! - Run each request through resolve → fetch → rewrite
//! - Turn pipeline failures into the JSON 500 surface

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::{ProxyError, Result};
use crate::http::response;
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;
use crate::rewrite::{self, redirect, BodyRewriter, RedirectRewriter, RegexCache, RewriteContext};
use crate::routing::domains::{DomainTable, ResolvedRoute};
use crate::routing::resolver::{Resolution, Resolver};
use crate::upstream::{forwarder, Upstream};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Resolver,
    pub upstream: Arc<dyn Upstream>,
    pub bodies: BodyRewriter,
    pub redirects: RedirectRewriter,
}

impl AppState {
    /// Build the shared pipeline pieces around one domain table and pattern cache.
    pub fn new(config: &ProxyConfig, table: DomainTable, upstream: Arc<dyn Upstream>) -> Self {
        let table = Arc::new(table);
        let patterns = Arc::new(RegexCache::new());

        Self {
            resolver: Resolver::new(table.clone(), patterns.clone()),
            upstream,
            bodies: BodyRewriter::new(
                table.clone(),
                patterns.clone(),
                config.rewrite.relay().map(str::to_string),
            ),
            redirects: RedirectRewriter::new(table, patterns),
        }
    }
}

/// HTTP server for the mirror.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server that reaches origins through `upstream`.
    pub fn new(config: ProxyConfig, table: DomainTable, upstream: Arc<dyn Upstream>) -> Self {
        let state = AppState::new(&config, table, upstream);
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving the pipeline without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a signal or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> std::result::Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {},
                    _ = shutdown.recv() => {},
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler: the per-request error boundary.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let method = request.method().to_string();
    let host = request_host(&request);
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        host = %host,
        path = %path,
        "Proxying request"
    );

    let resolution = state.resolver.resolve(&host, &path, request.method());
    let (route, sanitized) = match resolution {
        Ok(Resolution::Blocked) => {
            metrics::record_request(&method, 301, "none", start_time);
            return response::blocked();
        }
        Ok(Resolution::Preflight) => {
            metrics::record_request(&method, 204, "none", start_time);
            return response::preflight();
        }
        Ok(Resolution::NotFound) => {
            tracing::debug!(request_id = %request_id, host = %host, "No proxy prefix matched");
            metrics::record_request(&method, 404, "none", start_time);
            return response::not_found();
        }
        Ok(Resolution::Resolved { route, path }) => (route, path),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Path pattern failed");
            metrics::record_request(&method, 500, "none", start_time);
            return ProxyError::from(e).into_response();
        }
    };

    match forward(&state, &route, &sanitized, request).await {
        Ok(response) => {
            metrics::record_request(
                &method,
                response.status().as_u16(),
                &route.origin_host,
                start_time,
            );
            response
        }
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                origin = %route.origin_host,
                path = %sanitized,
                error = %err,
                "Proxy error"
            );
            metrics::record_upstream_error(&route.origin_host);
            let response = err.into_response();
            metrics::record_request(&method, 500, &route.origin_host, start_time);
            response
        }
    }
}

/// Fetch from the origin and rewrite the response for the mirror.
async fn forward(
    state: &AppState,
    route: &ResolvedRoute,
    path: &str,
    request: Request<Body>,
) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let origin_request = forwarder::build_origin_request(route, path, &parts, body)?;

    tracing::debug!(url = %origin_request.url, "Forwarding to origin");
    let upstream = state.upstream.fetch(origin_request).await?;
    let status = upstream.status;
    let ctx = RewriteContext::from_route(route);

    if redirect::is_redirect(status) {
        if let Some(location) = upstream
            .headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
        {
            let location = state.redirects.rewrite(location, &ctx)?;
            metrics::record_rewrite("redirect");
            return response::redirect(status, &location);
        }
    }

    let headers = response::merge_headers(&parts.method, status, &upstream.headers);

    if response::is_no_body(status) || parts.method == Method::HEAD {
        return Ok(response::assemble(status, headers, Body::empty()));
    }

    let textual = upstream
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(rewrite::is_textual);

    let body = if textual {
        let text = upstream.text().await?;
        metrics::record_rewrite("body");
        Body::from(state.bodies.rewrite(&text, &ctx)?)
    } else {
        Body::from(upstream.bytes().await?)
    };

    Ok(response::assemble(status, headers, body))
}

/// `Host` header, falling back to the request URI authority.
fn request_host(request: &Request<Body>) -> String {
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()))
        .unwrap_or_default()
        .to_ascii_lowercase()
}
