//! Outbound request construction.
//!
//! # Responsibilities
//! - Build `https://{origin}{path}{query}`
//! - Copy inbound headers minus platform/identity ones
//! - Pin `Host` and `Referer` to the origin
//! - Attach the body only for methods that may carry one, dropping its
//!   framing headers otherwise

use axum::body::Body;
use axum::http::{header, request::Parts, HeaderMap, HeaderValue, Method};
use url::Url;

use crate::error::{ProxyError, Result};
use crate::routing::domains::ResolvedRoute;
use crate::upstream::OriginRequest;

/// Lowercased header name prefixes never sent to the origin.
pub const SKIP_REQUEST_HEADERS: [&str; 4] = ["host", "connection", "x-forwarded-", "x-nf-"];

/// `https://{origin_host}{path}{?query}`.
pub fn origin_url(origin_host: &str, path: &str, query: Option<&str>) -> Result<Url> {
    let query = query.map(|q| format!("?{q}")).unwrap_or_default();
    Ok(Url::parse(&format!("https://{origin_host}{path}{query}"))?)
}

/// Whether `method` may carry a request body to the origin.
pub fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Filter inbound headers and pin `Host`/`Referer` to the origin.
pub fn forward_headers(inbound: &HeaderMap, origin_host: &str, origin_url: &Url) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(inbound.len());

    for (name, value) in inbound {
        // HeaderName is always lowercase.
        if SKIP_REQUEST_HEADERS
            .iter()
            .any(|skip| name.as_str().starts_with(skip))
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    headers.insert(header::HOST, header_value(origin_host)?);
    headers.insert(header::REFERER, header_value(origin_url.as_str())?);
    Ok(headers)
}

/// Assemble the request that goes to `route.origin_host`.
pub fn build_origin_request(
    route: &ResolvedRoute,
    path: &str,
    parts: &Parts,
    body: Body,
) -> Result<OriginRequest> {
    let url = origin_url(&route.origin_host, path, parts.uri.query())?;
    let mut headers = forward_headers(&parts.headers, &route.origin_host, &url)?;

    let body = if carries_body(&parts.method) {
        Some(body)
    } else {
        // A dropped body must not stay declared.
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::TRANSFER_ENCODING);
        None
    };

    Ok(OriginRequest {
        method: parts.method.clone(),
        url,
        headers,
        body,
    })
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| ProxyError::Request(e.to_string()))
}
