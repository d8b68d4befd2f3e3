//! Response construction.
//!
//! # Responsibilities
//! - Terminal responses: preflight, blocked, not found, redirect
//! - Merge mirror defaults (CORS, cache policy) with upstream headers
//! - Drop headers invalidated by rewriting or tied to the origin's policy
//!
//! # Design Decisions
//! - Defaults are written first; upstream headers override them by name
//! - Multi-valued upstream headers (`set-cookie`) keep every value

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::Response;

use crate::error::Result;

/// Upstream response headers that are never re-emitted.
pub const SKIP_RESPONSE_HEADERS: [&str; 7] = [
    "content-encoding",
    "content-length",
    "content-security-policy",
    "content-security-policy-report-only",
    "clear-site-data",
    "connection",
    "transfer-encoding",
];

/// Statuses that are re-emitted without a body.
pub const NO_BODY_STATUS_CODES: [StatusCode; 3] = [
    StatusCode::NO_CONTENT,
    StatusCode::RESET_CONTENT,
    StatusCode::NOT_MODIFIED,
];

const CACHE_PUBLIC: &str = "public, max-age=14400";
const CACHE_NONE: &str = "no-cache, no-store, must-revalidate";

pub fn is_no_body(status: StatusCode) -> bool {
    NO_BODY_STATUS_CODES.contains(&status)
}

/// 204 answer to any `OPTIONS` request.
pub fn preflight() -> Response {
    let mut response = empty(StatusCode::NO_CONTENT);
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, PATCH, OPTIONS"),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

/// 301 to `/404` for blocked paths.
pub fn blocked() -> Response {
    let mut response = empty(StatusCode::MOVED_PERMANENTLY);
    response
        .headers_mut()
        .insert(header::LOCATION, HeaderValue::from_static("/404"));
    response
}

/// Bare 404 for hosts outside the domain table.
pub fn not_found() -> Response {
    empty(StatusCode::NOT_FOUND)
}

/// Re-emit an upstream redirect with its original status.
pub fn redirect(status: StatusCode, location: &str) -> Result<Response> {
    Ok(Response::builder()
        .status(status)
        .header(header::LOCATION, location)
        .body(Body::empty())?)
}

/// Mirror defaults overlaid with the upstream's own headers.
pub fn merge_headers(method: &Method, status: StatusCode, upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );

    let cacheable = matches!(*method, Method::GET | Method::HEAD) && status.is_success();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(if cacheable { CACHE_PUBLIC } else { CACHE_NONE }),
    );

    for name in upstream.keys() {
        if is_skipped(name) {
            continue;
        }
        headers.remove(name);
        for value in upstream.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    headers
}

/// Final response with merged headers.
pub fn assemble(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn is_skipped(name: &HeaderName) -> bool {
    SKIP_RESPONSE_HEADERS.contains(&name.as_str())
}

fn empty(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/html"));
        headers.insert("content-encoding", HeaderValue::from_static("gzip"));
        headers.insert("content-length", HeaderValue::from_static("1234"));
        headers.insert("content-security-policy", HeaderValue::from_static("default-src 'none'"));
        headers.insert(
            "content-security-policy-report-only",
            HeaderValue::from_static("default-src 'none'"),
        );
        headers.insert("clear-site-data", HeaderValue::from_static("\"cache\""));
        headers.insert("connection", HeaderValue::from_static("close"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers
    }

    #[test]
    fn test_preflight_headers() {
        let response = preflight();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(
            headers["access-control-allow-methods"],
            "GET, POST, PUT, DELETE, PATCH, OPTIONS"
        );
        assert_eq!(headers["access-control-allow-headers"], "*");
        assert_eq!(headers["access-control-max-age"], "86400");
    }

    #[test]
    fn test_blocked_redirects_to_404() {
        let response = blocked();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()["location"], "/404");
    }

    #[test]
    fn test_redirect_keeps_status() {
        let response = redirect(StatusCode::PERMANENT_REDIRECT, "https://gh.example.com/x").unwrap();
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(response.headers()["location"], "https://gh.example.com/x");
    }

    #[test]
    fn test_merge_strips_and_keeps() {
        let headers = merge_headers(&Method::GET, StatusCode::OK, &upstream_headers());

        for skipped in SKIP_RESPONSE_HEADERS {
            assert!(headers.get(skipped).is_none(), "{skipped} should be stripped");
        }
        assert_eq!(headers["content-type"], "text/html");
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-credentials"], "true");
        assert_eq!(headers["cache-control"], "public, max-age=14400");

        let cookies: Vec<_> = headers.get_all("set-cookie").iter().collect();
        assert_eq!(cookies, ["a=1", "b=2"]);
    }

    #[test]
    fn test_cache_policy() {
        let empty = HeaderMap::new();
        assert_eq!(
            merge_headers(&Method::HEAD, StatusCode::OK, &empty)["cache-control"],
            "public, max-age=14400"
        );
        assert_eq!(
            merge_headers(&Method::POST, StatusCode::OK, &empty)["cache-control"],
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(
            merge_headers(&Method::GET, StatusCode::NOT_FOUND, &empty)["cache-control"],
            "no-cache, no-store, must-revalidate"
        );
    }

    #[test]
    fn test_upstream_overrides_defaults() {
        let mut upstream = HeaderMap::new();
        upstream.insert("cache-control", HeaderValue::from_static("max-age=0, private"));
        let headers = merge_headers(&Method::GET, StatusCode::OK, &upstream);
        assert_eq!(headers["cache-control"], "max-age=0, private");
    }
}
