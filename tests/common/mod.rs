//! Shared utilities for pipeline tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;
use futures_util::future::BoxFuture;
use futures_util::stream::{self, StreamExt};
use url::Url;

use gh_mirror::config::ProxyConfig;
use gh_mirror::error::{ProxyError, Result};
use gh_mirror::routing::DomainTable;
use gh_mirror::upstream::{OriginRequest, OriginResponse, Upstream};
use gh_mirror::HttpServer;

pub const RELAY: &str = "https://relay.test/https://github.com";

/// What the origin saw.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// A scripted origin reply.
pub enum Reply {
    Respond {
        status: StatusCode,
        headers: Vec<(&'static str, &'static str)>,
        body: Vec<u8>,
    },
    /// Body fails after the headers are delivered.
    BrokenBody { content_type: &'static str },
    Fail,
}

impl Reply {
    pub fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Reply::Respond {
            status: StatusCode::OK,
            headers: vec![("content-type", content_type)],
            body: body.into(),
        }
    }

    pub fn status(status: StatusCode, headers: Vec<(&'static str, &'static str)>) -> Self {
        Reply::Respond {
            status,
            headers,
            body: Vec::new(),
        }
    }
}

/// An origin that records requests and answers from a script.
#[derive(Clone, Default)]
pub struct MockUpstream {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

impl MockUpstream {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            recorded: Arc::default(),
        }
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }
}

impl Upstream for MockUpstream {
    fn fetch(&self, request: OriginRequest) -> BoxFuture<'_, Result<OriginResponse>> {
        Box::pin(async move {
            let body = match request.body {
                Some(body) => Some(
                    to_bytes(body, usize::MAX)
                        .await
                        .map_err(|e| ProxyError::BodyRead(e.to_string()))?,
                ),
                None => None,
            };
            self.recorded.lock().unwrap().push(Recorded {
                method: request.method,
                url: request.url,
                headers: request.headers,
                body,
            });

            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Reply::status(StatusCode::OK, Vec::new()));

            match reply {
                Reply::Respond {
                    status,
                    headers,
                    body,
                } => Ok(OriginResponse::from_bytes(status, header_map(&headers), body)),
                Reply::BrokenBody { content_type } => Ok(OriginResponse {
                    status: StatusCode::OK,
                    headers: header_map(&[("content-type", content_type)]),
                    body: stream::iter(vec![
                        Ok(Bytes::from_static(b"partial")),
                        Err(ProxyError::BodyRead("connection reset".into())),
                    ])
                    .boxed(),
                }),
                Reply::Fail => Err(ProxyError::Request("origin unreachable".into())),
            }
        })
    }
}

fn header_map(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.append(*name, HeaderValue::from_static(*value));
    }
    headers
}

/// Config with a predictable relay.
pub fn test_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.rewrite.release_relay = RELAY.into();
    config
}

/// Server over the built-in table and a scripted origin.
pub fn server(upstream: &MockUpstream) -> HttpServer {
    HttpServer::new(test_config(), DomainTable::builtin(), Arc::new(upstream.clone()))
}

pub async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_bytes(response: Response) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

/// Request builder with the mirror `Host` header.
pub fn request(method: Method, host: &str, uri: &str) -> axum::http::request::Builder {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("host", host)
}

pub fn get(host: &str, uri: &str) -> axum::http::Request<Body> {
    request(Method::GET, host, uri).body(Body::empty()).unwrap()
}
