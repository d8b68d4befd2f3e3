//! reqwest-backed origin transport.

use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::redirect::Policy;

use crate::config::TimeoutConfig;
use crate::error::{ProxyError, Result};
use crate::upstream::{OriginRequest, OriginResponse, Upstream};

/// Fetches from origins over HTTPS.
///
/// Redirects are never followed, and compressed bodies are decoded before
/// they reach the rewriter.
#[derive(Debug, Clone)]
pub struct ReqwestUpstream {
    client: reqwest::Client,
}

impl ReqwestUpstream {
    pub fn new(timeouts: &TimeoutConfig) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()?;
        Ok(Self { client })
    }
}

impl Upstream for ReqwestUpstream {
    fn fetch(&self, request: OriginRequest) -> BoxFuture<'_, Result<OriginResponse>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method, request.url)
                .headers(request.headers);
            if let Some(body) = request.body {
                builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
            }

            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .bytes_stream()
                .map_err(|e| ProxyError::BodyRead(e.to_string()))
                .boxed();

            Ok(OriginResponse {
                status,
                headers,
                body,
            })
        })
    }
}
