//! Per-request error boundary.
//!
//! Everything that can fail between host resolution and the final response
//! funnels into [`ProxyError`]. The handler converts it into the one error
//! shape the client ever sees: a 500 with a JSON `{"error": ...}` body.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures inside the proxy pipeline.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Connect, TLS or DNS failure reaching the origin.
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The origin body stream broke off mid-read.
    #[error("failed to read upstream body: {0}")]
    BodyRead(String),

    /// A textual body was not valid UTF-8.
    #[error("upstream body is not valid text: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// The constructed origin URL did not parse.
    #[error("invalid origin url: {0}")]
    OriginUrl(#[from] url::ParseError),

    /// A header or response could not be assembled.
    #[error("failed to build request: {0}")]
    Request(String),

    /// A rewrite pattern failed to compile.
    #[error("invalid rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

impl From<axum::http::Error> for ProxyError {
    fn from(err: axum::http::Error) -> Self {
        ProxyError::Request(err.to_string())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() }).to_string();
        let mut response = (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_renders_json_500() {
        let err = ProxyError::BodyRead("connection reset".into());
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json["error"],
            "failed to read upstream body: connection reset"
        );
    }
}
