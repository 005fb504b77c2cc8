//! HTTP transport.

use crate::request::HttpRequest;
use catalog::HttpMethod;
use reqwest::Method;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// A response received from the external API.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Parsed JSON when the body is JSON, the raw text otherwise, `null` when
    /// empty or unreadable.
    pub body: Value,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport failures. None of these carry a response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no response from {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("request to {url} timed out after {timeout:?}")]
    TimedOut { url: String, timeout: Duration },

    #[error("request could not be built: {0}")]
    InvalidRequest(String),
}

/// Performs one HTTP request.
pub trait HttpTransport: Send + Sync {
    fn send(
        &self,
        request: &HttpRequest,
        timeout: Duration,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, TLS roots, user agent).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn classify(error: reqwest::Error, url: &str, timeout: Duration) -> TransportError {
        if error.is_builder() {
            TransportError::InvalidRequest(error.to_string())
        } else if error.is_timeout() {
            TransportError::TimedOut {
                url: url.to_string(),
                timeout,
            }
        } else {
            TransportError::Unreachable {
                url: url.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: &HttpRequest,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        let mut req = self
            .client
            .request(method(request.method), &request.url)
            .timeout(timeout);

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        for (name, value) in &request.headers {
            req = req.header(name, value);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Self::classify(e, &request.url, timeout))?;

        // A response arrived; a failed body read must not hide its status.
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(text) => parse_body(&text),
            Err(e) => {
                warn!(url = %request.url, status, error = %e, "failed to read response body");
                Value::Null
            }
        };

        Ok(HttpResponse { status, body })
    }
}
