//! HTTP transport seam.
//!
//! The request executor talks to the wire through [`HttpTransport`], so
//! retry and classification logic can be exercised with a scripted
//! transport in tests. [`ReqwestTransport`] is the production
//! implementation; it owns the pooled HTTP session and classifies
//! low-level failures into [`TransportError`] categories the executor's
//! retry policy understands.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::auth::retry_after_secs;
use crate::types::{GateError, Result};

/// Raw HTTP response, reduced to what the executor classifies on.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Parsed Retry-After header, when present
    pub retry_after: Option<u64>,
    pub body: String,
}

/// Transport-level failure categories.
///
/// Connect timeouts and connect errors are the retryable subset; read,
/// write, and pool timeouts surface as `Timeout` and fail immediately.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("connect timeout: {0}")]
    ConnectTimeout(String),

    #[error("connect error: {0}")]
    Connect(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("request error: {0}")]
    Request(String),

    /// Anything not otherwise classified; the message carries the
    /// original error's type and description.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// One HTTP exchange against the wiki API.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(
        &self,
        method: reqwest::Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        headers: &HashMap<String, String>,
    ) -> std::result::Result<RawResponse, TransportError>;
}

/// Production transport backed by a pooled reqwest client.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GateError::remote("Failed to create HTTP client", e.to_string()))?;
        Ok(Self { client })
    }

    fn classify(e: reqwest::Error) -> TransportError {
        if e.is_connect() && e.is_timeout() {
            TransportError::ConnectTimeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_request() || e.is_body() || e.is_decode() {
            TransportError::Request(e.to_string())
        } else {
            TransportError::Unexpected(format!("reqwest::Error: {}", e))
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        method: reqwest::Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        headers: &HashMap<String, String>,
    ) -> std::result::Result<RawResponse, TransportError> {
        let mut request = self.client.request(method, url).query(query);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(json) = body {
            request = request.json(json);
        }

        let response = request.send().await.map_err(Self::classify)?;

        let status = response.status().as_u16();
        let retry_after = retry_after_secs(response.headers());
        let body = response.text().await.map_err(Self::classify)?;

        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}
