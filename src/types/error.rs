//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Each variant maps to one failure class of the gateway:
//!
//! - **Credential**: authentication refused (bad credentials, forbidden) - fail fast
//! - **RateLimited**: server-imposed throttling - retried up to the bound, then surfaced
//! - **RemoteService**: non-2xx responses, network failures, unexpected errors
//! - **NotFound**: a requested page does not exist
//! - **Conversion**: storage-format to Markdown rewriting failed
//! - **NotInitialized**: request issued before the HTTP session was acquired
//!
//! ## Design Principles
//!
//! - Single unified error type (GateError) for the entire application
//! - No error is silently dropped: wrapped failures keep the original
//!   message in a `details` field so root cause is diagnosable without
//!   re-running the call
//! - No panic/unwrap in production paths

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Remote API Errors
    // -------------------------------------------------------------------------
    /// Authentication refused: invalid credentials or insufficient permissions
    #[error("authentication failed: {message}")]
    Credential {
        message: String,
        details: Option<String>,
    },

    /// Server-imposed throttling (HTTP 429)
    #[error("rate limit exceeded")]
    RateLimited {
        /// Seconds to wait before retry, from the Retry-After header
        retry_after: Option<u64>,
        details: Option<String>,
    },

    /// Non-2xx responses not otherwise classified, network-layer failures,
    /// and unexpected errors
    #[error("remote service error: {message}")]
    RemoteService {
        message: String,
        status: Option<u16>,
        details: Option<String>,
    },

    /// Requested page does not exist (HTTP 404)
    #[error("page not found: {page_id}")]
    NotFound {
        page_id: String,
        details: Option<String>,
    },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    /// Storage-format to Markdown conversion failed
    #[error("failed to convert content")]
    Conversion { details: String },

    /// Request issued before `connect()` acquired the HTTP session.
    /// A lifecycle misuse, never retried.
    #[error("client not initialized: call connect() before issuing requests")]
    NotInitialized,

    /// Caller supplied invalid parameters (empty query, empty page id)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("config error: {0}")]
    Config(String),
}

impl GateError {
    /// Credential error with a details string
    pub fn credential(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Remote service error without a status code (network-layer failures)
    pub fn remote(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::RemoteService {
            message: message.into(),
            status: None,
            details: Some(details.into()),
        }
    }

    /// Remote service error carrying the HTTP status and raw body
    pub fn remote_status(
        message: impl Into<String>,
        status: u16,
        details: impl Into<String>,
    ) -> Self {
        Self::RemoteService {
            message: message.into(),
            status: Some(status),
            details: Some(details.into()),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteService { status, .. } => *status,
            Self::RateLimited { .. } => Some(429),
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Details string carried by this error, if any
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Credential { details, .. }
            | Self::RateLimited { details, .. }
            | Self::RemoteService { details, .. }
            | Self::NotFound { details, .. } => details.as_deref(),
            Self::Conversion { details } => Some(details),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
