//! Authentication Strategies
//!
//! Pluggable authentication behind the [`AuthStrategy`] trait, so the
//! request executor depends on the capability set (headers, validation,
//! state) rather than a concrete mechanism.
//!
//! ## Implementations
//!
//! - `ApiTokenAuth`: Basic auth with an Atlassian API token (current)
//! - `OAuth2Auth`: OAuth 2.0 (3LO) placeholder, not yet implemented

mod api_token;
mod oauth2;

pub use api_token::ApiTokenAuth;
pub use oauth2::OAuth2Auth;

pub(crate) use api_token::retry_after_secs;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::Result;

/// Shared authentication strategy handle for concurrent request flows.
pub type SharedAuth = Arc<dyn AuthStrategy>;

/// Authentication strategy for the Confluence REST API.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// HTTP headers required for authentication.
    ///
    /// Pure and infallible once the strategy is constructed; the
    /// encoded value is precomputed and cached.
    fn auth_headers(&self) -> HashMap<String, String>;

    /// Validate the credentials against the remote service.
    ///
    /// Returns `Ok(true)` on success. Implementations make at most one
    /// network call; retry is the request executor's concern.
    async fn authenticate(&self) -> Result<bool>;

    /// Whether a previous `authenticate()` call succeeded.
    fn is_authenticated(&self) -> bool;
}
