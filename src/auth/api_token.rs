//! API Token authentication.
//!
//! Basic Authentication with Atlassian API tokens: the account email is
//! the username and the token is the password, base64-encoded into a
//! single Authorization header. This is the recommended mechanism for
//! server-to-server integrations with Atlassian Cloud.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use super::AuthStrategy;
use crate::constants::{api, retry};
use crate::types::{GateError, Result};

/// API Token authentication using Basic Auth.
///
/// The encoded Authorization value is computed once at construction and
/// cached for the lifetime of the credential.
pub struct ApiTokenAuth {
    email: String,
    base_url: Option<String>,
    /// Precomputed `Basic base64(email:token)` value - never logged
    cached_auth_header: SecretString,
    authenticated: AtomicBool,
}

impl std::fmt::Debug for ApiTokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTokenAuth")
            .field("email", &self.email)
            .field("base_url", &self.base_url)
            .field("cached_auth_header", &"[REDACTED]")
            .field("authenticated", &self.authenticated.load(Ordering::Relaxed))
            .finish()
    }
}

impl ApiTokenAuth {
    /// Create an API token credential.
    ///
    /// `base_url` is optional: when absent, `authenticate()` skips the
    /// network round-trip and marks the credential validated, for
    /// callers that perform their own HTTP exchange.
    pub fn new(
        email: impl Into<String>,
        api_token: impl Into<String>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let email = email.into();
        let api_token = api_token.into();

        if email.is_empty() || api_token.is_empty() {
            return Err(GateError::credential(
                "Email and API token are required",
                "Both confluence.user_email and confluence.api_token must be set",
            ));
        }

        let encoded = BASE64.encode(format!("{}:{}", email, api_token));

        Ok(Self {
            email,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            cached_auth_header: SecretString::from(format!("Basic {}", encoded)),
            authenticated: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl AuthStrategy for ApiTokenAuth {
    fn auth_headers(&self) -> HashMap<String, String> {
        HashMap::from([
            (
                "Authorization".to_string(),
                self.cached_auth_header.expose_secret().to_string(),
            ),
            ("Content-Type".to_string(), "application/json".to_string()),
        ])
    }

    async fn authenticate(&self) -> Result<bool> {
        let Some(base_url) = &self.base_url else {
            // No base URL: validation is deferred to the caller's own
            // HTTP exchange.
            self.authenticated.store(true, Ordering::Relaxed);
            return Ok(true);
        };

        // /user/current is the cheapest endpoint that exercises the
        // credentials end to end.
        let url = format!(
            "{}{}{}",
            base_url,
            api::API_BASE_PATH,
            api::CURRENT_USER_ENDPOINT
        );
        debug!("Validating credentials against {}", url);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(retry::DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| GateError::remote("Failed to create HTTP client", e.to_string()))?;

        let mut request = client.get(&url).header("Accept", "application/json");
        for (name, value) in self.auth_headers() {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GateError::remote(
                    "Authentication request timed out",
                    format!("Could not connect to {}: {}", url, e),
                )
            } else if e.is_connect() || e.is_request() {
                GateError::remote(
                    "Network error during authentication",
                    format!("Failed to connect to {}: {}", url, e),
                )
            } else {
                GateError::remote(
                    "Unexpected error during authentication",
                    format!("Error: reqwest::Error: {}", e),
                )
            }
        })?;

        let status = response.status().as_u16();
        let retry_after = retry_after_secs(response.headers());
        let body = response.text().await.unwrap_or_default();

        classify_validation(status, retry_after, &body)?;

        info!("Credentials validated for {}", self.email);
        self.authenticated.store(true, Ordering::Relaxed);
        Ok(true)
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Relaxed)
    }
}

/// Parse the Retry-After header as whole seconds.
pub(crate) fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Map the validation response status to an outcome.
fn classify_validation(status: u16, retry_after: Option<u64>, body: &str) -> Result<()> {
    match status {
        200 => Ok(()),
        401 => Err(GateError::credential(
            "Invalid credentials",
            "API token or email is incorrect. Verify confluence.api_token and confluence.user_email.",
        )),
        403 => Err(GateError::credential(
            "Access forbidden",
            "Valid credentials but insufficient permissions. Ensure the user has access to the Confluence instance.",
        )),
        429 => Err(GateError::RateLimited {
            retry_after,
            details: Some(
                "Too many authentication attempts. Please wait before retrying.".to_string(),
            ),
        }),
        other => Err(GateError::remote_status(
            format!("Authentication failed with status {}", other),
            other,
            body,
        )),
    }
}
