//! Configuration Types
//!
//! Configuration structures with sensible defaults. Sensitive values
//! (API token, account email) are masked in Debug output so the merged
//! configuration can be logged safely.

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::constants::retry;
use crate::types::{GateError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Confluence instance and credential settings
    pub confluence: ConfluenceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            confluence: ConfluenceConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values and normalize the base URL.
    /// Returns `GateError::Config` on validation failure.
    pub fn validate(&mut self) -> Result<()> {
        self.confluence.validate()
    }
}

// =============================================================================
// Confluence Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfluenceConfig {
    /// Base URL of the Confluence instance
    /// (e.g., https://domain.atlassian.net/wiki)
    pub base_url: String,

    /// Account email associated with the API token
    pub user_email: String,

    /// API token generated from Atlassian account settings.
    /// Never serialized back out.
    #[serde(skip_serializing)]
    pub api_token: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries for transient failures (429, connect errors)
    pub max_retries: u32,
}

impl Default for ConfluenceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            user_email: String::new(),
            api_token: String::new(),
            timeout_secs: retry::DEFAULT_TIMEOUT_SECS,
            max_retries: retry::DEFAULT_MAX_RETRIES,
        }
    }
}

impl ConfluenceConfig {
    /// Validate the instance URL and timeout, stripping any trailing
    /// slash from the base URL.
    pub fn validate(&mut self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(GateError::Config(
                "confluence.base_url cannot be empty".to_string(),
            ));
        }

        let parsed = Url::parse(&self.base_url)
            .map_err(|e| GateError::Config(format!("Invalid base_url '{}': {}", self.base_url, e)))?;

        match parsed.scheme() {
            "https" => {}
            "http" => {
                warn!(
                    "Using non-HTTPS URL: {}. Consider HTTPS for secure communication.",
                    self.base_url
                );
            }
            other => {
                return Err(GateError::Config(format!(
                    "URL scheme must be 'http' or 'https', got: {}://",
                    other
                )));
            }
        }

        if parsed.host_str().is_none() {
            return Err(GateError::Config(format!(
                "URL must include a host (e.g., domain.atlassian.net), got: {}",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(GateError::Config(
                "confluence.timeout_secs must be greater than 0".to_string(),
            ));
        }

        self.base_url = self.base_url.trim_end_matches('/').to_string();
        Ok(())
    }

    fn masked_token(&self) -> String {
        if self.api_token.len() >= 4 {
            format!("****{}", &self.api_token[self.api_token.len() - 4..])
        } else {
            "****".to_string()
        }
    }

    fn masked_email(&self) -> String {
        match self.user_email.split_once('@') {
            Some((local, domain)) if !local.is_empty() => {
                let first = local.chars().next().unwrap_or('*');
                format!("{}***@{}", first, domain)
            }
            Some((_, domain)) => format!("***@{}", domain),
            None => "***".to_string(),
        }
    }
}

impl std::fmt::Debug for ConfluenceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfluenceConfig")
            .field("base_url", &self.base_url)
            .field("user_email", &self.masked_email())
            .field("api_token", &self.masked_token())
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ConfluenceConfig {
        ConfluenceConfig {
            base_url: "https://example.atlassian.net/wiki".to_string(),
            user_email: "user@example.com".to_string(),
            api_token: "secret-token-abcd".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_accepts_https() {
        let mut cfg = valid_config();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_strips_trailing_slash() {
        let mut cfg = valid_config();
        cfg.base_url = "https://example.atlassian.net/wiki/".to_string();
        cfg.validate().unwrap();
        assert_eq!(cfg.base_url, "https://example.atlassian.net/wiki");
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let mut cfg = valid_config();
        cfg.base_url = "ftp://example.atlassian.net".to_string();
        assert!(matches!(cfg.validate(), Err(GateError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let mut cfg = valid_config();
        cfg.base_url = String::new();
        assert!(matches!(cfg.validate(), Err(GateError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_missing_scheme() {
        let mut cfg = valid_config();
        cfg.base_url = "example.atlassian.net".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut cfg = valid_config();
        cfg.timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_debug_masks_secrets() {
        let cfg = valid_config();
        let debug = format!("{:?}", cfg);
        assert!(!debug.contains("secret-token-abcd"));
        assert!(debug.contains("****abcd"));
        assert!(debug.contains("u***@example.com"));
        assert!(!debug.contains("user@example.com"));
    }

    #[test]
    fn test_debug_masks_short_token() {
        let mut cfg = valid_config();
        cfg.api_token = "ab".to_string();
        let debug = format!("{:?}", cfg);
        assert!(debug.contains("\"****\""));
    }
}
