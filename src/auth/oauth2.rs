//! OAuth 2.0 (3LO) authentication placeholder.
//!
//! Required for multi-tenant deployments and apps distributed to other
//! organizations. Kept behind the same [`AuthStrategy`] interface so the
//! request executor needs no changes when this lands.
//!
//! TODO: implement the authorization-code flow with PKCE and token refresh.

use async_trait::async_trait;
use std::collections::HashMap;

use super::AuthStrategy;
use crate::types::{GateError, Result};

/// OAuth 2.0 authentication for Atlassian Cloud (not yet implemented).
#[derive(Debug)]
pub struct OAuth2Auth {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl OAuth2Auth {
    pub fn new(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Option<Vec<String>>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scopes: scopes.unwrap_or_else(|| vec!["read:confluence-content.all".to_string()]),
        }
    }
}

#[async_trait]
impl AuthStrategy for OAuth2Auth {
    fn auth_headers(&self) -> HashMap<String, String> {
        // No token flow yet; an empty mapping keeps the trait infallible.
        HashMap::new()
    }

    async fn authenticate(&self) -> Result<bool> {
        Err(GateError::credential(
            "OAuth2 authentication not yet implemented",
            "Use ApiTokenAuth until the OAuth 2.0 flow is available",
        ))
    }

    fn is_authenticated(&self) -> bool {
        false
    }
}
