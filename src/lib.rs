//! WikiGate - Confluence Content Gateway for AI Agents
//!
//! Read-only access to Confluence Cloud for agent workflows: CQL page
//! search, page content retrieval with storage-format to Markdown
//! conversion, and child-page listing. Transient API failures (rate
//! limits, connect errors) are retried with exponential backoff;
//! everything else fails fast with a classified error.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use wikigate::{ApiTokenAuth, ConfluenceClient};
//!
//! let auth = Arc::new(ApiTokenAuth::new(email, token, None)?);
//! let mut client = ConfluenceClient::new(base_url, auth, 30, 3);
//! client.connect()?;
//! let page = client.get_page_content("123456", true).await?;
//! client.close();
//! ```
//!
//! ## Modules
//!
//! - [`auth`]: Pluggable authentication strategies
//! - [`client`]: Session lifecycle, request executor, read operations
//! - [`convert`]: Storage-format to Markdown pipeline
//! - [`config`]: Layered configuration (defaults, files, environment)

pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod convert;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, ConfluenceConfig};

// Error Types
pub use types::{GateError, Result};

// Domain Models
pub use types::{ChildPage, PageContent, PageSearchResult, Paginated};

// Authentication
pub use auth::{ApiTokenAuth, AuthStrategy, OAuth2Auth, SharedAuth};

// Client and Conversion
pub use client::ConfluenceClient;
pub use convert::StorageConverter;
