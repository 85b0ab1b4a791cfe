//! Typed records for Confluence API data.
//!
//! These are the shapes handed to callers: search hits, full page
//! content, child-page listings, and the pagination envelope that
//! wraps all three.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result from a Confluence page search.
///
/// Represents a single page in search results with minimal metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageSearchResult {
    /// Unique page identifier
    pub id: String,
    /// Page title
    pub title: String,
    /// Full URL to the page
    pub url: String,
    /// Space key where the page resides
    pub space_key: Option<String>,
    /// Search result excerpt/snippet
    pub excerpt: Option<String>,
}

/// Full content of a Confluence page.
///
/// Contains the main content body, metadata, and version information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageContent {
    /// Unique page identifier
    pub id: String,
    /// Page title
    pub title: String,
    /// Page content in the requested format
    pub content: String,
    /// Format of `content`: "markdown" or "html"
    pub content_format: String,
    /// Full URL to the page
    pub url: String,
    /// Space key where the page resides
    pub space_key: String,
    /// Current page version number
    pub version: i64,
    /// Last modification timestamp
    pub last_modified: Option<DateTime<Utc>>,
    /// Last author display name
    pub author: Option<String>,
}

/// Child page metadata within a page hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChildPage {
    /// Unique page identifier
    pub id: String,
    /// Page title
    pub title: String,
    /// Full URL to the page
    pub url: String,
    /// Zero-based position within the full child listing
    /// (pagination start offset plus index in the returned page)
    pub position: u32,
}

/// Pagination envelope for list responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paginated<T> {
    /// Items in this page of results
    pub results: Vec<T>,
    /// Starting index of this page
    pub start: u32,
    /// Requested page size
    pub limit: u32,
    /// Actual number of items returned
    pub size: u32,
    /// Total matching items, when the API reports it
    pub total_size: Option<u32>,
}
