//! Global Constants
//!
//! Centralized constants for API limits and retry tuning.
//! All magic numbers should be defined here with documentation.

/// Confluence REST API constants
pub mod api {
    /// REST API v1 base path, appended to the configured base URL
    pub const API_BASE_PATH: &str = "/rest/api";

    /// Lightweight endpoint used to validate credentials
    pub const CURRENT_USER_ENDPOINT: &str = "/user/current";

    /// Maximum results per page accepted by the API
    pub const MAX_RESULTS_PER_PAGE: u32 = 100;

    /// Minimum results per page
    pub const MIN_RESULTS_PER_PAGE: u32 = 1;

    /// Default number of search results
    pub const DEFAULT_SEARCH_LIMIT: u32 = 25;

    /// Default number of child pages
    pub const DEFAULT_CHILDREN_LIMIT: u32 = 50;

    /// Expansions requested for page content retrieval
    pub const PAGE_CONTENT_EXPAND: &str = "body.storage,version,space,history.lastUpdated";
}

/// Request executor constants
pub mod retry {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default maximum retries for transient failures
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
}
