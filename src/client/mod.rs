//! Confluence REST Client
//!
//! Session lifecycle, the retrying request executor, and the three read
//! operations the gateway exposes: CQL search, page content retrieval
//! (with optional Markdown conversion), and child-page listing.
//!
//! ## Retry Policy
//!
//! Exactly three failure shapes are retried, each up to `max_retries`
//! additional attempts: HTTP 429, connect timeouts, and connect errors.
//! The wait before a retry honors the server's `Retry-After` hint for
//! 429 and otherwise doubles per attempt (1s, 2s, 4s, ...). Read/write
//! timeouts and every other failure surface immediately; the operations
//! here are all idempotent GETs, so replaying a request is safe.

mod retry;
mod transport;

pub use retry::{backoff_delay, Sleeper, TokioSleeper};
pub use transport::{HttpTransport, RawResponse, ReqwestTransport, TransportError};

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::auth::SharedAuth;
use crate::constants::api::{
    API_BASE_PATH, DEFAULT_CHILDREN_LIMIT, DEFAULT_SEARCH_LIMIT, MAX_RESULTS_PER_PAGE,
    MIN_RESULTS_PER_PAGE, PAGE_CONTENT_EXPAND,
};
use crate::convert::{MarkupConvert, StorageConverter};
use crate::types::{ChildPage, GateError, PageContent, PageSearchResult, Paginated, Result};

/// Read-only client for the Confluence REST API.
///
/// Construct, call [`connect`](Self::connect) to acquire the HTTP
/// session, issue operations, then [`close`](Self::close). Requests
/// before `connect()` fail with [`GateError::NotInitialized`].
pub struct ConfluenceClient {
    base_url: String,
    api_base: String,
    auth: SharedAuth,
    timeout: Duration,
    max_retries: u32,
    transport: Option<Arc<dyn HttpTransport>>,
    sleeper: Arc<dyn Sleeper>,
    converter: Arc<dyn MarkupConvert>,
}

impl ConfluenceClient {
    pub fn new(
        base_url: impl Into<String>,
        auth: SharedAuth,
        timeout_secs: u64,
        max_retries: u32,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let api_base = format!("{}{}", base_url, API_BASE_PATH);
        Self {
            base_url,
            api_base,
            auth,
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            transport: None,
            sleeper: Arc::new(TokioSleeper),
            converter: Arc::new(StorageConverter::new()),
        }
    }

    /// Acquire the pooled HTTP session. Idempotent.
    pub fn connect(&mut self) -> Result<()> {
        if self.transport.is_none() {
            self.transport = Some(Arc::new(ReqwestTransport::new(self.timeout)?));
            debug!(base_url = %self.base_url, "HTTP session opened");
        }
        Ok(())
    }

    /// Release the HTTP session. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!("HTTP session closed");
        }
    }

    /// Search pages with a CQL query.
    ///
    /// `limit` is clamped to the API's accepted range; `start` is the
    /// pagination offset.
    pub async fn search_pages(
        &self,
        cql: &str,
        limit: Option<u32>,
        start: Option<u32>,
    ) -> Result<Paginated<PageSearchResult>> {
        let cql = cql.trim();
        if cql.is_empty() {
            return Err(GateError::InvalidRequest(
                "CQL query cannot be empty".to_string(),
            ));
        }

        let limit = clamp_limit(limit, DEFAULT_SEARCH_LIMIT);
        let start = start.unwrap_or(0);
        let query = [
            ("cql", cql.to_string()),
            ("limit", limit.to_string()),
            ("start", start.to_string()),
        ];

        let data = self
            .execute(Method::GET, "/content/search", &query, None)
            .await?;

        let empty = Vec::new();
        let items = data.get("results").and_then(Value::as_array).unwrap_or(&empty);
        let results: Vec<PageSearchResult> = items
            .iter()
            .filter_map(|item| {
                let id = json_str(item.get("id"))?;
                let url = self.page_url(item, &id);
                Some(PageSearchResult {
                    id,
                    title: item
                        .get("title")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                    url,
                    space_key: item
                        .pointer("/space/key")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    excerpt: item.get("excerpt").and_then(Value::as_str).map(str::to_string),
                })
            })
            .collect();

        info!(cql, count = results.len(), "search completed");
        Ok(paginated(results, &data, start, limit))
    }

    /// Retrieve a page's content and metadata.
    ///
    /// With `as_markdown` the storage body goes through the converter;
    /// on conversion failure the raw storage markup is returned with
    /// `content_format: "html"` instead of failing the retrieval.
    pub async fn get_page_content(&self, page_id: &str, as_markdown: bool) -> Result<PageContent> {
        let page_id = page_id.trim();
        if page_id.is_empty() {
            return Err(GateError::InvalidRequest(
                "Page ID cannot be empty".to_string(),
            ));
        }

        let endpoint = format!("/content/{}", page_id);
        let query = [("expand", PAGE_CONTENT_EXPAND.to_string())];
        let data = self
            .execute(Method::GET, &endpoint, &query, None)
            .await
            .map_err(|err| {
                if err.status() == Some(404) {
                    GateError::NotFound {
                        page_id: page_id.to_string(),
                        details: Some(format!("Page {} not found", page_id)),
                    }
                } else {
                    err
                }
            })?;

        let html = data
            .pointer("/body/storage/value")
            .and_then(Value::as_str)
            .unwrap_or("");

        // An empty storage body has nothing to convert; it is reported
        // as html like any other unconverted content.
        let (content, content_format) = if as_markdown && !html.is_empty() {
            match self.converter.convert(html) {
                Ok(markdown) => (markdown, "markdown"),
                Err(err) => {
                    warn!(page_id, error = %err, "conversion failed, returning storage format");
                    (html.to_string(), "html")
                }
            }
        } else {
            (html.to_string(), "html")
        };

        let last_modified = data
            .pointer("/history/lastUpdated/when")
            .and_then(Value::as_str)
            .and_then(|when| match DateTime::parse_from_rfc3339(when) {
                Ok(ts) => Some(ts.with_timezone(&Utc)),
                Err(err) => {
                    warn!(page_id, when, error = %err, "unparseable last-modified timestamp");
                    None
                }
            });

        let author = data
            .pointer("/history/lastUpdated/by/displayName")
            .and_then(Value::as_str)
            .or_else(|| {
                data.pointer("/history/lastUpdated/by/username")
                    .and_then(Value::as_str)
            })
            .map(str::to_string);

        let id = json_str(data.get("id")).unwrap_or_else(|| page_id.to_string());
        let url = self.page_url(&data, &id);

        Ok(PageContent {
            id,
            title: data
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            content,
            content_format: content_format.to_string(),
            url,
            space_key: data
                .pointer("/space/key")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            version: data.pointer("/version/number").and_then(Value::as_i64).unwrap_or(1),
            last_modified,
            author,
        })
    }

    /// List direct children of a page.
    pub async fn get_child_pages(
        &self,
        page_id: &str,
        limit: Option<u32>,
        start: Option<u32>,
    ) -> Result<Paginated<ChildPage>> {
        let page_id = page_id.trim();
        if page_id.is_empty() {
            return Err(GateError::InvalidRequest(
                "Page ID cannot be empty".to_string(),
            ));
        }

        let limit = clamp_limit(limit, DEFAULT_CHILDREN_LIMIT);
        let start = start.unwrap_or(0);
        let endpoint = format!("/content/{}/child/page", page_id);
        let query = [("limit", limit.to_string()), ("start", start.to_string())];

        let data = self
            .execute(Method::GET, &endpoint, &query, None)
            .await
            .map_err(|err| {
                if err.status() == Some(404) {
                    GateError::NotFound {
                        page_id: page_id.to_string(),
                        details: Some(format!("Page {} not found", page_id)),
                    }
                } else {
                    err
                }
            })?;

        let empty = Vec::new();
        let items = data.get("results").and_then(Value::as_array).unwrap_or(&empty);
        let results: Vec<ChildPage> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let id = json_str(item.get("id"))?;
                let url = self.page_url(item, &id);
                Some(ChildPage {
                    id,
                    title: item
                        .get("title")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                    url,
                    position: start + index as u32,
                })
            })
            .collect();

        info!(page_id, count = results.len(), "child pages listed");
        Ok(paginated(results, &data, start, limit))
    }

    /// Send one API request, retrying the transient failure classes.
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let transport = self.transport.as_ref().ok_or(GateError::NotInitialized)?;
        let url = format!("{}{}", self.api_base, endpoint);

        let mut headers = self.auth.auth_headers();
        headers.insert("Accept".to_string(), "application/json".to_string());

        let mut attempt: u32 = 0;
        loop {
            debug!(%url, attempt, "sending request");
            let outcome = transport
                .send(method.clone(), &url, query, body, &headers)
                .await;

            match outcome {
                Ok(response) => match response.status {
                    // Only 200 carries a body the API contract defines;
                    // any other 2xx is unexpected for these endpoints.
                    200 => return Ok(serde_json::from_str(&response.body)?),
                    401 => {
                        return Err(GateError::credential(
                            "Authentication failed",
                            "Invalid API token or email. Please check your credentials.",
                        ));
                    }
                    403 => {
                        return Err(GateError::credential(
                            "Access forbidden",
                            "Valid credentials but insufficient permissions to access this resource.",
                        ));
                    }
                    404 => {
                        return Err(GateError::remote_status(
                            "Resource not found",
                            404,
                            format!("{} {} returned 404", method, url),
                        ));
                    }
                    429 => {
                        if attempt >= self.max_retries {
                            return Err(GateError::RateLimited {
                                retry_after: response.retry_after,
                                details: Some(format!(
                                    "Max retries ({}) exceeded",
                                    self.max_retries
                                )),
                            });
                        }
                        let delay = backoff_delay(attempt, response.retry_after);
                        warn!(attempt, delay_secs = delay.as_secs(), "rate limited, backing off");
                        self.sleeper.sleep(delay).await;
                        attempt += 1;
                    }
                    status if status >= 500 => {
                        return Err(GateError::remote_status(
                            format!("Server error: {}", status),
                            status,
                            response.body,
                        ));
                    }
                    status => {
                        return Err(GateError::remote_status(
                            format!("HTTP error: {}", status),
                            status,
                            response.body,
                        ));
                    }
                },
                Err(err) => {
                    let retryable = matches!(
                        err,
                        TransportError::ConnectTimeout(_) | TransportError::Connect(_)
                    );
                    if retryable && attempt < self.max_retries {
                        let delay = backoff_delay(attempt, None);
                        warn!(attempt, delay_secs = delay.as_secs(), error = %err, "connection failed, backing off");
                        self.sleeper.sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(match err {
                        TransportError::ConnectTimeout(msg) => GateError::remote(
                            "Connection timeout",
                            format!(
                                "Failed to connect to {} after {} retries: {}",
                                url, self.max_retries, msg
                            ),
                        ),
                        TransportError::Connect(msg) => GateError::remote(
                            "Connection error",
                            format!(
                                "Failed to connect to {} after {} retries: {}",
                                url, self.max_retries, msg
                            ),
                        ),
                        TransportError::Timeout(msg) => GateError::remote(
                            "Request timed out",
                            format!(
                                "Request to {} timed out after {}s: {}",
                                url,
                                self.timeout.as_secs(),
                                msg
                            ),
                        ),
                        TransportError::Request(msg) => GateError::remote(
                            "Network error",
                            format!("Failed to connect to {}: {}", url, msg),
                        ),
                        TransportError::Unexpected(msg) => GateError::remote(
                            "Unexpected error",
                            format!("Unexpected error during API request: {}", msg),
                        ),
                    });
                }
            }
        }
    }

    /// Full page URL from the API item, falling back to a stable path.
    fn page_url(&self, item: &Value, id: &str) -> String {
        match item.pointer("/_links/webui").and_then(Value::as_str) {
            Some(webui) => format!("{}{}", self.base_url, webui),
            None => format!("{}/pages/{}", self.base_url, id),
        }
    }
}

fn clamp_limit(limit: Option<u32>, default: u32) -> u32 {
    limit
        .unwrap_or(default)
        .clamp(MIN_RESULTS_PER_PAGE, MAX_RESULTS_PER_PAGE)
}

/// String out of a JSON value that may be a string or a number.
fn json_str(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Wrap results in the pagination envelope, preferring what the API
/// reports over what was requested.
fn paginated<T>(results: Vec<T>, data: &Value, start: u32, limit: u32) -> Paginated<T> {
    let get_u32 =
        |key: &str| data.get(key).and_then(Value::as_u64).map(|v| v as u32);
    Paginated {
        size: get_u32("size").unwrap_or(results.len() as u32),
        start: get_u32("start").unwrap_or(start),
        limit: get_u32("limit").unwrap_or(limit),
        total_size: get_u32("totalSize"),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ApiTokenAuth;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    type SendResult = std::result::Result<RawResponse, TransportError>;

    /// Scripted transport: pops one canned outcome per send and records
    /// the request it saw.
    struct MockTransport {
        responses: Mutex<VecDeque<SendResult>>,
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl MockTransport {
        fn new(responses: Vec<SendResult>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn send(
            &self,
            _method: Method,
            url: &str,
            query: &[(&str, String)],
            _body: Option<&Value>,
            _headers: &HashMap<String, String>,
        ) -> SendResult {
            self.calls.lock().unwrap().push((
                url.to_string(),
                query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            ));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport script exhausted")
        }
    }

    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                delays: Mutex::new(Vec::new()),
            })
        }

        fn delays(&self) -> Vec<Duration> {
            self.delays.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    struct FailingConverter;

    impl MarkupConvert for FailingConverter {
        fn convert(&self, _storage: &str) -> Result<String> {
            Err(GateError::Conversion {
                details: "Conversion error: io::Error: boom".to_string(),
            })
        }
    }

    const BASE: &str = "https://example.atlassian.net/wiki";

    fn test_auth() -> SharedAuth {
        Arc::new(ApiTokenAuth::new("user@example.com", "token", None).unwrap())
    }

    fn client_with(
        responses: Vec<SendResult>,
        max_retries: u32,
    ) -> (ConfluenceClient, Arc<MockTransport>, Arc<RecordingSleeper>) {
        let transport = MockTransport::new(responses);
        let sleeper = RecordingSleeper::new();
        let client = ConfluenceClient {
            base_url: BASE.to_string(),
            api_base: format!("{}{}", BASE, API_BASE_PATH),
            auth: test_auth(),
            timeout: Duration::from_secs(30),
            max_retries,
            transport: Some(transport.clone()),
            sleeper: sleeper.clone(),
            converter: Arc::new(StorageConverter::new()),
        };
        (client, transport, sleeper)
    }

    fn ok(body: serde_json::Value) -> SendResult {
        Ok(RawResponse {
            status: 200,
            retry_after: None,
            body: body.to_string(),
        })
    }

    fn status(status: u16, retry_after: Option<u64>) -> SendResult {
        Ok(RawResponse {
            status,
            retry_after,
            body: String::new(),
        })
    }

    fn search_body() -> serde_json::Value {
        json!({
            "results": [{
                "id": "123456",
                "title": "API Documentation",
                "space": {"key": "DEV"},
                "excerpt": "matching fragment",
                "_links": {"webui": "/spaces/DEV/pages/123456"}
            }],
            "start": 0,
            "limit": 25,
            "size": 1,
            "totalSize": 1
        })
    }

    #[tokio::test]
    async fn test_request_before_connect_fails() {
        let mut client = ConfluenceClient::new(BASE, test_auth(), 30, 3);
        let err = client.search_pages("type=page", None, None).await.unwrap_err();
        assert!(matches!(err, GateError::NotInitialized));

        // close() is safe on a never-connected client
        client.close();
        client.close();
    }

    #[tokio::test]
    async fn test_empty_cql_rejected_before_any_request() {
        let (client, transport, _) = client_with(vec![], 3);
        let err = client.search_pages("   ", None, None).await.unwrap_err();
        assert!(matches!(err, GateError::InvalidRequest(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_maps_results() {
        let (client, transport, _) = client_with(vec![ok(search_body())], 3);
        let page = client.search_pages("text ~ \"api\"", None, None).await.unwrap();

        assert_eq!(page.size, 1);
        assert_eq!(page.total_size, Some(1));
        let hit = &page.results[0];
        assert_eq!(hit.id, "123456");
        assert_eq!(hit.title, "API Documentation");
        assert_eq!(hit.url, format!("{}/spaces/DEV/pages/123456", BASE));
        assert_eq!(hit.space_key.as_deref(), Some("DEV"));
        assert_eq!(hit.excerpt.as_deref(), Some("matching fragment"));

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, format!("{}/rest/api/content/search", BASE));
    }

    #[tokio::test]
    async fn test_search_limit_clamped_to_api_range() {
        let (client, transport, _) =
            client_with(vec![ok(search_body()), ok(search_body())], 3);

        client.search_pages("type=page", Some(500), None).await.unwrap();
        client.search_pages("type=page", Some(0), Some(10)).await.unwrap();

        let calls = transport.calls();
        let limit_of = |call: &(String, Vec<(String, String)>)| {
            call.1
                .iter()
                .find(|(k, _)| k == "limit")
                .map(|(_, v)| v.clone())
        };
        assert_eq!(limit_of(&calls[0]).as_deref(), Some("100"));
        assert_eq!(limit_of(&calls[1]).as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion_carries_hint() {
        let (client, _, sleeper) = client_with(vec![status(429, Some(60))], 0);
        let err = client.search_pages("type=page", None, None).await.unwrap_err();

        match err {
            GateError::RateLimited { retry_after, details } => {
                assert_eq!(retry_after, Some(60));
                assert_eq!(details.as_deref(), Some("Max retries (0) exceeded"));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_waits_hint_then_succeeds() {
        let (client, transport, sleeper) =
            client_with(vec![status(429, Some(7)), ok(search_body())], 3);

        let page = client.search_pages("type=page", None, None).await.unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(sleeper.delays(), vec![Duration::from_secs(7)]);
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_connect_timeout_backs_off_exponentially() {
        let scripted = (0..4)
            .map(|_| Err(TransportError::ConnectTimeout("deadline".to_string())))
            .collect();
        let (client, transport, sleeper) = client_with(scripted, 3);

        let err = client.search_pages("type=page", None, None).await.unwrap_err();
        match &err {
            GateError::RemoteService { message, status, details } => {
                assert_eq!(message, "Connection timeout");
                assert_eq!(*status, None);
                assert!(details.as_deref().unwrap().contains("after 3 retries"));
            }
            other => panic!("expected RemoteService, got {other:?}"),
        }
        assert_eq!(
            sleeper.delays(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ]
        );
        assert_eq!(transport.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_connect_error_retried_then_succeeds() {
        let (client, _, sleeper) = client_with(
            vec![
                Err(TransportError::Connect("refused".to_string())),
                ok(search_body()),
            ],
            3,
        );
        let page = client.search_pages("type=page", None, None).await.unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(sleeper.delays(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn test_read_timeout_fails_immediately() {
        let (client, transport, sleeper) = client_with(
            vec![Err(TransportError::Timeout("read deadline".to_string()))],
            3,
        );
        let err = client.search_pages("type=page", None, None).await.unwrap_err();
        match &err {
            GateError::RemoteService { message, details, .. } => {
                assert_eq!(message, "Request timed out");
                assert!(details.as_deref().unwrap().contains("timed out after 30s"));
            }
            other => panic!("expected RemoteService, got {other:?}"),
        }
        assert!(sleeper.delays().is_empty());
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_auth_statuses_never_retried() {
        let (client, transport, sleeper) = client_with(vec![status(401, None)], 3);
        let err = client.search_pages("type=page", None, None).await.unwrap_err();
        assert!(matches!(err, GateError::Credential { .. }));
        assert!(sleeper.delays().is_empty());
        assert_eq!(transport.calls().len(), 1);

        let (client, _, _) = client_with(vec![status(403, None)], 3);
        let err = client.search_pages("type=page", None, None).await.unwrap_err();
        match err {
            GateError::Credential { message, .. } => assert_eq!(message, "Access forbidden"),
            other => panic!("expected Credential, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unexpected_2xx_is_remote_error_not_parse_error() {
        let (client, _, _) = client_with(vec![status(204, None)], 3);
        let err = client.search_pages("type=page", None, None).await.unwrap_err();
        match &err {
            GateError::RemoteService { message, status, .. } => {
                assert_eq!(message, "HTTP error: 204");
                assert_eq!(*status, Some(204));
            }
            other => panic!("expected RemoteService, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_carries_status() {
        let (client, _, _) = client_with(vec![status(503, None)], 3);
        let err = client.search_pages("type=page", None, None).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    fn page_body() -> serde_json::Value {
        json!({
            "id": "123456",
            "title": "API Documentation",
            "space": {"key": "DEV"},
            "version": {"number": 5},
            "body": {"storage": {"value": "<h1>Hello</h1>", "representation": "storage"}},
            "history": {"lastUpdated": {
                "when": "2024-03-05T12:30:00.000Z",
                "by": {"displayName": "John Doe"}
            }},
            "_links": {"webui": "/spaces/DEV/pages/123456"}
        })
    }

    #[tokio::test]
    async fn test_get_page_content_as_markdown() {
        let (client, transport, _) = client_with(vec![ok(page_body())], 3);
        let page = client.get_page_content("123456", true).await.unwrap();

        assert_eq!(page.id, "123456");
        assert_eq!(page.title, "API Documentation");
        assert_eq!(page.content, "# Hello");
        assert_eq!(page.content_format, "markdown");
        assert_eq!(page.space_key, "DEV");
        assert_eq!(page.version, 5);
        assert_eq!(page.author.as_deref(), Some("John Doe"));
        assert!(page.last_modified.is_some());
        assert_eq!(page.url, format!("{}/spaces/DEV/pages/123456", BASE));

        let calls = transport.calls();
        assert_eq!(calls[0].0, format!("{}/rest/api/content/123456", BASE));
        assert!(calls[0].1.iter().any(|(k, v)| k == "expand" && v == PAGE_CONTENT_EXPAND));
    }

    #[tokio::test]
    async fn test_get_page_content_raw_html() {
        let (client, _, _) = client_with(vec![ok(page_body())], 3);
        let page = client.get_page_content("123456", false).await.unwrap();
        assert_eq!(page.content, "<h1>Hello</h1>");
        assert_eq!(page.content_format, "html");
    }

    #[tokio::test]
    async fn test_conversion_failure_falls_back_to_storage() {
        let transport = MockTransport::new(vec![ok(page_body())]);
        let client = ConfluenceClient {
            base_url: BASE.to_string(),
            api_base: format!("{}{}", BASE, API_BASE_PATH),
            auth: test_auth(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            transport: Some(transport),
            sleeper: RecordingSleeper::new(),
            converter: Arc::new(FailingConverter),
        };

        let page = client.get_page_content("123456", true).await.unwrap();
        assert_eq!(page.content, "<h1>Hello</h1>");
        assert_eq!(page.content_format, "html");
    }

    #[tokio::test]
    async fn test_empty_storage_body_reported_as_html() {
        let mut body = page_body();
        body["body"]["storage"]["value"] = json!("");
        let (client, _, _) = client_with(vec![ok(body)], 3);

        let page = client.get_page_content("123456", true).await.unwrap();
        assert_eq!(page.content, "");
        assert_eq!(page.content_format, "html");
    }

    #[tokio::test]
    async fn test_missing_page_maps_to_not_found() {
        let (client, _, _) = client_with(vec![status(404, None)], 3);
        let err = client.get_page_content("98765", true).await.unwrap_err();
        match err {
            GateError::NotFound { page_id, details } => {
                assert_eq!(page_id, "98765");
                assert_eq!(details.as_deref(), Some("Page 98765 not found"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_parent_maps_to_not_found() {
        let (client, _, _) = client_with(vec![status(404, None)], 3);
        let err = client.get_child_pages("98765", None, None).await.unwrap_err();
        assert!(matches!(err, GateError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_page_id_rejected() {
        let (client, transport, _) = client_with(vec![], 3);
        let err = client.get_page_content("", true).await.unwrap_err();
        assert!(matches!(err, GateError::InvalidRequest(_)));
        let err = client.get_child_pages(" ", None, None).await.unwrap_err();
        assert!(matches!(err, GateError::InvalidRequest(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_timestamp_swallowed() {
        let mut body = page_body();
        body["history"]["lastUpdated"]["when"] = json!("not-a-timestamp");
        let (client, _, _) = client_with(vec![ok(body)], 3);

        let page = client.get_page_content("123456", false).await.unwrap();
        assert!(page.last_modified.is_none());
        assert_eq!(page.version, 5);
    }

    #[tokio::test]
    async fn test_child_pages_positions_offset_by_start() {
        let body = json!({
            "results": [
                {"id": "1", "title": "Alpha", "_links": {"webui": "/x/1"}},
                {"id": "2", "title": "Beta"}
            ],
            "start": 5,
            "limit": 25,
            "size": 2
        });
        let (client, transport, _) = client_with(vec![ok(body)], 3);

        let page = client.get_child_pages("123456", None, Some(5)).await.unwrap();
        assert_eq!(page.results[0].position, 5);
        assert_eq!(page.results[1].position, 6);
        assert_eq!(page.results[0].url, format!("{}/x/1", BASE));
        // No webui link: stable fallback path
        assert_eq!(page.results[1].url, format!("{}/pages/2", BASE));

        let calls = transport.calls();
        assert_eq!(
            calls[0].0,
            format!("{}/rest/api/content/123456/child/page", BASE)
        );
        // Default child-page limit
        assert!(calls[0].1.iter().any(|(k, v)| k == "limit" && v == "50"));
    }
}
