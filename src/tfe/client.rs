//! Terraform HTTP client for API interactions

use std::time::Duration;

use log::{debug, error};
use reqwest::Client;
use serde_json::Value;

use crate::config::api;
use crate::tfe::throttle::RateLimiter;

/// Uniform response shape consumed by batch report logic.
///
/// Transport failures (connection refused, timeout) are converted into a
/// synthetic 500-equivalent response carrying the error message, so downstream
/// code handles them exactly like genuine server error responses.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn transport_failure(err: &reqwest::Error) -> Self {
        Self {
            status: 500,
            body: serde_json::json!({
                "tfmgr": {"error": err.to_string(), "status": 500}
            }),
        }
    }

    /// Render the response body as a single-line error message.
    ///
    /// Prefers the `errors` array the API returns on failures; falls back to
    /// the compact JSON body.
    pub fn error_message(&self) -> String {
        if let Some(errors) = self.body.get("errors").and_then(Value::as_array) {
            let parts: Vec<String> = errors
                .iter()
                .map(|e| {
                    let title = e.get("title").and_then(Value::as_str);
                    let detail = e.get("detail").and_then(Value::as_str);
                    match (title, detail) {
                        (Some(t), Some(d)) => format!("{}: {}", t, d),
                        (Some(t), None) => t.to_string(),
                        (None, Some(d)) => d.to_string(),
                        (None, None) => e.to_string(),
                    }
                })
                .collect();
            if !parts.is_empty() {
                return parts.join("; ");
            }
        }
        match &self.body {
            Value::Null => format!("status {}", self.status),
            other => other.to_string(),
        }
    }
}

/// Aggregated output of a full pagination walk.
///
/// `truncated` is set when iteration stopped on a non-200 response; the pages
/// gathered up to that point are still returned, but callers can tell the
/// difference between "that was everything" and "the API errored mid-walk".
#[derive(Debug)]
pub struct PagedResult<A> {
    pub pages: Vec<A>,
    pub truncated: bool,
}

impl<A> PagedResult<A> {
    /// Flatten per-page results into one collection.
    pub fn flatten(self) -> Vec<A::Item>
    where
        A: IntoIterator,
    {
        self.pages.into_iter().flatten().collect()
    }
}

/// Terraform API client
///
/// Every outbound request passes through the shared [`RateLimiter`], and every
/// mutation-style request is transport-safe: the caller always receives an
/// [`ApiResponse`], never a connection error.
pub struct TfeClient {
    client: Client,
    token: String,
    host: String,
    scheme: &'static str,
    limiter: RateLimiter,
    /// Custom base URL override (for testing with mock servers)
    base_url_override: Option<String>,
}

impl TfeClient {
    /// Create a new client with connection pooling and sane timeouts
    pub fn new(token: String, host: String, no_tls: bool) -> Self {
        let client = Client::builder()
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            token,
            host,
            scheme: if no_tls { "http" } else { "https" },
            limiter: RateLimiter::new(api::RATE_LIMIT_CALLS, Duration::from_secs(1)),
            base_url_override: None,
        }
    }

    /// Create a client with custom base URL (for testing with mock servers)
    #[cfg(test)]
    pub fn with_base_url(token: String, host: String, base_url: String) -> Self {
        let client = Client::builder().build().unwrap_or_else(|_| Client::new());

        Self {
            client,
            token,
            host,
            scheme: "https",
            limiter: RateLimiter::new(api::RATE_LIMIT_CALLS, Duration::from_secs(1)),
            base_url_override: Some(base_url),
        }
    }

    /// Host this client talks to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Build the base URL for API requests
    pub(crate) fn base_url(&self) -> String {
        if let Some(ref url) = self.base_url_override {
            return url.clone();
        }
        format!("{}://{}{}", self.scheme, self.host, api::BASE_PATH)
    }

    /// Add standard headers to a request builder
    fn with_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/vnd.api+json")
    }

    /// Execute a prepared request, throttled, converting transport failures
    /// into the synthetic error response shape.
    async fn execute(&self, builder: reqwest::RequestBuilder) -> ApiResponse {
        self.limiter.acquire().await;
        match self.with_headers(builder).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = match response.text().await {
                    Ok(text) if text.is_empty() => Value::Null,
                    Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
                    Err(e) => return ApiResponse::transport_failure(&e),
                };
                ApiResponse { status, body }
            }
            Err(e) => ApiResponse::transport_failure(&e),
        }
    }

    /// GET a path relative to the API base URL
    pub(crate) async fn get(&self, path: &str) -> ApiResponse {
        let url = format!("{}{}", self.base_url(), path);
        debug!("GET {}", url);
        self.execute(self.client.get(&url)).await
    }

    /// PATCH a path relative to the API base URL with a JSON body
    pub(crate) async fn patch(&self, path: &str, body: &Value) -> ApiResponse {
        let url = format!("{}{}", self.base_url(), path);
        debug!("PATCH {}", url);
        self.execute(self.client.patch(&url).json(body)).await
    }

    /// POST a path relative to the API base URL with a JSON body
    pub(crate) async fn post(&self, path: &str, body: &Value) -> ApiResponse {
        let url = format!("{}{}", self.base_url(), path);
        debug!("POST {}", url);
        self.execute(self.client.post(&url).json(body)).await
    }

    /// POST a body-less action endpoint (lock/unlock)
    pub(crate) async fn post_action(&self, path: &str) -> ApiResponse {
        let url = format!("{}{}", self.base_url(), path);
        debug!("POST {}", url);
        self.execute(self.client.post(&url)).await
    }

    /// DELETE a path relative to the API base URL
    pub(crate) async fn delete(&self, path: &str) -> ApiResponse {
        let url = format!("{}{}", self.base_url(), path);
        debug!("DELETE {}", url);
        self.execute(self.client.delete(&url)).await
    }

    /// Walk every page of a list endpoint, following the `next-page` cursor.
    ///
    /// Starts at page 1 with the fixed page size, passes each page's `data`
    /// array through `json_mapper`, and aggregates one mapped result per page
    /// (callers flatten as needed). A missing or null cursor terminates the
    /// walk; a non-200 response terminates it immediately with `truncated`
    /// set, returning whatever pages were already gathered.
    pub async fn exhaust_pages<A, F>(&self, path: &str, mut json_mapper: F) -> PagedResult<A>
    where
        F: FnMut(&Value) -> A,
    {
        let separator = if path.contains('?') { "&" } else { "?" };
        let mut pages = Vec::new();
        let mut truncated = false;
        let mut current_page: Option<u64> = Some(1);

        while let Some(page_number) = current_page {
            let url_path = format!(
                "{}{}page[size]={}&page[number]={}",
                path,
                separator,
                api::DEFAULT_PAGE_SIZE,
                page_number
            );
            let response = self.get(&url_path).await;
            if response.status != 200 {
                error!(
                    "Error reading data from {} (page {}): {}",
                    path,
                    page_number,
                    response.error_message()
                );
                truncated = true;
                break;
            }
            if let Some(data) = response.body.get("data") {
                pages.push(json_mapper(data));
            }
            current_page = next_page(&response.body);
        }

        PagedResult { pages, truncated }
    }
}

/// Extract the next-page cursor from a list response's pagination metadata
fn next_page(body: &Value) -> Option<u64> {
    body.get("meta")?.get("pagination")?.get("next-page")?.as_u64()
}

#[cfg(test)]
impl TfeClient {
    /// Create a test client with mock base URL
    pub fn test_client(base_url: &str) -> Self {
        Self::with_base_url(
            "test-token".to_string(),
            "mock.terraform.io".to_string(),
            base_url.to_string(),
        )
    }
}


#[cfg(test)]
mod pagination_tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn names_mapper(data: &Value) -> Vec<String> {
        data.as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn page_body(names: &[&str], next: Option<u64>) -> Value {
        serde_json::json!({
            "data": names.iter().map(|n| serde_json::json!({"name": n})).collect::<Vec<_>>(),
            "meta": {"pagination": {"next-page": next}}
        })
    }

    #[tokio::test]
    async fn test_exhaust_pages_single_page() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("page[number]", "1"))
            .and(query_param("page[size]", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["a", "b"], None)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client.exhaust_pages("/items", names_mapper).await;

        assert!(!result.truncated);
        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.flatten(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_exhaust_pages_follows_cursor_to_termination() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("page[number]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["a"], Some(2))))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("page[number]", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["b"], Some(3))))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("page[number]", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["c"], None)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client.exhaust_pages("/items", names_mapper).await;

        // Exactly three requests, three mapped page results, no flattening
        assert!(!result.truncated);
        assert_eq!(result.pages.len(), 3);
        assert_eq!(result.flatten(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_exhaust_pages_error_mid_walk_returns_partial_truncated() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("page[number]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["a"], Some(2))))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("page[number]", "2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let result = client.exhaust_pages("/items", names_mapper).await;

        assert!(result.truncated);
        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.flatten(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_exhaust_pages_error_on_first_page() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/items"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let result = client.exhaust_pages("/items", names_mapper).await;

        assert!(result.truncated);
        assert!(result.pages.is_empty());
    }

    #[tokio::test]
    async fn test_exhaust_pages_preserves_existing_query_params() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("search[name]", "prod"))
            .and(query_param("page[number]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["prod-1"], None)))
            .mount(&mock_server)
            .await;

        let result = client
            .exhaust_pages("/items?search[name]=prod", names_mapper)
            .await;

        assert!(!result.truncated);
        assert_eq!(result.flatten(), vec!["prod-1"]);
    }

    #[tokio::test]
    async fn test_exhaust_pages_empty_data() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/items"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_body(&[], None)),
            )
            .mount(&mock_server)
            .await;

        let result = client.exhaust_pages("/items", names_mapper).await;

        assert!(!result.truncated);
        assert_eq!(result.pages.len(), 1);
        assert!(result.flatten().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_synthetic_response() {
        // Point at a server that is not listening
        let client = TfeClient::test_client("http://127.0.0.1:1");

        let response = client.post_action("/workspaces/ws-1/actions/lock").await;

        assert_eq!(response.status, 500);
        assert!(response.body.get("tfmgr").is_some());
        assert!(!response.error_message().is_empty());
    }
}
