//! HTTP client for the hosted backend.
//!
//! Handles API key authentication, custom headers, timeouts, exponential
//! backoff retry for reads, and mapping of error responses.

use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Response};
use tracing::{debug, warn};

use lf_core::config::{AppConfig, BackendConfig};
use lf_core::error::{LfError, LfResult};

use crate::response::classify_failure;

/// Retry configuration for HTTP requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay between retries (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
    /// HTTP status codes that trigger a retry.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
            retryable_statuses: vec![502, 503, 504],
        }
    }
}

/// HTTP client for the PostgREST tables, RPC endpoint and object storage.
#[derive(Clone)]
pub struct ApiClient {
    inner: Client,
    /// Project URL without trailing slash (e.g. "https://abcdefgh.supabase.co").
    base_url: String,
    /// Anonymous key sent as `apikey` and bearer token.
    anon_key: String,
    /// Default request timeout.
    timeout: Duration,
    /// Custom headers from config.
    custom_headers: Vec<(String, String)>,
    /// Retry configuration.
    retry_config: RetryConfig,
}

impl ApiClient {
    /// Create a new ApiClient from backend configuration.
    pub fn new(config: &BackendConfig) -> LfResult<Self> {
        let base_url = AppConfig::sanitize_backend_url(&config.url);
        if base_url.is_empty() {
            return Err(LfError::MissingConfig("backend.url".into()));
        }
        if config.anon_key.trim().is_empty() {
            return Err(LfError::MissingConfig("backend.anon_key".into()));
        }

        let timeout = Duration::from_millis(config.api_timeout_ms);
        let inner = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(15))
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| LfError::Http(format!("failed to build HTTP client: {e}")))?;

        let mut custom_headers: Vec<(String, String)> = config
            .custom_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        custom_headers.sort();

        Ok(Self {
            inner,
            base_url,
            anon_key: config.anon_key.trim().to_string(),
            timeout,
            custom_headers,
            retry_config: RetryConfig::default(),
        })
    }

    /// Set custom retry configuration.
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a table endpoint.
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    /// URL of a stored procedure endpoint.
    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{function}", self.base_url)
    }

    /// Upload URL of an object.
    pub fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{path}", self.base_url)
    }

    /// Public URL of an object in a public bucket.
    pub fn public_object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }

    /// Apply auth and custom headers to a request builder.
    fn apply_headers(&self, mut builder: RequestBuilder) -> RequestBuilder {
        builder = builder
            .header("apikey", self.anon_key.as_str())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.anon_key));
        for (key, value) in &self.custom_headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder
    }

    fn build_request(
        &self,
        method: Method,
        url: &str,
        params: &[(String, String)],
        body: Option<&serde_json::Value>,
        prefer: Option<&str>,
    ) -> RequestBuilder {
        let mut builder = self
            .inner
            .request(method, url)
            .query(params)
            .timeout(self.timeout);
        if let Some(b) = body {
            builder = builder.json(b);
        }
        if let Some(p) = prefer {
            builder = builder.header("Prefer", p);
        }
        self.apply_headers(builder)
    }

    /// Only reads are retried; writes are sent exactly once.
    fn is_idempotent(method: &Method) -> bool {
        *method == Method::GET || *method == Method::HEAD
    }

    /// Execute a request, retrying idempotent ones with exponential backoff.
    pub(crate) async fn request(
        &self,
        method: Method,
        url: &str,
        params: &[(String, String)],
        body: Option<&serde_json::Value>,
        prefer: Option<&str>,
    ) -> LfResult<Response> {
        debug!("{} {}", method, url);

        let max_retries = if Self::is_idempotent(&method) {
            self.retry_config.max_retries
        } else {
            0
        };
        let mut last_error: Option<LfError> = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let delay = self.calculate_retry_delay(attempt - 1);
                warn!(
                    "retrying {} {} (attempt {}/{}) after {:.1}s",
                    method,
                    url,
                    attempt + 1,
                    max_retries + 1,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }

            let builder = self.build_request(method.clone(), url, params, body, prefer);

            match builder.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if self.retry_config.retryable_statuses.contains(&status)
                        && attempt < max_retries
                    {
                        warn!("retryable status {status} from {url}");
                        last_error = Some(LfError::Backend {
                            status,
                            message: format!("retryable status {status}"),
                        });
                        continue;
                    }

                    return Self::check_status(response).await;
                }
                Err(e) => {
                    let is_retryable = e.is_timeout() || e.is_connect();
                    let err = Self::classify_error(e);

                    if is_retryable && attempt < max_retries {
                        warn!("retryable error on {url}: {err}");
                        last_error = Some(err);
                        continue;
                    }

                    return Err(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| LfError::Http("max retries exceeded".into())))
    }

    /// POST raw bytes (object uploads). Not retried.
    pub(crate) async fn post_bytes(
        &self,
        url: &str,
        bytes: Vec<u8>,
        headers: &[(&str, String)],
    ) -> LfResult<Response> {
        debug!("POST (bytes, {} B) {}", bytes.len(), url);

        let mut builder = self.inner.post(url).body(bytes).timeout(self.timeout);
        for (key, value) in headers {
            builder = builder.header(*key, value.as_str());
        }
        let builder = self.apply_headers(builder);

        let response = builder.send().await.map_err(Self::classify_error)?;
        Self::check_status(response).await
    }

    /// Calculate retry delay with exponential backoff.
    fn calculate_retry_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.retry_config.base_delay.as_millis() as u64;
        let delay_ms = base_ms.saturating_mul(1u64 << attempt.min(32));
        let max_ms = self.retry_config.max_delay.as_millis() as u64;
        Duration::from_millis(delay_ms.min(max_ms))
    }

    /// Deserialize a JSON response body.
    pub(crate) async fn json_body(response: Response) -> LfResult<serde_json::Value> {
        let text = response
            .text()
            .await
            .map_err(|e| LfError::Http(format!("failed to read response body: {e}")))?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| LfError::Serialization(format!("failed to parse response: {e}")))
    }

    /// Check the HTTP status code and convert failures to LfError.
    async fn check_status(response: Response) -> LfResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = classify_failure(status.as_u16(), &body);
        debug!("backend error {}: {}", status.as_u16(), err);
        Err(err)
    }

    /// Classify a reqwest error into an LfError variant.
    fn classify_error(e: reqwest::Error) -> LfError {
        if e.is_timeout() {
            LfError::Timeout(e.to_string())
        } else if e.is_connect() {
            LfError::Http(format!("connection failed: {e}"))
        } else {
            LfError::Http(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BackendConfig {
        BackendConfig {
            url: "campus.supabase.co/".into(),
            anon_key: "anon".into(),
            ..BackendConfig::default()
        }
    }

    #[test]
    fn test_requires_url_and_key() {
        let missing_url = BackendConfig::default();
        assert!(matches!(
            ApiClient::new(&missing_url),
            Err(LfError::MissingConfig(_))
        ));

        let missing_key = BackendConfig {
            url: "https://x.supabase.co".into(),
            ..BackendConfig::default()
        };
        assert!(matches!(
            ApiClient::new(&missing_key),
            Err(LfError::MissingConfig(_))
        ));
    }

    #[test]
    fn test_urls() {
        let client = ApiClient::new(&test_config()).unwrap();
        assert_eq!(client.base_url(), "https://campus.supabase.co");
        assert_eq!(
            client.rest_url("lost_items"),
            "https://campus.supabase.co/rest/v1/lost_items"
        );
        assert_eq!(
            client.rpc_url("create_security_account"),
            "https://campus.supabase.co/rest/v1/rpc/create_security_account"
        );
        assert_eq!(
            client.public_object_url("item-images", "u1_1.png"),
            "https://campus.supabase.co/storage/v1/object/public/item-images/u1_1.png"
        );
    }

    #[test]
    fn test_retry_delay_calculation() {
        let client = ApiClient::new(&test_config()).unwrap();
        assert_eq!(client.calculate_retry_delay(0), Duration::from_millis(500));
        assert_eq!(client.calculate_retry_delay(1), Duration::from_secs(1));
        assert_eq!(client.calculate_retry_delay(2), Duration::from_secs(2));
        assert_eq!(client.calculate_retry_delay(10), Duration::from_secs(4));
    }

    #[test]
    fn test_custom_retry_config() {
        let client = ApiClient::new(&test_config())
            .unwrap()
            .with_retry_config(RetryConfig {
                base_delay: Duration::from_millis(100),
                max_delay: Duration::from_millis(300),
                ..RetryConfig::default()
            });
        assert_eq!(client.calculate_retry_delay(0), Duration::from_millis(100));
        assert_eq!(client.calculate_retry_delay(1), Duration::from_millis(200));
        assert_eq!(client.calculate_retry_delay(2), Duration::from_millis(300));
        assert_eq!(client.retry_config.max_retries, 3);
    }

    #[test]
    fn test_only_reads_retry() {
        assert!(ApiClient::is_idempotent(&Method::GET));
        assert!(ApiClient::is_idempotent(&Method::HEAD));
        assert!(!ApiClient::is_idempotent(&Method::POST));
        assert!(!ApiClient::is_idempotent(&Method::PATCH));
        assert!(!ApiClient::is_idempotent(&Method::DELETE));
    }
}
