//! HTTP fetching
//!
//! Defines the fetch trait used by the import pipeline and a reqwest based
//! implementation with retries.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Maximum number of redirects followed per request
pub const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {0} timed out")]
    Timeout(String),
    #[error("Could not connect to {url}: {message}")]
    Connect { url: String, message: String },
    #[error("Reading the response from {url} failed: {message}")]
    Body { url: String, message: String },
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("{url} returned HTTP status {status}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// Whether repeating the request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout(_) | FetchError::Connect { .. } | FetchError::Body { .. }
        )
    }

    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(url.to_string())
        } else if err.is_connect() {
            FetchError::Connect {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            FetchError::Body {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// A fully buffered HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Server errors and rate limiting are worth another attempt
    pub fn is_retryable(&self) -> bool {
        self.status >= 500 || self.status == 429
    }

    /// Turn non-2xx responses into [`FetchError::Status`]
    pub fn error_for_status(self, url: &str) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Status {
                url: url.to_string(),
                status: self.status,
            })
        }
    }
}

/// Something that can GET a URL
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// Exponential backoff settings
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (zero based)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Run `op` until it succeeds, fails permanently or retries are exhausted
pub async fn with_retries<F, Fut>(
    policy: &RetryPolicy,
    url: &str,
    mut op: F,
) -> Result<FetchResponse, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<FetchResponse, FetchError>>,
{
    let mut attempt = 0;
    loop {
        let result = op().await;
        let retry = match &result {
            Ok(response) => response.is_retryable(),
            Err(err) => err.is_transient(),
        };
        if !retry || attempt >= policy.max_retries {
            return result;
        }

        let delay = policy.delay(attempt);
        tracing::debug!("Retrying {} in {:?} (attempt {})", url, delay, attempt + 1);
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// reqwest based fetcher
pub struct HttpFetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| FetchError::Request {
                url: String::new(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, retry })
    }

    async fn get_once(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?
            .to_vec();

        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl HttpFetch for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        with_retries(&self.retry, url, || self.get_once(url)).await
    }
}
