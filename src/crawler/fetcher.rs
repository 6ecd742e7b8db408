//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests with manual redirect following (max 10 hops)
//! - Retry logic with exponential backoff for transient failures
//! - Error classification

use crate::config::CrawlConfig;
use crate::state::PageResult;
use crate::FetchError;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client};
use std::time::{Duration, Instant};
use url::Url;

/// Maximum number of redirect hops followed for a single fetch
pub const MAX_REDIRECTS: usize = 10;

/// Redirect hops the resource client follows for robots.txt and sitemaps
pub const MAX_RESOURCE_REDIRECTS: usize = 5;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Lower-cased error message fragments that mark a failure as transient
const TRANSIENT_SIGNATURES: &[&str] = &[
    "timed out",
    "timeout",
    "connection refused",
    "connection reset",
    "connection closed",
    "broken pipe",
    "dns error",
    "failed to lookup address",
    "no such host",
    "temporary failure in name resolution",
    "unexpected eof",
];

/// Outcome of a fetch
///
/// The page is always present. `body` is only set for 2xx responses whose
/// body could be read; `error` mirrors `page.error` in typed form.
#[derive(Debug)]
pub struct FetchResult {
    pub page: PageResult,
    pub body: Option<String>,
    pub error: Option<FetchError>,
}

impl FetchResult {
    fn failed(mut page: PageResult, error: FetchError) -> Self {
        page.error = Some(error.to_string());
        Self {
            page,
            body: None,
            error: Some(error),
        }
    }

    /// Returns true if another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        self.error.as_ref().map_or(false, FetchError::is_retryable)
    }
}

impl FetchError {
    /// Whether the error belongs to the transient class that is retried:
    /// 5xx responses, timeouts, connection and DNS failures
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Connect(_) => true,
            FetchError::Status(code) => (500..600).contains(code),
            FetchError::Request(message) | FetchError::Body(message) => {
                is_transient_message(message)
            }
            FetchError::TooManyRedirects { .. } | FetchError::InvalidRedirect(_) => false,
        }
    }
}

/// Checks an error message against known transient failure signatures
pub fn is_transient_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    TRANSIENT_SIGNATURES
        .iter()
        .any(|signature| message.contains(signature))
}

/// Backoff before retry number `attempt` (1-based): `base * 2^(attempt-1)`
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    base.saturating_mul(1u32 << exponent)
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are not followed by the client; the fetcher follows them itself
/// to record the chain.
///
/// # Arguments
///
/// * `config` - The crawl configuration (user agent and timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .connect_timeout(config.timeout().min(Duration::from_secs(10)))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the HTTP client used for robots.txt and sitemap requests
///
/// Unlike the page client it follows redirects itself, up to
/// [`MAX_RESOURCE_REDIRECTS`] hops, since only the final document matters.
pub fn build_resource_client(config: &CrawlConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .connect_timeout(config.timeout().min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_RESOURCE_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

fn classify(error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_connect() {
        FetchError::Connect(error.to_string())
    } else {
        FetchError::Request(error.to_string())
    }
}

/// Single-URL HTTP retrieval with redirect capture and bounded retry
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    retry_backoff: Duration,
}

impl Fetcher {
    pub fn new(client: Client, max_retries: u32, retry_backoff: Duration) -> Self {
        Self {
            client,
            max_retries,
            retry_backoff,
        }
    }

    /// Creates a fetcher with a client built from the configuration
    pub fn from_config(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(config)?,
            config.max_retries,
            config.retry_backoff(),
        ))
    }

    /// Fetches a URL once, following redirects
    ///
    /// # Request Flow
    ///
    /// 1. Send GET with the `Accept` header
    /// 2. On a 3xx with `Location`, resolve it against the current URL, append
    ///    it to the redirect chain and repeat (an 11th hop is an error)
    /// 3. Record status, content type and response time of the final response
    /// 4. Read the body for 2xx responses; other statuses become an
    ///    `HTTP <code>` error on the page
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let mut page = PageResult::new(url);
        let start = Instant::now();

        let mut current = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => return FetchResult::failed(page, FetchError::Request(e.to_string())),
        };

        let response = loop {
            let response = match self
                .client
                .get(current.clone())
                .header(ACCEPT, ACCEPT_HTML)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    page.response_time_ms = elapsed_ms(start);
                    return FetchResult::failed(page, classify(&e));
                }
            };

            let status = response.status();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);

            let location = match location {
                Some(location) if status.is_redirection() => location,
                _ => break response,
            };

            if page.redirect_chain.len() >= MAX_REDIRECTS {
                page.status_code = Some(status.as_u16());
                page.response_time_ms = elapsed_ms(start);
                let error = FetchError::TooManyRedirects {
                    url: url.to_string(),
                    hops: page.redirect_chain.len() + 1,
                };
                return FetchResult::failed(page, error);
            }

            let next = match current.join(&location) {
                Ok(next) if matches!(next.scheme(), "http" | "https") => next,
                _ => {
                    page.status_code = Some(status.as_u16());
                    page.response_time_ms = elapsed_ms(start);
                    return FetchResult::failed(page, FetchError::InvalidRedirect(location));
                }
            };

            tracing::trace!(from = %current, to = %next, status = status.as_u16(), "Following redirect");
            page.redirect_chain.push(next.to_string());
            current = next;
        };

        let status = response.status();
        page.status_code = Some(status.as_u16());
        page.content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            page.response_time_ms = elapsed_ms(start);
            return FetchResult::failed(page, FetchError::Status(status.as_u16()));
        }

        let body = response.text().await;
        page.response_time_ms = elapsed_ms(start);

        match body {
            Ok(body) => FetchResult {
                page,
                body: Some(body),
                error: None,
            },
            Err(e) => FetchResult::failed(page, FetchError::Body(e.to_string())),
        }
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// Makes at most `max_retries + 1` attempts. Before retry `n` the fetcher
    /// sleeps `retry_backoff * 2^(n-1)`. Non-retryable outcomes (success,
    /// 4xx, redirect errors) return after the first attempt.
    pub async fn fetch_with_retry(&self, url: &str) -> FetchResult {
        let mut attempt = 0;
        loop {
            let result = self.fetch(url).await;
            if !result.is_retryable() || attempt >= self.max_retries {
                return result;
            }

            attempt += 1;
            let delay = backoff_delay(self.retry_backoff, attempt);
            tracing::debug!(
                url = %url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = result.page.error.as_deref().unwrap_or(""),
                "Retrying fetch"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
