//! SEO Crawler: a breadth-first site crawler
//!
//! This crate crawls a website within configured boundaries (depth, page count,
//! robots.txt), extracts SEO-relevant data from every page and assembles the
//! link graph between the crawled pages.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod sitemap;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl { url: String, source: UrlError },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Sitemap error for {url}: {message}")]
    Sitemap { url: String, message: String },

    #[error("Crawl cancelled before any page was crawled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Errors for a single page fetch
///
/// These never abort a crawl. The worker records them on the page result and
/// moves on to the next task.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("too many redirects ({hops}) starting from {url}")]
    TooManyRedirects { url: String, hops: usize },

    #[error("invalid redirect location '{0}'")]
    InvalidRedirect(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{CrawlConfig, DomainFilter};
pub use crawler::{crawl, Crawler};
pub use state::{CrawlTask, LinkGraph, PageResult};
pub use self::url::{extract_domain, is_same_domain, normalize_url, resolve_url};
