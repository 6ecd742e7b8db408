//! Configuration types for the crawler
//!
//! Defines the crawl configuration, its defaults and the domain filter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which discovered links may be added to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainFilter {
    /// Only follow links on the start URL's domain
    #[default]
    Same,
    /// Follow links to any domain
    All,
}

impl FromStr for DomainFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "same" => Ok(Self::Same),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown domain filter '{}', expected 'same' or 'all'",
                other
            )),
        }
    }
}

impl fmt::Display for DomainFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Same => f.write_str("same"),
            Self::All => f.write_str("all"),
        }
    }
}

/// Crawl configuration
///
/// Validated once before a crawl starts and never modified while it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// URL the crawl starts from
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Maximum link distance from a seed
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of page results
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Number of concurrent workers
    #[serde(rename = "workers", default = "default_workers")]
    pub worker_count: usize,

    /// Pause before every fetch (milliseconds)
    #[serde(rename = "delay-ms", default)]
    pub delay_ms: u64,

    /// Per-attempt request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "respect-robots", default = "default_true")]
    pub respect_robots: bool,

    /// Seed the frontier from the site's sitemap(s)
    #[serde(rename = "parse-sitemap", default)]
    pub parse_sitemap: bool,

    #[serde(rename = "domain-filter", default)]
    pub domain_filter: DomainFilter,

    /// Retries after the first attempt for transient failures
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base of the exponential retry backoff (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Bound on queued tasks; discovered links are dropped when full.
    /// Unbounded when absent.
    #[serde(rename = "frontier-capacity", default)]
    pub frontier_capacity: Option<usize>,
}

fn default_max_depth() -> u32 {
    3
}

fn default_max_pages() -> usize {
    1000
}

fn default_workers() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!(
        "SEOCrawler/{} (+https://github.com/seo-crawler)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

impl CrawlConfig {
    /// Creates a configuration with default limits for a start URL
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            worker_count: default_workers(),
            delay_ms: 0,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            respect_robots: true,
            parse_sitemap: false,
            domain_filter: DomainFilter::Same,
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            frontier_capacity: None,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// The product token robots.txt groups are matched against
    /// (`SEOCrawler` for `SEOCrawler/1.0 (+https://...)`)
    pub fn robots_agent(&self) -> &str {
        self.user_agent
            .split(|c: char| c == '/' || c.is_whitespace())
            .find(|token| !token.is_empty())
            .unwrap_or("*")
    }
}
