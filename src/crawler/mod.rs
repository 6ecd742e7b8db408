//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with redirect capture and retry logic
//! - HTML parsing and SEO data extraction
//! - The shared frontier and its termination protocol
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{Crawler, ProgressCallback};
pub use fetcher::{
    backoff_delay, build_http_client, build_resource_client, is_transient_message, FetchResult,
    Fetcher, MAX_REDIRECTS, MAX_RESOURCE_REDIRECTS,
};
pub use frontier::{Append, Frontier, Lease, StopReason};
pub use parser::{parse_html, ParsedPage};

use crate::config::CrawlConfig;
use crate::state::PageResult;

/// Runs a complete crawl
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and build the HTTP client
/// 2. Seed the frontier from the start URL (and sitemaps if enabled)
/// 3. Fetch pages with the worker pool, following in-scope links
/// 4. Return the page results once the crawl stops
///
/// Ctrl-C aborts the crawl. Use [`Crawler`] directly to access the link
/// graph or register a progress callback.
///
/// # Example
///
/// ```no_run
/// use seo_crawler::{crawl, CrawlConfig};
///
/// # async fn example() -> Result<(), seo_crawler::CrawlError> {
/// let pages = crawl(CrawlConfig::new("https://example.com/")).await?;
/// println!("Crawled {} pages", pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: CrawlConfig) -> crate::Result<Vec<PageResult>> {
    Crawler::new(config)?.crawl().await
}
