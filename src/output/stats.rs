//! Statistics generation from crawl results
//!
//! This module provides functionality for summarizing a finished crawl and
//! displaying the summary.

use crate::state::PageResult;
use crate::url::extract_domain;
use std::collections::{BTreeMap, HashSet};
use url::Url;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    /// Total number of page results
    pub total_pages: usize,

    /// Count of pages by final HTTP status
    pub pages_by_status: BTreeMap<u16, usize>,

    /// Pages with a clean 200 response
    pub successful_pages: usize,

    /// Pages that never received a response
    pub pages_without_response: usize,

    /// Pages with an error recorded (non-2xx included)
    pub pages_with_errors: usize,

    /// Pages reached through at least one redirect
    pub redirected_pages: usize,

    /// Number of unique domains among the crawled URLs
    pub unique_domains: usize,

    pub internal_links: usize,
    pub external_links: usize,

    /// Mean response time over pages that received a response
    pub average_response_ms: f64,

    /// Successful HTML pages without a title
    pub missing_title: usize,

    /// Successful HTML pages without a meta description
    pub missing_meta_description: usize,

    /// Deepest level a page was crawled at
    pub max_depth_reached: u32,

    /// Error messages and their counts
    pub error_summary: BTreeMap<String, usize>,
}

impl CrawlStatistics {
    /// Computes statistics over a set of page results
    pub fn from_results(results: &[PageResult]) -> Self {
        let mut stats = CrawlStatistics {
            total_pages: results.len(),
            ..Default::default()
        };

        let mut domains = HashSet::new();
        let mut response_total: u64 = 0;
        let mut responded: u64 = 0;

        for page in results {
            match page.status_code {
                Some(status) => {
                    *stats.pages_by_status.entry(status).or_insert(0) += 1;
                    response_total += page.response_time_ms;
                    responded += 1;
                }
                None => stats.pages_without_response += 1,
            }

            if let Some(error) = &page.error {
                stats.pages_with_errors += 1;
                *stats.error_summary.entry(error.clone()).or_insert(0) += 1;
            }

            if page.is_ok() {
                stats.successful_pages += 1;
            }

            if !page.redirect_chain.is_empty() {
                stats.redirected_pages += 1;
            }

            if let Some(domain) = Url::parse(&page.url).ok().as_ref().and_then(extract_domain) {
                domains.insert(domain);
            }

            stats.internal_links += page.internal_links.len();
            stats.external_links += page.external_links.len();
            stats.max_depth_reached = stats.max_depth_reached.max(page.depth);

            if page.is_ok() && page.is_html() {
                if page.title.is_none() {
                    stats.missing_title += 1;
                }
                if page.meta_description.is_none() {
                    stats.missing_meta_description += 1;
                }
            }
        }

        stats.unique_domains = domains.len();
        if responded > 0 {
            stats.average_response_ms = response_total as f64 / responded as f64;
        }

        stats
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total pages crawled: {}", stats.total_pages);
    println!("  Unique domains: {}", stats.unique_domains);
    println!("  Deepest level: {}", stats.max_depth_reached);
    println!(
        "  Links found: {} internal, {} external",
        stats.internal_links, stats.external_links
    );
    println!("  Redirected pages: {}", stats.redirected_pages);
    println!("  Average response time: {:.0}ms", stats.average_response_ms);
    println!();

    println!("Pages by Status:");
    for (status, count) in &stats.pages_by_status {
        let percentage = if stats.total_pages > 0 {
            (*count as f64 / stats.total_pages as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    if stats.pages_without_response > 0 {
        println!("  no response: {}", stats.pages_without_response);
    }
    println!();

    println!("SEO:");
    println!("  Missing title: {}", stats.missing_title);
    println!(
        "  Missing meta description: {}",
        stats.missing_meta_description
    );
    println!();

    if !stats.error_summary.is_empty() {
        println!("Error Summary:");
        let mut error_counts: Vec<_> = stats.error_summary.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (error, count) in error_counts {
            println!("  {}: {}", error, count);
        }
        println!();
    }

    let successful = stats.successful_pages;
    let success_rate = if stats.total_pages > 0 {
        (successful as f64 / stats.total_pages as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages fetched cleanly)",
        success_rate, successful, stats.total_pages
    );
}
