//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt files.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::ParsedRobots;

use reqwest::Client;
use url::Url;

/// Builds the robots.txt URL for the origin of `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    url.join("/robots.txt").ok()
}

/// Fetches robots.txt for the origin of a URL
///
/// # Returns
///
/// * `Some(ParsedRobots)` - robots.txt was served (a 4xx means no rules, so
///   it yields an allow-all policy)
/// * `None` - robots.txt could not be fetched (network error, 5xx)
pub async fn fetch_robots(client: &Client, url: &Url) -> Option<ParsedRobots> {
    let robots_url = robots_url(url)?;

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(url = %robots_url, error = %e, "Failed to fetch robots.txt");
            return None;
        }
    };

    let status = response.status();
    if status.is_client_error() {
        tracing::debug!(url = %robots_url, status = status.as_u16(), "No robots.txt");
        return Some(ParsedRobots::allow_all());
    }

    if !status.is_success() {
        tracing::warn!(url = %robots_url, status = status.as_u16(), "robots.txt unavailable");
        return None;
    }

    match response.text().await {
        Ok(body) => Some(ParsedRobots::from_content(&body)),
        Err(e) => {
            tracing::warn!(url = %robots_url, error = %e, "Failed to read robots.txt");
            None
        }
    }
}
