//! Per-domain robots.txt cache
//!
//! Each origin's robots.txt is fetched at most once per crawl. Concurrent
//! workers asking about the same origin wait on the same fetch.

use crate::robots::{fetch_robots, ParsedRobots};
use crate::{UrlError, UrlResult};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use url::Url;

type Slot = Arc<OnceCell<Arc<ParsedRobots>>>;

/// Robots.txt policy cache keyed by origin (scheme, host and port)
pub struct RobotsCache {
    client: Client,

    /// Product token matched against `User-agent` groups
    agent: String,

    /// When false every URL is allowed and nothing is fetched
    enabled: bool,

    entries: Mutex<HashMap<String, Slot>>,
}

impl RobotsCache {
    /// Creates a new cache
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for robots.txt requests
    /// * `agent` - User agent product token (e.g. "SEOCrawler")
    /// * `enabled` - Whether robots.txt is respected at all
    pub fn new(client: Client, agent: impl Into<String>, enabled: bool) -> Self {
        Self {
            client,
            agent: agent.into(),
            enabled,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Checks whether the crawler may fetch a URL
    ///
    /// Always allowed when the cache is disabled. A robots.txt that cannot be
    /// fetched allows everything.
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - Whether the URL is allowed
    /// * `Err(UrlError)` - The URL has no host to look robots.txt up for
    pub async fn is_allowed(&self, url: &Url) -> UrlResult<bool> {
        if !self.enabled {
            return Ok(true);
        }

        let robots = self.get(url).await?;
        Ok(robots.is_allowed(url.as_str(), &self.agent))
    }

    /// Returns the robots.txt policy for a URL's origin, fetching it on first use
    pub async fn get(&self, url: &Url) -> UrlResult<Arc<ParsedRobots>> {
        if url.host_str().map_or(true, str::is_empty) {
            return Err(UrlError::MissingDomain);
        }

        let origin = url.origin().ascii_serialization();
        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(entries.entry(origin.clone()).or_default())
        };

        let robots = slot
            .get_or_init(|| async {
                tracing::debug!(origin = %origin, "Fetching robots.txt");
                let robots = fetch_robots(&self.client, url)
                    .await
                    .unwrap_or_else(ParsedRobots::allow_all);
                Arc::new(robots)
            })
            .await;

        Ok(Arc::clone(robots))
    }

    /// Number of origins with a cached (or in-flight) robots.txt
    pub fn cached_origins(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
