//! Sitemap discovery and seed list construction

use crate::config::DomainFilter;
use crate::robots::fetch_robots;
use crate::sitemap::{parse_sitemap_xml, SitemapDocument};
use crate::url::{is_same_domain, normalize_url};
use crate::CrawlError;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Upper bound on sitemap documents fetched for one seeding pass
pub const MAX_SITEMAPS: usize = 50;

/// Produces seed URLs from a site's sitemaps
#[derive(Debug, Clone)]
pub struct SitemapSeeder {
    client: Client,
}

impl SitemapSeeder {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Finds the sitemap URLs for a site
    ///
    /// Uses the `Sitemap:` lines of the site's robots.txt; when there are none
    /// (or robots.txt is unavailable) returns `<origin>/sitemap.xml`.
    pub async fn discover_sitemap_urls(&self, start_url: &Url) -> Vec<Url> {
        let declared: Vec<Url> = match fetch_robots(&self.client, start_url).await {
            Some(robots) => robots
                .sitemaps()
                .iter()
                .filter_map(|s| Url::parse(s).ok())
                .collect(),
            None => Vec::new(),
        };

        if !declared.is_empty() {
            tracing::debug!(count = declared.len(), "Sitemaps declared in robots.txt");
            return declared;
        }

        start_url.join("/sitemap.xml").into_iter().collect()
    }

    /// Returns the primary sitemap URL for a site
    pub async fn discover_sitemap_url(&self, start_url: &Url) -> Option<Url> {
        self.discover_sitemap_urls(start_url).await.into_iter().next()
    }

    /// Fetches a sitemap and returns every page URL it lists
    ///
    /// Sitemap indexes are followed breadth-first, up to [`MAX_SITEMAPS`]
    /// documents. Failing to fetch the given sitemap is an error; failing to
    /// fetch a nested one only skips it.
    pub async fn parse_sitemap(&self, url: &str) -> crate::Result<Vec<String>> {
        let root = self.fetch(url).await?;

        let mut urls = root.urls;
        let mut seen: HashSet<String> = HashSet::from([url.to_string()]);
        let mut queue: VecDeque<String> = root.sitemaps.into_iter().collect();
        let mut fetched = 1;

        while let Some(nested) = queue.pop_front() {
            if !seen.insert(nested.clone()) {
                continue;
            }

            if fetched >= MAX_SITEMAPS {
                tracing::warn!(url = %url, limit = MAX_SITEMAPS, "Sitemap limit reached");
                break;
            }
            fetched += 1;

            match self.fetch(&nested).await {
                Ok(document) => {
                    urls.extend(document.urls);
                    queue.extend(document.sitemaps);
                }
                Err(e) => tracing::warn!(error = %e, "Skipping nested sitemap"),
            }
        }

        tracing::debug!(url = %url, sitemaps = fetched, urls = urls.len(), "Parsed sitemap");
        Ok(urls)
    }

    async fn fetch(&self, url: &str) -> crate::Result<SitemapDocument> {
        let sitemap_error = |message: String| CrawlError::Sitemap {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| sitemap_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(sitemap_error(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| sitemap_error(e.to_string()))?;

        Ok(parse_sitemap_xml(&body))
    }

    /// Builds the seed list for a crawl
    ///
    /// The start URL always comes first. Sitemap URLs follow, normalized,
    /// deduplicated and restricted to the start domain unless the filter is
    /// [`DomainFilter::All`]. Sitemap failures are logged and fall back to the
    /// start URL alone.
    pub async fn seed(&self, start_url: &Url, filter: DomainFilter) -> Vec<String> {
        let mut seeds = vec![start_url.to_string()];
        let mut seen: HashSet<String> = seeds.iter().cloned().collect();

        for sitemap_url in self.discover_sitemap_urls(start_url).await {
            let listed = match self.parse_sitemap(sitemap_url.as_str()).await {
                Ok(listed) => listed,
                Err(e) => {
                    tracing::warn!(error = %e, "Sitemap unavailable, continuing without it");
                    continue;
                }
            };

            for raw in listed {
                let Ok(url) = normalize_url(&raw) else {
                    continue;
                };

                if filter == DomainFilter::Same && !is_same_domain(&url, start_url) {
                    continue;
                }

                let url = url.to_string();
                if seen.insert(url.clone()) {
                    seeds.push(url);
                }
            }
        }

        tracing::info!(seeds = seeds.len(), "Seeded frontier from sitemap");
        seeds
    }
}
