//! Per-page crawl output and frontier task definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A queued unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrawlTask {
    /// Normalized URL to fetch
    pub url: String,

    /// Link distance from the seed that produced this task
    pub depth: u32,
}

impl CrawlTask {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

/// Heading texts grouped by level, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headings {
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
    pub h4: Vec<String>,
    pub h5: Vec<String>,
    pub h6: Vec<String>,
}

impl Headings {
    /// Returns the headings of a level between 1 and 6
    pub fn level(&self, level: u8) -> &[String] {
        match level {
            1 => &self.h1,
            2 => &self.h2,
            3 => &self.h3,
            4 => &self.h4,
            5 => &self.h5,
            6 => &self.h6,
            _ => &[],
        }
    }

    /// Appends a heading; levels outside 1..=6 are ignored
    pub fn push(&mut self, level: u8, text: String) {
        let slot = match level {
            1 => &mut self.h1,
            2 => &mut self.h2,
            3 => &mut self.h3,
            4 => &mut self.h4,
            5 => &mut self.h5,
            6 => &mut self.h6,
            _ => return,
        };
        slot.push(text);
    }

    pub fn is_empty(&self) -> bool {
        (1..=6).all(|level| self.level(level).is_empty())
    }
}

/// An image referenced by a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Absolute, normalized image URL
    pub url: String,

    /// Alt text (empty when the attribute is missing)
    pub alt: String,
}

/// Everything recorded about one fetched URL
///
/// A result is built by the worker that fetched the URL and is stored in the
/// crawl results exactly once; it is not modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// The URL that was requested (normalized)
    pub url: String,

    /// Depth of the task that produced this page
    pub depth: u32,

    /// Final HTTP status code, absent when no response was received
    pub status_code: Option<u16>,

    /// Wall time of the successful attempt, redirects included
    pub response_time_ms: u64,

    /// Content-Type header of the final response
    pub content_type: Option<String>,

    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub canonical: Option<String>,
    pub headings: Headings,

    /// Same-domain links, deduplicated, in document order
    pub internal_links: Vec<String>,

    /// Links to other domains, deduplicated, in document order
    pub external_links: Vec<String>,

    pub images: Vec<ImageRef>,

    /// Every redirect hop target, in order (at most 10 entries)
    pub redirect_chain: Vec<String>,

    /// Fetch error description, if the page could not be retrieved cleanly
    pub error: Option<String>,

    pub crawled_at: DateTime<Utc>,
}

impl PageResult {
    /// Creates an empty result for a URL, stamped with the current time
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: 0,
            status_code: None,
            response_time_ms: 0,
            content_type: None,
            title: None,
            meta_description: None,
            canonical: None,
            headings: Headings::default(),
            internal_links: Vec::new(),
            external_links: Vec::new(),
            images: Vec::new(),
            redirect_chain: Vec::new(),
            error: None,
            crawled_at: Utc::now(),
        }
    }

    /// Returns true for a clean 200 response
    pub fn is_ok(&self) -> bool {
        self.status_code == Some(200) && self.error.is_none()
    }

    /// Returns true if the response was (or may be) an HTML document
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            Some(content_type) => {
                let content_type = content_type.to_ascii_lowercase();
                content_type.contains("text/html") || content_type.contains("application/xhtml")
            }
            None => true,
        }
    }

    /// The URL the page content was actually served from
    pub fn final_url(&self) -> &str {
        self.redirect_chain.last().unwrap_or(&self.url)
    }

    /// Internal and external links, internal first
    pub fn all_links(&self) -> impl Iterator<Item = &String> {
        self.internal_links.iter().chain(self.external_links.iter())
    }
}
