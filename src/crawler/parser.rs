//! HTML parser for extracting SEO data and links
//!
//! This module handles parsing HTML content to extract:
//! - Page title, meta description and canonical URL
//! - Headings (h1 through h6)
//! - Links to follow, split into internal and external
//! - Images with their alt text
//!
//! Parsing is a pure function of the HTML text and the page URL.

use crate::state::{Headings, ImageRef, PageResult};
use crate::url::{is_same_domain, normalize_url, resolve_url};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPage {
    /// The page title (from the first <title> tag)
    pub title: Option<String>,

    pub meta_description: Option<String>,

    /// Absolute canonical URL (raw href when it cannot be resolved)
    pub canonical: Option<String>,

    pub headings: Headings,

    /// Normalized links on the page's domain, in document order
    pub internal_links: Vec<String>,

    /// Normalized links to other domains, in document order
    pub external_links: Vec<String>,

    /// Images deduplicated by normalized URL
    pub images: Vec<ImageRef>,
}

impl ParsedPage {
    /// Moves the extracted fields into a page result
    pub fn apply(self, page: &mut PageResult) {
        page.title = self.title;
        page.meta_description = self.meta_description;
        page.canonical = self.canonical;
        page.headings = self.headings;
        page.internal_links = self.internal_links;
        page.external_links = self.external_links;
        page.images = self.images;
    }
}

/// Parses HTML content and extracts SEO fields and links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anchors anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links (same page anchors)
/// - Anything that is not http/https after resolution
///
/// Links are resolved against `base_url`, normalized, deduplicated and
/// classified as internal when they share the base URL's domain.
///
/// # Example
///
/// ```
/// use seo_crawler::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.internal_links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);
    let (internal_links, external_links) = extract_links(&document, base_url);

    ParsedPage {
        title: extract_title(&document),
        meta_description: extract_meta_description(&document),
        canonical: extract_canonical(&document, base_url),
        headings: extract_headings(&document),
        internal_links,
        external_links,
        images: extract_images(&document, base_url),
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Joins the element's text nodes and collapses runs of whitespace
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = selector("title")?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element_text(&element))
        .filter(|s| !s.is_empty())
}

fn extract_meta_description(document: &Html) -> Option<String> {
    let meta_selector = selector("meta[name][content]")?;

    document
        .select(&meta_selector)
        .find(|element| {
            element
                .value()
                .attr("name")
                .map_or(false, |name| name.trim().eq_ignore_ascii_case("description"))
        })
        .and_then(|element| element.value().attr("content"))
        .and_then(non_empty)
}

fn extract_canonical(document: &Html, base_url: &Url) -> Option<String> {
    let link_selector = selector("link[rel][href]")?;

    let href = document
        .select(&link_selector)
        .find(|element| {
            element.value().attr("rel").map_or(false, |rel| {
                rel.split_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("canonical"))
            })
        })
        .and_then(|element| element.value().attr("href"))
        .and_then(non_empty)?;

    match base_url.join(&href) {
        Ok(absolute) => Some(absolute.to_string()),
        Err(_) => Some(href),
    }
}

fn extract_headings(document: &Html) -> Headings {
    let mut headings = Headings::default();
    let Some(heading_selector) = selector("h1, h2, h3, h4, h5, h6") else {
        return headings;
    };

    for element in document.select(&heading_selector) {
        let level = match element.value().name() {
            "h1" => 1,
            "h2" => 2,
            "h3" => 3,
            "h4" => 4,
            "h5" => 5,
            "h6" => 6,
            _ => continue,
        };

        let text = element_text(&element);
        if !text.is_empty() {
            headings.push(level, text);
        }
    }

    headings
}

/// Resolves an href and normalizes the result
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let absolute = resolve_url(base_url, href)?;
    normalize_url(absolute.as_str()).ok()
}

/// Extracts anchors, split into (internal, external)
fn extract_links(document: &Html, base_url: &Url) -> (Vec<String>, Vec<String>) {
    let mut internal = Vec::new();
    let mut external = Vec::new();
    let mut seen = HashSet::new();

    let Some(a_selector) = selector("a[href]") else {
        return (internal, external);
    };

    for element in document.select(&a_selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(link) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url))
        else {
            continue;
        };

        let link_str = link.to_string();
        if !seen.insert(link_str.clone()) {
            continue;
        }

        if is_same_domain(&link, base_url) {
            internal.push(link_str);
        } else {
            external.push(link_str);
        }
    }

    (internal, external)
}

fn extract_images(document: &Html, base_url: &Url) -> Vec<ImageRef> {
    let mut images = Vec::new();
    let mut seen = HashSet::new();

    let Some(img_selector) = selector("img[src]") else {
        return images;
    };

    for element in document.select(&img_selector) {
        let Some(url) = element
            .value()
            .attr("src")
            .and_then(|src| resolve_link(src, base_url))
        else {
            continue;
        };

        let url = url.to_string();
        if seen.insert(url.clone()) {
            let alt = element.value().attr("alt").unwrap_or("").trim().to_string();
            images.push(ImageRef { url, alt });
        }
    }

    images
}
