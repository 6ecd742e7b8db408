//! Sitemap seeding module
//!
//! Discovers a site's sitemaps (robots.txt `Sitemap:` lines, falling back to
//! `/sitemap.xml`), walks sitemap indexes and turns the listed pages into
//! extra seed URLs for the frontier.

mod seeder;

pub use seeder::{SitemapSeeder, MAX_SITEMAPS};

use sitemap::reader::{SiteMapEntity, SiteMapReader};
use std::io::Cursor;

/// Entries of one sitemap document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    /// Page URLs (`<urlset><url><loc>`)
    pub urls: Vec<String>,

    /// Nested sitemap URLs (`<sitemapindex><sitemap><loc>`)
    pub sitemaps: Vec<String>,
}

/// Parses sitemap XML
///
/// Entries without a valid `<loc>` are skipped; malformed XML yields whatever
/// entries were read before the error.
pub fn parse_sitemap_xml(xml: &[u8]) -> SitemapDocument {
    let mut document = SitemapDocument::default();

    for entity in SiteMapReader::new(Cursor::new(xml)) {
        match entity {
            SiteMapEntity::Url(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    document.urls.push(url.to_string());
                }
            }
            SiteMapEntity::SiteMap(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    document.sitemaps.push(url.to_string());
                }
            }
            SiteMapEntity::Err(error) => {
                tracing::debug!(error = %error, "Skipping sitemap entry");
            }
        }
    }

    document
}
