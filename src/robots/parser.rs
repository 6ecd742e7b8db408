//! Robots.txt parser implementation
//!
//! Rule matching is delegated to the robotstxt crate (Google's matcher).

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// Raw robots.txt content
    content: String,
    /// Skip matching entirely
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used when robots.txt is missing or cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns true if this instance allows every URL without matching
    pub fn is_allow_all(&self) -> bool {
        self.allow_all || self.content.trim().is_empty()
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The URL (or path) to check
    /// * `user_agent` - The user agent product token (e.g. "SEOCrawler")
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.is_allow_all() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Returns the sitemap URLs declared with `Sitemap:` lines
    pub fn sitemaps(&self) -> Vec<String> {
        self.content
            .lines()
            .filter_map(|line| {
                let line = line.split('#').next().unwrap_or("").trim();
                let (key, value) = line.split_once(':')?;
                if !key.trim().eq_ignore_ascii_case("sitemap") {
                    return None;
                }
                let value = value.trim();
                (!value.is_empty()).then(|| value.to_string())
            })
            .collect()
    }
}
