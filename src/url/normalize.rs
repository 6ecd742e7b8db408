use crate::{UrlError, UrlResult};
use url::Url;

/// Query parameters that only carry campaign tracking data
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "msclkid"];

/// Normalizes a URL into the canonical form used for deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https` schemes; require a host
/// 3. Lowercase the host (default ports are dropped by the parser)
/// 4. Normalize path:
///    - Remove dot segments (. and ..) and empty segments
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 5. Remove fragment (everything after #)
/// 6. Remove tracking query parameters (`utm_*`, click identifiers)
/// 7. Sort remaining query parameters by key (stable for repeated keys)
/// 8. Remove empty query string (trailing ?)
///
/// Normalization is idempotent: normalizing an already normalized URL
/// returns the same URL.
///
/// # Examples
///
/// ```
/// use seo_crawler::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.COM/page/?b=2&a=1#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/page?a=1&b=2");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_lowercase(),
        _ => return Err(UrlError::MissingDomain),
    };
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params.iter());
        }
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
