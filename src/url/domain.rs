use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// The port is not part of the domain.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_crawler::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM:8080/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}

/// Checks whether two URLs belong to the same site
///
/// Hosts are compared case-insensitively and a leading `www.` is ignored on
/// both sides, so `www.example.com` and `example.com` are the same domain.
/// Subdomains other than `www` are different domains.
pub fn is_same_domain(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(a), Some(b)) => strip_www(&a) == strip_www(&b),
        _ => false,
    }
}

fn strip_www(domain: &str) -> &str {
    domain.strip_prefix("www.").unwrap_or(domain)
}

/// Resolves an href found on a page against the page URL
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs (same page anchors)
/// - javascript:, mailto:, tel: and data: schemes
/// - hrefs that do not resolve to an HTTP(S) URL
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}
