use crate::url::domain::extract_root_domain;
use crate::url::matcher::matches_site_root;
use crate::UrlError;
use url::Url;

/// Returns true if `url` looks like a link the crawler may follow
///
/// Only absolute `http://`/`https://` URLs and site-relative URLs starting with `/`
/// qualify. Anything carrying a `#` fragment is rejected.
fn is_link_candidate(url: &str) -> bool {
    if url.contains('#') {
        return false;
    }
    url.starts_with("http://") || url.starts_with("https://") || is_site_relative(url)
}

fn is_site_relative(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//")
}

/// Checks whether a raw anchor points inside the site rooted at `root`
///
/// # Examples
///
/// ```
/// use sitesearch::url::is_internal_link;
///
/// assert!(is_internal_link("/news", "https://example.com"));
/// assert!(is_internal_link("https://example.com/news", "https://example.com"));
/// assert!(!is_internal_link("/news#top", "https://example.com"));
/// assert!(!is_internal_link("https://other.com/news", "https://example.com"));
/// ```
pub fn is_internal_link(url: &str, root: &str) -> bool {
    let url = url.trim();
    if !is_link_candidate(url) {
        return false;
    }
    is_site_relative(url) || matches_site_root(url, root)
}

/// Turns a raw anchor into a canonical absolute URL inside the site
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Reject fragments, foreign schemes and protocol-relative links
/// 3. Remove trailing slashes (a bare `/` stays the root)
/// 4. Rewrite `/path` to `root + /path`, and `/` to `root`
/// 5. Reject absolute URLs outside the site
///
/// # Arguments
///
/// * `url` - The anchor as found in the page
/// * `root` - Normalized site root, e.g. `https://example.com`
///
/// # Returns
///
/// * `Some(String)` - Absolute in-site URL without trailing slash
/// * `None` - The anchor is malformed, a fragment, or points elsewhere
///
/// # Examples
///
/// ```
/// use sitesearch::url::normalize_link;
///
/// let root = "https://example.com";
/// assert_eq!(normalize_link("/a/b/", root).as_deref(), Some("https://example.com/a/b"));
/// assert_eq!(normalize_link("/", root).as_deref(), Some("https://example.com"));
/// assert_eq!(normalize_link("https://other.com/a", root), None);
/// ```
pub fn normalize_link(url: &str, root: &str) -> Option<String> {
    let url = url.trim();
    if !is_link_candidate(url) {
        return None;
    }

    let url = match url.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    if url == "/" {
        return Some(root.to_string());
    }

    if is_site_relative(url) {
        return Some(format!("{}{}", root, url));
    }

    if matches_site_root(url, root) {
        return Some(url.to_string());
    }

    None
}

/// Returns the site-relative path of `url`, always starting with `/`
///
/// The root itself maps to `/`. A URL that is not under `root` falls back to the
/// part after its own scheme and authority.
///
/// # Examples
///
/// ```
/// use sitesearch::url::short_path;
///
/// let root = "https://example.com";
/// assert_eq!(short_path(root, root), "/");
/// assert_eq!(short_path("https://example.com/a/b", root), "/a/b");
/// ```
pub fn short_path(url: &str, root: &str) -> String {
    let url = url.trim();

    let rest = match url.strip_prefix(root) {
        Some(rest) if matches_site_root(url, root) => rest,
        _ => match extract_root_domain(url) {
            Some(origin) => url.get(origin.len()..).unwrap_or(""),
            None => url,
        },
    };

    let rest = rest.trim_end_matches('/');
    if rest.is_empty() {
        "/".to_string()
    } else if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    }
}

/// Validates a configured site root and strips its trailing slash
///
/// # Errors
///
/// * `UrlError::Parse` - not a URL, or it carries a fragment
/// * `UrlError::InvalidScheme` - scheme other than http/https
/// * `UrlError::MissingHost` - no host part
///
/// # Examples
///
/// ```
/// use sitesearch::url::normalize_root_url;
///
/// assert_eq!(normalize_root_url(" https://example.com/ ").unwrap(), "https://example.com");
/// assert!(normalize_root_url("ftp://example.com").is_err());
/// ```
pub fn normalize_root_url(url: &str) -> Result<String, UrlError> {
    let trimmed = url.trim();
    if trimmed.contains('#') {
        return Err(UrlError::Parse(format!("fragment not allowed: {}", trimmed)));
    }

    let parsed = Url::parse(trimmed).map_err(|e| UrlError::Parse(e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            parsed.scheme()
        )));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost(trimmed.to_string()));
    }

    Ok(trimmed.strip_suffix('/').unwrap_or(trimmed).to_string())
}
