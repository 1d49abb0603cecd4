use url::Url;

/// Extracts the `scheme://host[:port]` part of an absolute URL
///
/// The default port of the scheme is omitted and the host is lowercased.
/// Returns `None` for relative or non-HTTP URLs.
///
/// # Examples
///
/// ```
/// use sitesearch::url::extract_root_domain;
///
/// assert_eq!(
///     extract_root_domain("https://Example.com/a/b").as_deref(),
///     Some("https://example.com")
/// );
/// assert_eq!(
///     extract_root_domain("http://127.0.0.1:8080/x").as_deref(),
///     Some("http://127.0.0.1:8080")
/// );
/// assert_eq!(extract_root_domain("/relative"), None);
/// ```
pub fn extract_root_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }
    parsed.host_str()?;
    Some(parsed.origin().ascii_serialization())
}
