use crate::config::SiteEntry;

/// Checks if an absolute URL lies under a site root
///
/// The URL must start with `root` and the match must end on a path, query or
/// string boundary, so `https://example.com` does not claim
/// `https://example.company`.
///
/// # Examples
///
/// ```
/// use sitesearch::url::matches_site_root;
///
/// assert!(matches_site_root("https://example.com", "https://example.com"));
/// assert!(matches_site_root("https://example.com/a", "https://example.com"));
/// assert!(!matches_site_root("https://example.company/a", "https://example.com"));
/// ```
pub fn matches_site_root(url: &str, root: &str) -> bool {
    if root.is_empty() {
        return false;
    }
    match url.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

/// Finds the configured site that owns `url`
///
/// When several roots match (e.g. `https://a.com` and `https://a.com/blog`), the
/// longest one wins.
pub fn find_site_for_url<'a>(url: &str, sites: &'a [SiteEntry]) -> Option<&'a SiteEntry> {
    let url = url.trim();
    sites
        .iter()
        .filter(|site| matches_site_root(url, &site.url))
        .max_by_key(|site| site.url.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites() -> Vec<SiteEntry> {
        vec![
            SiteEntry {
                url: "https://a.com".to_string(),
                name: "A".to_string(),
            },
            SiteEntry {
                url: "https://a.com/blog".to_string(),
                name: "A Blog".to_string(),
            },
            SiteEntry {
                url: "http://b.org".to_string(),
                name: "B".to_string(),
            },
        ]
    }

    #[test]
    fn test_exact_root_matches() {
        assert!(matches_site_root("https://a.com", "https://a.com"));
    }

    #[test]
    fn test_prefix_must_end_on_boundary() {
        assert!(matches_site_root("https://a.com/x", "https://a.com"));
        assert!(matches_site_root("https://a.com?x=1", "https://a.com"));
        assert!(!matches_site_root("https://a.community/x", "https://a.com"));
        assert!(!matches_site_root("http://a.com/x", "https://a.com"));
    }

    #[test]
    fn test_empty_root_never_matches() {
        assert!(!matches_site_root("https://a.com", ""));
    }

    #[test]
    fn test_find_site_longest_root_wins() {
        let sites = sites();
        assert_eq!(
            find_site_for_url("https://a.com/blog/post", &sites).map(|s| s.name.as_str()),
            Some("A Blog")
        );
        assert_eq!(
            find_site_for_url("https://a.com/about", &sites).map(|s| s.name.as_str()),
            Some("A")
        );
    }

    #[test]
    fn test_find_site_unknown() {
        let sites = sites();
        assert!(find_site_for_url("https://c.net/", &sites).is_none());
        assert!(find_site_for_url("https://b.org/", &sites).is_none());
    }
}
