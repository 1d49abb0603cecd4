//! URL handling module for sitesearch
//!
//! Pure functions that turn raw anchors found in pages into canonical absolute
//! in-site URLs, derive site-relative paths for storage, and map URLs back to the
//! configured site that owns them.

mod domain;
mod matcher;
mod normalize;

pub use domain::extract_root_domain;
pub use matcher::{find_site_for_url, matches_site_root};
pub use normalize::{is_internal_link, normalize_link, normalize_root_url, short_path};

/// Normalizes every internal anchor in `links`, dropping the rest
///
/// Order of first appearance is kept and duplicates are removed.
pub fn normalize_links<'a, I>(links: I, root: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    links
        .into_iter()
        .filter(|link| is_internal_link(link, root))
        .filter_map(|link| normalize_link(link, root))
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_links_filters_and_dedups() {
        let root = "https://example.com";
        let raw = vec![
            "/a",
            "/a/",
            "https://example.com/a",
            "#top",
            "https://other.com/",
            "/b",
            "mailto:x@example.com",
        ];
        assert_eq!(
            normalize_links(raw, root),
            vec![
                "https://example.com/a".to_string(),
                "https://example.com/b".to_string()
            ]
        );
    }

    #[test]
    fn test_normalize_links_empty() {
        assert!(normalize_links(Vec::<&str>::new(), "https://example.com").is_empty());
    }
}
