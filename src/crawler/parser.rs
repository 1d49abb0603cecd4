//! HTML parser for extracting links, title and text
//!
//! Links are returned exactly as written in the `href` attribute; turning them
//! into in-site URLs is the job of [`crate::url::normalize_links`].

use scraper::{Html, Node, Selector};

/// Elements whose text never reaches the index
const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Raw `href` values of every `<a>` element, in document order
    pub hrefs: Vec<String>,
}

/// Parses HTML content and extracts the title and anchor targets
///
/// Anchors carrying a `download` attribute are skipped.
///
/// # Example
///
/// ```
/// use sitesearch::crawler::parse_html;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.hrefs, vec!["/page".to_string()]);
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        hrefs: extract_hrefs(&document),
    }
}

/// Returns the trimmed `<title>` of a page, if any
pub fn page_title(html: &str) -> Option<String> {
    extract_title(&Html::parse_document(html))
}

/// Strips markup and returns the visible text of a page
///
/// Text nodes are trimmed and joined with single spaces. Content of `<head>`,
/// `<script>`, `<style>`, `<noscript>` and `<template>` is dropped.
///
/// # Example
///
/// ```
/// use sitesearch::crawler::html_to_text;
///
/// let html = "<html><head><title>T</title></head><body><p>Кот</p><script>x()</script><p>сидит</p></body></html>";
/// assert_eq!(html_to_text(html), "Кот сидит");
/// ```
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();

    for node in document.tree.nodes() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            matches!(ancestor.value(), Node::Element(element) if HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join(" ")
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_hrefs(document: &Html) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}
