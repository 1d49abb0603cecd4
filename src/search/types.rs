use serde::Serialize;

/// One ranked page of a search response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchItem {
    /// Root URL of the page's site
    pub site: String,

    #[serde(rename = "siteName")]
    pub site_name: String,

    /// Site-relative path of the page
    pub uri: String,

    pub title: String,

    /// Text around the matches, with matched words wrapped in `<b>`
    pub snippet: String,

    /// Relevance relative to the best result, in (0, 1]
    pub relevance: f64,
}

/// A page of search results
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    /// Number of matching pages before pagination
    pub count: usize,
    pub data: Vec<SearchItem>,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self::default()
    }
}
