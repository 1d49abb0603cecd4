use serde::Deserialize;

/// Main configuration structure for sitesearch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub morphology: MorphologyConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteEntry>,
}

impl Config {
    /// Finds the configured site whose root URL prefixes `url`
    pub fn find_site(&self, url: &str) -> Option<&SiteEntry> {
        crate::url::find_site_for_url(url, &self.sites)
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Size of the per-site worker pool
    #[serde(rename = "max-concurrent-pages-open")]
    pub max_concurrent_pages_open: u32,

    /// Lower bound of the politeness pause before each fetch (milliseconds)
    #[serde(rename = "min-delay-ms", default = "default_min_delay")]
    pub min_delay_ms: u64,

    /// Upper bound of the politeness pause before each fetch (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_min_delay() -> u64 {
    200
}

fn default_max_delay() -> u64 {
    500
}

fn default_request_timeout() -> u64 {
    30
}

/// HTTP identity used by the fetcher
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Value of the User-Agent header
    pub agent: String,

    /// Value of the Referer header
    pub referrer: String,
}

/// Which fetched pages are worth indexing
#[derive(Debug, Clone, Deserialize)]
pub struct IndexingConfig {
    /// HTTP status codes that mark a page as indexable
    #[serde(rename = "valid-status-codes", default = "default_valid_codes")]
    pub valid_status_codes: Vec<u16>,
}

fn default_valid_codes() -> Vec<u16> {
    vec![200]
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            valid_status_codes: default_valid_codes(),
        }
    }
}

impl IndexingConfig {
    /// Returns true if pages fetched with `status` should be indexed
    pub fn is_valid_status(&self, status: u16) -> bool {
        self.valid_status_codes.contains(&status)
    }
}

/// Query-time tuning
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Lemmas present on more than this share of pages are ignored in queries
    #[serde(rename = "frequency-threshold-percent", default = "default_threshold")]
    pub frequency_threshold_percent: u8,

    /// Page size used when the caller gives no limit
    #[serde(rename = "default-limit", default = "default_limit")]
    pub default_limit: usize,
}

fn default_threshold() -> u8 {
    80
}

fn default_limit() -> usize {
    20
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            frequency_threshold_percent: default_threshold(),
            default_limit: default_limit(),
        }
    }
}

/// Morphological analyzer selection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MorphologyConfig {
    /// Word-form dictionary; the stemmer is used alone when absent
    #[serde(rename = "dictionary-path")]
    pub dictionary_path: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// One site the operator allows to be crawled
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Root URL, e.g. "https://example.com"
    pub url: String,

    /// Human readable name shown in statistics and search results
    pub name: String,
}
