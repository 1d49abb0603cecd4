//! sitesearch: a scoped search engine over a configured list of websites
//!
//! This crate crawls whitelisted sites, lemmatizes the text of every page, keeps an
//! inverted index of lemma postings in SQLite, and answers ranked full-text queries
//! with highlighted snippets.

pub mod config;
pub mod crawler;
pub mod indexing;
pub mod morphology;
pub mod output;
pub mod search;
pub mod service;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for sitesearch operations
#[derive(Debug, Error)]
pub enum SiteSearchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Indexing error: {0}")]
    Indexing(#[from] indexing::IndexingError),

    #[error("Search error: {0}")]
    Search(#[from] search::SearchError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Morphology error: {0}")]
    Morphology(#[from] morphology::MorphologyError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Site is not configured: {0}")]
    UnknownSite(String),

    #[error("Site is being indexed: {0}")]
    SiteBusy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for sitesearch operations
pub type Result<T> = std::result::Result<T, SiteSearchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use service::{IndexingService, ServiceResponse};
pub use state::{SiteStatus, TaskOutcome};
pub use url::{is_internal_link, normalize_link, short_path};
