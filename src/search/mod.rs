//! Ranked full-text search over the lemma index
//!
//! This module handles:
//! - Lemmatizing queries the same way page text is lemmatized
//! - Pruning lemmas that occur on too many pages
//! - AND-intersection of page sets and relevance ranking
//! - Titles and highlighted snippets of the results

mod engine;
mod snippet;
mod types;

pub use engine::SearchEngine;
pub use snippet::{build_snippet, MAX_SNIPPET_LENGTH, OFFSET_AFTER, OFFSET_BEFORE};
pub use types::{SearchItem, SearchResults};

use crate::storage::StorageError;
use thiserror::Error;

/// Errors returned to search callers
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Empty search query")]
    EmptyQuery,

    #[error("Site is not indexed: {0}")]
    UnknownSite(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;
