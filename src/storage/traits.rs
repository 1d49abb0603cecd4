//! Storage traits and error types
//!
//! This module defines the repository interface for storage backends and
//! associated error types.

use crate::state::SiteStatus;
use crate::storage::{LemmaRecord, PageRecord, PostingRecord, SiteRecord};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Site not found: {0}")]
    SiteNotFound(i64),

    #[error("Page not found: {0}")]
    PageNotFound(i64),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every query the crawler, indexer and search engine need is a named method here.
/// Writes take `&mut self`; callers share one instance behind a mutex.
pub trait Storage {
    // ===== Site Management =====

    /// Creates a site row and returns its ID
    fn create_site(&mut self, url: &str, name: &str, status: SiteStatus) -> StorageResult<i64>;

    /// Gets a site by ID
    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord>;

    /// Gets a site by its normalized root URL
    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>>;

    /// Lists every stored site
    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>>;

    /// Sets the status and last error of a site and refreshes its status time
    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> StorageResult<()>;

    /// Refreshes the status time of a site without changing its status
    fn touch_site(&mut self, site_id: i64) -> StorageResult<()>;

    /// Deletes a site together with its pages, lemmas and postings
    fn delete_site(&mut self, site_id: i64) -> StorageResult<()>;

    // ===== Page Management =====

    /// Finds a page by its site and site-relative path
    fn find_page_by_site_and_path(
        &self,
        site_id: i64,
        path: &str,
    ) -> StorageResult<Option<PageRecord>>;

    /// Inserts a new page and returns its ID
    ///
    /// Fails with `ConstraintViolation` if the (site, path) pair already exists.
    fn insert_page(
        &mut self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
    ) -> StorageResult<i64>;

    /// Gets a page by ID
    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord>;

    /// Lists the pages of a site in insertion order
    fn list_pages(&self, site_id: i64) -> StorageResult<Vec<PageRecord>>;

    /// Deletes a page row; its postings go with it
    ///
    /// Lemma frequencies are not touched here, see `delete_page_index`.
    fn delete_page(&mut self, page_id: i64) -> StorageResult<()>;

    /// Counts pages of one site, or of all sites when `site_id` is None
    fn count_pages(&self, site_id: Option<i64>) -> StorageResult<u64>;

    // ===== Lemmas and Postings =====

    /// Finds a lemma row of a site
    fn find_lemma(&self, site_id: i64, lemma: &str) -> StorageResult<Option<LemmaRecord>>;

    /// Counts lemmas of one site, or of all sites when `site_id` is None
    fn count_lemmas(&self, site_id: Option<i64>) -> StorageResult<u64>;

    /// Returns the number of pages containing `lemma`
    ///
    /// Scoped to one site, or summed over all sites when `site_id` is None.
    /// Returns None when the lemma is unknown in that scope.
    fn lemma_document_frequency(
        &self,
        lemma: &str,
        site_id: Option<i64>,
    ) -> StorageResult<Option<u64>>;

    /// Returns the IDs of pages that have a posting for `lemma`
    fn page_ids_for_lemma(&self, lemma: &str, site_id: Option<i64>) -> StorageResult<Vec<i64>>;

    /// Returns all postings of a page
    fn postings_for_page(&self, page_id: i64) -> StorageResult<Vec<PostingRecord>>;

    /// Sums the ranks of a page's postings whose lemma is in `lemmas`
    fn rank_sum(&self, page_id: i64, lemmas: &[String]) -> StorageResult<f64>;

    // ===== Index Maintenance =====

    /// Writes the lemma counts of one page in a single transaction
    ///
    /// Every lemma is created with frequency 1 or has its frequency incremented,
    /// then one posting per lemma is written with `rank` = count.
    fn save_page_index(
        &mut self,
        site_id: i64,
        page_id: i64,
        lemmas: &HashMap<String, u32>,
    ) -> StorageResult<()>;

    /// Removes a page's postings in a single transaction
    ///
    /// The frequency of every referenced lemma is decremented, floored at zero,
    /// and lemmas reaching zero are deleted.
    fn delete_page_index(&mut self, page_id: i64) -> StorageResult<()>;
}
