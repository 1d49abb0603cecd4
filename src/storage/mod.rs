//! Storage module for the search index
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Site lifecycle and page persistence
//! - Lemma frequency counters and postings of the inverted index

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::SiteStatus;
use crate::SiteSearchError;
use chrono::DateTime;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage handle shared by crawl tasks, the indexer and the search engine
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SiteSearchError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SiteSearchError> {
    SqliteStorage::new(path)
}

/// Wraps a storage instance for sharing across tasks
pub fn share(storage: SqliteStorage) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Acquires the storage lock
pub fn lock_storage(storage: &SharedStorage) -> StorageResult<MutexGuard<'_, SqliteStorage>> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// Represents a site in the database
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    /// RFC 3339 timestamp of the last status change or page save
    pub status_time: String,
    pub last_error: Option<String>,
}

impl SiteRecord {
    /// Status time as milliseconds since the Unix epoch
    pub fn status_time_millis(&self) -> Option<i64> {
        DateTime::parse_from_rfc3339(&self.status_time)
            .ok()
            .map(|time| time.timestamp_millis())
    }
}

/// Represents a fetched page in the database
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub site_id: i64,
    /// Site-relative path, always starting with "/"
    pub path: String,
    /// HTTP status recorded for the page
    pub code: u16,
    /// Raw HTML, empty when the fetch was not accepted
    pub content: String,
}

/// Represents a lemma of one site
#[derive(Debug, Clone)]
pub struct LemmaRecord {
    pub id: i64,
    pub site_id: i64,
    pub lemma: String,
    /// Number of pages of the site with a posting for this lemma
    pub frequency: u32,
}

/// Represents one row of the inverted index
#[derive(Debug, Clone)]
pub struct PostingRecord {
    pub id: i64,
    pub page_id: i64,
    pub lemma_id: i64,
    pub rank: f64,
}
