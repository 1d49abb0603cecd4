//! Indexing pipeline: pages in, lemmas and postings out
//!
//! For every stored page with an indexable HTTP status the pipeline strips the
//! markup, counts lemmas with the [`Lemmatizer`], and writes the counts through
//! [`Storage::save_page_index`]. Each page is written in its own transaction
//! while holding the shared storage lock. A tripped [`StopSignal`] ends the pass
//! before the next page.

use crate::config::IndexingConfig;
use crate::crawler::{html_to_text, StopSignal};
use crate::morphology::Lemmatizer;
use crate::storage::{lock_storage, PageRecord, SharedStorage, Storage, StorageError};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors returned by the indexing pipeline
#[derive(Debug, Error)]
pub enum IndexingError {
    #[error("Site {0} does not exist")]
    MissingSite(i64),

    #[error("Page {page_id} belongs to site {actual}, not {expected}")]
    ForeignPage {
        page_id: i64,
        expected: i64,
        actual: i64,
    },

    #[error("Indexing was stopped")]
    Stopped,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for indexing operations
pub type IndexingResult<T> = Result<T, IndexingError>;

/// Totals of one indexing pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Pages that produced postings
    pub pages_indexed: usize,
    /// Pages skipped because their status is not indexable
    pub pages_skipped: usize,
    /// Postings written
    pub postings: usize,
}

/// Writes lemma counters and postings for stored pages
#[derive(Clone)]
pub struct Indexer {
    storage: SharedStorage,
    lemmatizer: Lemmatizer,
    valid_status_codes: Arc<[u16]>,
}

impl Indexer {
    pub fn new(storage: SharedStorage, lemmatizer: Lemmatizer, config: &IndexingConfig) -> Self {
        Self {
            storage,
            lemmatizer,
            valid_status_codes: Arc::from(config.valid_status_codes.as_slice()),
        }
    }

    pub fn lemmatizer(&self) -> &Lemmatizer {
        &self.lemmatizer
    }

    /// Lemma counts of a page's visible text
    pub fn page_lemmas(&self, html: &str) -> HashMap<String, u32> {
        self.lemmatizer.lemmas_with_counts(&html_to_text(html))
    }

    /// Indexes every stored page of a site
    pub fn index_site(&self, site_id: i64, stop: &StopSignal) -> IndexingResult<IndexStats> {
        let pages = {
            let storage = lock_storage(&self.storage)?;
            self.ensure_site(&*storage, site_id)?;
            storage.list_pages(site_id)?
        };
        info!("Indexing {} pages of site {}", pages.len(), site_id);
        self.index_pages(site_id, &pages, stop)
    }

    /// Indexes the given pages of one site
    ///
    /// Pages whose status is not in the valid set are skipped. Callers remove a
    /// page's previous postings with [`Indexer::delete_page_index`] before
    /// indexing it again. Returns [`IndexingError::Stopped`] once `stop` is
    /// tripped; pages written before that keep their postings.
    pub fn index_pages(
        &self,
        site_id: i64,
        pages: &[PageRecord],
        stop: &StopSignal,
    ) -> IndexingResult<IndexStats> {
        {
            let storage = lock_storage(&self.storage)?;
            self.ensure_site(&*storage, site_id)?;
        }

        let mut stats = IndexStats::default();
        for page in pages {
            if stop.is_tripped() {
                info!(
                    "Indexing of site {} stopped after {} pages",
                    site_id, stats.pages_indexed
                );
                return Err(IndexingError::Stopped);
            }
            match self.index_page(site_id, page)? {
                Some(postings) => {
                    stats.pages_indexed += 1;
                    stats.postings += postings;
                }
                None => stats.pages_skipped += 1,
            }
        }

        info!(
            "Site {}: {} pages indexed, {} skipped, {} postings",
            site_id, stats.pages_indexed, stats.pages_skipped, stats.postings
        );
        Ok(stats)
    }

    /// Indexes one page; returns the number of postings written, or None if the
    /// page status is not indexable
    pub fn index_page(&self, site_id: i64, page: &PageRecord) -> IndexingResult<Option<usize>> {
        if page.site_id != site_id {
            return Err(IndexingError::ForeignPage {
                page_id: page.id,
                expected: site_id,
                actual: page.site_id,
            });
        }

        if !self.valid_status_codes.contains(&page.code) {
            debug!("Skipping {} with status {}", page.path, page.code);
            return Ok(None);
        }

        let lemmas = self.page_lemmas(&page.content);

        let mut storage = lock_storage(&self.storage)?;
        storage.save_page_index(site_id, page.id, &lemmas)?;
        debug!("Indexed {} with {} lemmas", page.path, lemmas.len());
        Ok(Some(lemmas.len()))
    }

    /// Removes a page's postings and decrements its lemma frequencies
    pub fn delete_page_index(&self, page_id: i64) -> IndexingResult<()> {
        let mut storage = lock_storage(&self.storage)?;
        storage.delete_page_index(page_id)?;
        Ok(())
    }

    fn ensure_site<S: Storage>(&self, storage: &S, site_id: i64) -> IndexingResult<()> {
        match storage.get_site(site_id) {
            Ok(_) => Ok(()),
            Err(StorageError::SiteNotFound(_)) => Err(IndexingError::MissingSite(site_id)),
            Err(e) => Err(e.into()),
        }
    }
}
