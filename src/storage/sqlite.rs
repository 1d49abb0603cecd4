//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::SiteStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{LemmaRecord, PageRecord, PostingRecord, SiteRecord};
use crate::SiteSearchError;
use chrono::Utc;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

const SITE_COLUMNS: &str = "id, url, name, status, status_time, last_error";
const PAGE_COLUMNS: &str = "id, site_id, path, code, content";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SiteSearchError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SiteSearchError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SiteSearchError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
    Ok(SiteRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        status: SiteStatus::from_db_string(&row.get::<_, String>(3)?).unwrap_or(SiteStatus::Failed),
        status_time: row.get(4)?,
        last_error: row.get(5)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        path: row.get(2)?,
        code: row.get(3)?,
        content: row.get(4)?,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

impl Storage for SqliteStorage {
    // ===== Site Management =====

    fn create_site(&mut self, url: &str, name: &str, status: SiteStatus) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO site (url, name, status, status_time) VALUES (?1, ?2, ?3, ?4)",
                params![url, name, status.to_db_string(), now],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StorageError::ConstraintViolation(format!("site already exists: {}", url))
                } else {
                    e.into()
                }
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM site WHERE id = ?1", SITE_COLUMNS),
                params![site_id],
                site_from_row,
            )
            .optional()?
            .ok_or(StorageError::SiteNotFound(site_id))
    }

    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let site = self
            .conn
            .query_row(
                &format!("SELECT {} FROM site WHERE url = ?1", SITE_COLUMNS),
                params![url],
                site_from_row,
            )
            .optional()?;
        Ok(site)
    }

    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM site ORDER BY id", SITE_COLUMNS))?;
        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE site SET status = ?1, last_error = ?2, status_time = ?3 WHERE id = ?4",
            params![status.to_db_string(), last_error, now, site_id],
        )?;
        if updated == 0 {
            return Err(StorageError::SiteNotFound(site_id));
        }
        Ok(())
    }

    fn touch_site(&mut self, site_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE site SET status_time = ?1 WHERE id = ?2",
            params![now, site_id],
        )?;
        Ok(())
    }

    fn delete_site(&mut self, site_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM site WHERE id = ?1", params![site_id])?;
        Ok(())
    }

    // ===== Page Management =====

    fn find_page_by_site_and_path(
        &self,
        site_id: i64,
        path: &str,
    ) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM page WHERE site_id = ?1 AND path = ?2",
                    PAGE_COLUMNS
                ),
                params![site_id, path],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn insert_page(
        &mut self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
    ) -> StorageResult<i64> {
        self.conn
            .execute(
                "INSERT INTO page (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)",
                params![site_id, path, code, content],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StorageError::ConstraintViolation(format!(
                        "page {} already exists for site {}",
                        path, site_id
                    ))
                } else {
                    e.into()
                }
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM page WHERE id = ?1", PAGE_COLUMNS),
                params![page_id],
                page_from_row,
            )
            .optional()?
            .ok_or(StorageError::PageNotFound(page_id))
    }

    fn list_pages(&self, site_id: i64) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM page WHERE site_id = ?1 ORDER BY id",
            PAGE_COLUMNS
        ))?;
        let pages = stmt
            .query_map(params![site_id], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    fn delete_page(&mut self, page_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM page WHERE id = ?1", params![page_id])?;
        Ok(())
    }

    fn count_pages(&self, site_id: Option<i64>) -> StorageResult<u64> {
        let count: i64 = match site_id {
            Some(id) => self.conn.query_row(
                "SELECT COUNT(*) FROM page WHERE site_id = ?1",
                params![id],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM page", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }

    // ===== Lemmas and Postings =====

    fn find_lemma(&self, site_id: i64, lemma: &str) -> StorageResult<Option<LemmaRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, site_id, lemma, frequency FROM lemma WHERE site_id = ?1 AND lemma = ?2",
                params![site_id, lemma],
                |row| {
                    Ok(LemmaRecord {
                        id: row.get(0)?,
                        site_id: row.get(1)?,
                        lemma: row.get(2)?,
                        frequency: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn count_lemmas(&self, site_id: Option<i64>) -> StorageResult<u64> {
        let count: i64 = match site_id {
            Some(id) => self.conn.query_row(
                "SELECT COUNT(*) FROM lemma WHERE site_id = ?1",
                params![id],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM lemma", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }

    fn lemma_document_frequency(
        &self,
        lemma: &str,
        site_id: Option<i64>,
    ) -> StorageResult<Option<u64>> {
        // SUM over zero rows yields NULL, which maps to None
        let frequency: Option<i64> = match site_id {
            Some(id) => self.conn.query_row(
                "SELECT SUM(frequency) FROM lemma WHERE lemma = ?1 AND site_id = ?2",
                params![lemma, id],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                "SELECT SUM(frequency) FROM lemma WHERE lemma = ?1",
                params![lemma],
                |row| row.get(0),
            )?,
        };
        Ok(frequency.map(|f| f.max(0) as u64))
    }

    fn page_ids_for_lemma(&self, lemma: &str, site_id: Option<i64>) -> StorageResult<Vec<i64>> {
        let ids = match site_id {
            Some(id) => {
                let mut stmt = self.conn.prepare(
                    "SELECT p.page_id FROM posting p JOIN lemma l ON l.id = p.lemma_id
                     WHERE l.lemma = ?1 AND l.site_id = ?2 ORDER BY p.page_id",
                )?;
                let rows = stmt
                    .query_map(params![lemma, id], |row| row.get(0))?
                    .collect::<Result<Vec<i64>, _>>()?;
                rows
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT p.page_id FROM posting p JOIN lemma l ON l.id = p.lemma_id
                     WHERE l.lemma = ?1 ORDER BY p.page_id",
                )?;
                let rows = stmt
                    .query_map(params![lemma], |row| row.get(0))?
                    .collect::<Result<Vec<i64>, _>>()?;
                rows
            }
        };
        Ok(ids)
    }

    fn postings_for_page(&self, page_id: i64) -> StorageResult<Vec<PostingRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, page_id, lemma_id, rank FROM posting WHERE page_id = ?1 ORDER BY id",
        )?;
        let postings = stmt
            .query_map(params![page_id], |row| {
                Ok(PostingRecord {
                    id: row.get(0)?,
                    page_id: row.get(1)?,
                    lemma_id: row.get(2)?,
                    rank: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(postings)
    }

    fn rank_sum(&self, page_id: i64, lemmas: &[String]) -> StorageResult<f64> {
        if lemmas.is_empty() {
            return Ok(0.0);
        }

        let placeholders = (0..lemmas.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT COALESCE(SUM(p.rank), 0.0) FROM posting p JOIN lemma l ON l.id = p.lemma_id
             WHERE p.page_id = ?1 AND l.lemma IN ({})",
            placeholders
        );

        let mut values: Vec<&dyn ToSql> = Vec::with_capacity(lemmas.len() + 1);
        values.push(&page_id);
        for lemma in lemmas {
            values.push(lemma);
        }

        let sum: f64 = self
            .conn
            .query_row(&sql, values.as_slice(), |row| row.get(0))?;
        Ok(sum)
    }

    // ===== Index Maintenance =====

    fn save_page_index(
        &mut self,
        site_id: i64,
        page_id: i64,
        lemmas: &HashMap<String, u32>,
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        for (lemma, count) in lemmas {
            tx.execute(
                "INSERT INTO lemma (site_id, lemma, frequency) VALUES (?1, ?2, 1)
                 ON CONFLICT(site_id, lemma) DO UPDATE SET frequency = frequency + 1",
                params![site_id, lemma],
            )?;
            let lemma_id: i64 = tx.query_row(
                "SELECT id FROM lemma WHERE site_id = ?1 AND lemma = ?2",
                params![site_id, lemma],
                |row| row.get(0),
            )?;
            tx.execute(
                "INSERT INTO posting (page_id, lemma_id, rank) VALUES (?1, ?2, ?3)",
                params![page_id, lemma_id, f64::from(*count)],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StorageError::ConstraintViolation(format!(
                        "page {} is already indexed for lemma {}",
                        page_id, lemma
                    ))
                } else {
                    e.into()
                }
            })?;
        }

        tx.commit()?;
        Ok(())
    }

    fn delete_page_index(&mut self, page_id: i64) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "UPDATE lemma SET frequency = MAX(frequency - 1, 0)
             WHERE id IN (SELECT lemma_id FROM posting WHERE page_id = ?1)",
            params![page_id],
        )?;
        tx.execute("DELETE FROM posting WHERE page_id = ?1", params![page_id])?;
        tx.execute("DELETE FROM lemma WHERE frequency <= 0", [])?;

        tx.commit()?;
        Ok(())
    }
}
