//! Crawler coordinator - per-site crawl orchestration
//!
//! This module contains the crawl task run for every URL of a site and the
//! coordinator that drives one job per configured site:
//! - Resetting the site row and registering the job with the monitor
//! - Running crawl tasks on the bounded pool until it drains
//! - Indexing the persisted pages
//! - Turning the outcome into the final site status

use crate::config::{Config, SiteEntry};
use crate::crawler::fetcher::{FetchOutcome, Fetcher};
use crate::crawler::frontier::DedupStore;
use crate::crawler::monitor::{JobMonitor, StopSignal};
use crate::crawler::scheduler::{PoolSummary, Scheduler, TaskReport};
use crate::indexing::{IndexStats, Indexer, IndexingError};
use crate::state::{SiteStatus, TaskOutcome};
use crate::storage::{lock_storage, SharedStorage, Storage, StorageResult};
use crate::url::{normalize_link, short_path};
use crate::{SiteSearchError, UrlError};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Last error recorded on a site whose job was stopped
pub const STOPPED_BY_USER: &str = "stopped by user";

/// State shared by every crawl task of one site job
pub struct CrawlContext {
    pub site_id: i64,
    pub root: String,
    fetcher: Fetcher,
    storage: SharedStorage,
    dedup: DedupStore,
    stop: StopSignal,
    min_delay_ms: u64,
    max_delay_ms: u64,
}

impl CrawlContext {
    pub fn new(
        site_id: i64,
        root: impl Into<String>,
        fetcher: Fetcher,
        storage: SharedStorage,
        stop: StopSignal,
    ) -> Self {
        Self {
            site_id,
            root: root.into(),
            fetcher,
            storage,
            dedup: DedupStore::new(),
            stop,
            min_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Sets the range of the random pause taken before each fetch
    pub fn with_delay(mut self, min_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.min_delay_ms = min_delay_ms;
        self.max_delay_ms = max_delay_ms.max(min_delay_ms);
        self
    }

    pub fn dedup(&self) -> &DedupStore {
        &self.dedup
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    fn is_stopped(&self) -> bool {
        self.stop.is_tripped()
    }

    fn pause(&self) -> Duration {
        if self.max_delay_ms == 0 {
            return Duration::ZERO;
        }
        let millis = rand::thread_rng().gen_range(self.min_delay_ms..=self.max_delay_ms);
        Duration::from_millis(millis)
    }

    /// Saves the page unless one already exists for its path; returns true if saved
    fn persist_page(&self, path: &str, outcome: &FetchOutcome) -> StorageResult<bool> {
        let mut storage = lock_storage(&self.storage)?;
        if storage
            .find_page_by_site_and_path(self.site_id, path)?
            .is_some()
        {
            return Ok(false);
        }
        storage.insert_page(self.site_id, path, outcome.status, &outcome.html)?;
        storage.touch_site(self.site_id)?;
        Ok(true)
    }
}

/// Crawls one URL of a site and reports the links to follow
///
/// The task stops early when the job's stop signal is tripped, and does nothing
/// when another task already claimed the URL. A root page that cannot be fetched
/// fails the whole job.
pub async fn crawl_task(ctx: Arc<CrawlContext>, url: String) -> TaskReport {
    if ctx.is_stopped() {
        return TaskReport::leaf(url, TaskOutcome::Stopped);
    }

    if !ctx.dedup.try_claim(&url) {
        return TaskReport::leaf(url, TaskOutcome::Duplicate);
    }

    let pause = ctx.pause();
    if !pause.is_zero() {
        tokio::time::sleep(pause).await;
    }

    let page = ctx.fetcher.page(&url, &ctx.root);
    let outcome = page.fetch().await;

    if url == ctx.root && !outcome.accepted {
        let message = format!("root page unreachable: {} (status {})", url, outcome.status);
        warn!("{}", message);
        return TaskReport::leaf(url, TaskOutcome::Error(message));
    }

    if ctx.is_stopped() {
        debug!("Stop observed after fetching {}", url);
        return TaskReport::leaf(url, TaskOutcome::Stopped);
    }

    let path = short_path(&url, &ctx.root);
    match ctx.persist_page(&path, outcome) {
        Ok(true) => debug!("Saved {} [{}]", path, outcome.status),
        Ok(false) => debug!("{} already saved", path),
        Err(e) => {
            let message = format!("failed to save {}: {}", url, e);
            error!("{}", message);
            return TaskReport::leaf(url, TaskOutcome::Error(message));
        }
    }

    let children = outcome
        .links
        .iter()
        .filter(|link| !ctx.dedup.is_claimed(link))
        .cloned()
        .collect();

    let outcome = if ctx.is_stopped() {
        TaskOutcome::Stopped
    } else {
        TaskOutcome::Ok
    };

    TaskReport {
        url,
        outcome,
        children,
    }
}

/// A site job that is registered and waiting to run
pub struct SiteJob {
    context: Arc<CrawlContext>,
    name: String,
}

impl SiteJob {
    pub fn site_id(&self) -> i64 {
        self.context.site_id
    }

    pub fn root(&self) -> &str {
        &self.context.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Result of indexing a single page on demand
#[derive(Debug, Clone)]
pub struct IndexedPage {
    pub url: String,
    pub path: String,
    pub status: u16,
    /// Number of distinct lemmas written, None when the status is not indexable
    pub lemmas: Option<usize>,
}

/// Main crawler coordinator structure
#[derive(Clone)]
pub struct Coordinator {
    config: Arc<Config>,
    storage: SharedStorage,
    fetcher: Fetcher,
    indexer: Indexer,
    monitor: Arc<JobMonitor>,
}

impl Coordinator {
    pub fn new(
        config: Arc<Config>,
        storage: SharedStorage,
        fetcher: Fetcher,
        indexer: Indexer,
        monitor: Arc<JobMonitor>,
    ) -> Self {
        Self {
            config,
            storage,
            fetcher,
            indexer,
            monitor,
        }
    }

    pub fn monitor(&self) -> &Arc<JobMonitor> {
        &self.monitor
    }

    /// Replaces the stored site with a fresh INDEXING row and registers its job
    ///
    /// Pages, lemmas and postings of a previous run go with the old row.
    pub fn prepare_site(&self, site: &SiteEntry) -> Result<SiteJob, SiteSearchError> {
        let site_id = {
            let mut storage = lock_storage(&self.storage)?;
            if let Some(existing) = storage.find_site_by_url(&site.url)? {
                info!("Removing previous index of {}", site.url);
                storage.delete_site(existing.id)?;
            }
            storage.create_site(&site.url, &site.name, SiteStatus::Indexing)?
        };

        let stop = self.monitor.register(site_id);
        let crawler = &self.config.crawler;
        let context = CrawlContext::new(
            site_id,
            site.url.clone(),
            self.fetcher.clone(),
            self.storage.clone(),
            stop,
        )
        .with_delay(crawler.min_delay_ms, crawler.max_delay_ms);

        Ok(SiteJob {
            context: Arc::new(context),
            name: site.name.clone(),
        })
    }

    /// Crawls and indexes one prepared site, then records its final status
    ///
    /// The job is unregistered from the monitor whatever the outcome.
    pub async fn run_site(&self, job: SiteJob) -> SiteStatus {
        let ctx = job.context;
        let site_id = ctx.site_id;
        info!("Crawling {} ({})", ctx.root, job.name);

        let start_time = Instant::now();
        let pool_size = self.config.crawler.max_concurrent_pages_open as usize;
        let task_ctx = Arc::clone(&ctx);
        let summary = Scheduler::new(ctx.root.clone(), pool_size)
            .run(move |url| crawl_task(Arc::clone(&task_ctx), url))
            .await;

        info!(
            "Crawl of {} finished in {:?}: {} pages fetched, {} duplicates, {} stopped",
            ctx.root,
            start_time.elapsed(),
            ctx.dedup.len(),
            summary.duplicates,
            summary.stopped
        );
        ctx.dedup.clear();

        let (status, last_error) = match self.finish(&ctx, &summary).await {
            Ok(stats) => {
                info!(
                    "{} indexed: {} pages, {} postings",
                    ctx.root, stats.pages_indexed, stats.postings
                );
                (SiteStatus::Indexed, None)
            }
            Err(message) => {
                warn!("Indexing of {} failed: {}", ctx.root, message);
                (SiteStatus::Failed, Some(message))
            }
        };

        match lock_storage(&self.storage) {
            Ok(mut storage) => {
                if let Err(e) = storage.update_site_status(site_id, status, last_error.as_deref()) {
                    error!("Failed to record status of {}: {}", ctx.root, e);
                }
            }
            Err(e) => error!("Failed to record status of {}: {}", ctx.root, e),
        }

        self.monitor.unregister(site_id);
        status
    }

    /// Prepares and runs one site job
    pub async fn crawl_site(&self, site: &SiteEntry) -> Result<SiteStatus, SiteSearchError> {
        let job = self.prepare_site(site)?;
        Ok(self.run_site(job).await)
    }

    /// Decides whether the crawl succeeded and indexes its pages if it did
    async fn finish(&self, ctx: &CrawlContext, summary: &PoolSummary) -> Result<IndexStats, String> {
        if ctx.is_stopped() || summary.was_stopped() {
            return Err(STOPPED_BY_USER.to_string());
        }
        if let Some(message) = summary.first_error() {
            return Err(message.to_string());
        }

        let indexer = self.indexer.clone();
        let site_id = ctx.site_id;
        let stop = ctx.stop.clone();
        let indexed = tokio::task::spawn_blocking(move || indexer.index_site(site_id, &stop))
            .await
            .map_err(|e| format!("indexing task aborted: {}", e))?;

        match indexed {
            Ok(stats) if !ctx.is_stopped() => Ok(stats),
            Ok(_) | Err(IndexingError::Stopped) => Err(STOPPED_BY_USER.to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Fetches and indexes exactly one page of a configured site
    ///
    /// A stored version of the page is replaced together with its postings. The
    /// site row is created with status INDEXED if it does not exist yet. Pages of
    /// a site whose crawl job is running are refused.
    pub async fn index_page(&self, url: &str) -> Result<IndexedPage, SiteSearchError> {
        let url = url.trim();
        let site = self
            .config
            .find_site(url)
            .ok_or_else(|| SiteSearchError::UnknownSite(url.to_string()))?;
        let normalized =
            normalize_link(url, &site.url).ok_or_else(|| UrlError::Parse(url.to_string()))?;
        let path = short_path(&normalized, &site.url);

        let site_id = {
            let mut storage = lock_storage(&self.storage)?;
            match storage.find_site_by_url(&site.url)? {
                Some(existing) if self.monitor.is_active(existing.id) => {
                    return Err(SiteSearchError::SiteBusy(site.url.clone()));
                }
                Some(existing) => existing.id,
                None => storage.create_site(&site.url, &site.name, SiteStatus::Indexed)?,
            }
        };

        let page = self.fetcher.page(&normalized, &site.url);
        let outcome = page.fetch().await;
        info!("Fetched {} [{}]", normalized, outcome.status);

        let record = {
            let mut storage = lock_storage(&self.storage)?;
            if let Some(existing) = storage.find_page_by_site_and_path(site_id, &path)? {
                debug!("Replacing stored page {}", path);
                storage.delete_page_index(existing.id)?;
                storage.delete_page(existing.id)?;
            }
            let page_id = storage.insert_page(site_id, &path, outcome.status, &outcome.html)?;
            storage.touch_site(site_id)?;
            storage.get_page(page_id)?
        };

        let lemmas = self.indexer.index_page(site_id, &record)?;

        Ok(IndexedPage {
            url: normalized,
            path,
            status: outcome.status,
            lemmas,
        })
    }
}
