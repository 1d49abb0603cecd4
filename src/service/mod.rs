//! User-facing operations of the search engine
//!
//! [`IndexingService`] wires the crawler, indexer and search engine to one shared
//! storage and answers every call with a typed response carrying `result` and an
//! optional user-facing `error`. Bad input never turns into a crash.

use crate::config::Config;
use crate::crawler::{Coordinator, Fetcher, JobMonitor};
use crate::indexing::Indexer;
use crate::morphology::Lemmatizer;
use crate::output::{load_statistics, Statistics};
use crate::search::{SearchEngine, SearchError, SearchItem};
use crate::state::SiteStatus;
use crate::storage::{lock_storage, open_storage, share, SharedStorage};
use crate::SiteSearchError;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub const ALREADY_RUNNING: &str = "Indexing is already running";
pub const NOT_RUNNING: &str = "Indexing is not running";
pub const OUTSIDE_CONFIGURED_SITES: &str =
    "This page is outside the sites listed in the configuration file";
pub const SITE_BEING_INDEXED: &str =
    "The site of this page is being indexed, try again when indexing finishes";

/// Outcome of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceResponse {
    pub fn ok() -> Self {
        Self {
            result: true,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            result: false,
            error: Some(message.into()),
        }
    }
}

/// Answer to a search call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub count: usize,
    pub data: Vec<SearchItem>,
}

impl SearchResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            result: false,
            error: Some(message.into()),
            count: 0,
            data: Vec::new(),
        }
    }
}

/// Answer to a statistics call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsResponse {
    pub result: bool,
    pub statistics: Statistics,
}

/// Starts and stops indexing jobs, indexes single pages and runs searches
pub struct IndexingService {
    config: Arc<Config>,
    storage: SharedStorage,
    coordinator: Coordinator,
    engine: SearchEngine,
    monitor: Arc<JobMonitor>,
    start_lock: Mutex<()>,
    jobs: Mutex<Vec<JoinHandle<SiteStatus>>>,
}

impl IndexingService {
    /// Builds the service on an already opened storage
    pub fn new(
        config: Config,
        storage: SharedStorage,
        lemmatizer: Lemmatizer,
    ) -> Result<Self, SiteSearchError> {
        let config = Arc::new(config);
        let fetcher = Fetcher::from_config(&config)?;
        let indexer = Indexer::new(storage.clone(), lemmatizer.clone(), &config.indexing);
        let engine = SearchEngine::new(storage.clone(), lemmatizer, config.search.clone());
        let monitor = Arc::new(JobMonitor::new());
        let coordinator = Coordinator::new(
            Arc::clone(&config),
            storage.clone(),
            fetcher,
            indexer,
            Arc::clone(&monitor),
        );

        Ok(Self {
            config,
            storage,
            coordinator,
            engine,
            monitor,
            start_lock: Mutex::new(()),
            jobs: Mutex::new(Vec::new()),
        })
    }

    /// Opens the configured database and analyzer and builds the service
    pub fn from_config(config: Config) -> Result<Self, SiteSearchError> {
        let storage = share(open_storage(Path::new(&config.output.database_path))?);
        let lemmatizer = Lemmatizer::from_config(&config.morphology)?;
        Self::new(config, storage, lemmatizer)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    pub fn is_running(&self) -> bool {
        self.monitor.is_running()
    }

    /// Launches one crawl job per configured site
    ///
    /// Every site is reset to INDEXING before this returns; the crawls run in the
    /// background. Must be called from within a tokio runtime.
    pub fn start_indexing(&self) -> ServiceResponse {
        let _guard = recover(self.start_lock.lock());
        if self.monitor.is_running() {
            return ServiceResponse::error(ALREADY_RUNNING);
        }

        let mut prepared = Vec::with_capacity(self.config.sites.len());
        let mut failures = Vec::new();
        for site in &self.config.sites {
            match self.coordinator.prepare_site(site) {
                Ok(job) => prepared.push(job),
                Err(e) => {
                    error!("Failed to prepare {}: {}", site.url, e);
                    failures.push(format!("{}: {}", site.url, e));
                }
            }
        }

        if prepared.is_empty() {
            return ServiceResponse::error(failures.join("; "));
        }

        info!("Starting indexing of {} sites", prepared.len());
        let mut jobs = recover(self.jobs.lock());
        for job in prepared {
            let coordinator = self.coordinator.clone();
            jobs.push(tokio::spawn(async move { coordinator.run_site(job).await }));
        }

        ServiceResponse::ok()
    }

    /// Asks every running job to stop
    pub fn stop_indexing(&self) -> ServiceResponse {
        if !self.monitor.is_running() {
            return ServiceResponse::error(NOT_RUNNING);
        }
        info!("Stop requested for {} indexing jobs", self.monitor.active_jobs());
        self.monitor.request_stop();
        ServiceResponse::ok()
    }

    /// Waits for every job started so far and returns their final statuses
    pub async fn wait_for_completion(&self) -> Vec<SiteStatus> {
        let handles = std::mem::take(&mut *recover(self.jobs.lock()));
        let mut statuses = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(status) => statuses.push(status),
                Err(e) => {
                    error!("Indexing job aborted: {}", e);
                    statuses.push(SiteStatus::Failed);
                }
            }
        }
        statuses
    }

    /// Fetches and indexes exactly one page, replacing a stored version
    ///
    /// Refused while the page's site has a running crawl job.
    pub async fn index_page(&self, url: &str) -> ServiceResponse {
        if url.trim().is_empty() {
            return ServiceResponse::error("Page URL is empty");
        }

        match self.coordinator.index_page(url).await {
            Ok(page) => {
                info!("Indexed {} [{}]", page.url, page.status);
                ServiceResponse::ok()
            }
            Err(SiteSearchError::UnknownSite(url)) => {
                warn!("Refusing to index {}", url);
                ServiceResponse::error(OUTSIDE_CONFIGURED_SITES)
            }
            Err(SiteSearchError::SiteBusy(site)) => {
                warn!("Refusing to index {} while {} is being crawled", url, site);
                ServiceResponse::error(SITE_BEING_INDEXED)
            }
            Err(e) => {
                error!("Failed to index {}: {}", url, e);
                ServiceResponse::error(e.to_string())
            }
        }
    }

    /// Runs a ranked search; `limit` falls back to the configured default
    pub fn search(
        &self,
        query: &str,
        site: Option<&str>,
        offset: usize,
        limit: Option<usize>,
    ) -> SearchResponse {
        match self.engine.search(query, site, offset, limit) {
            Ok(results) => SearchResponse {
                result: true,
                error: None,
                count: results.count,
                data: results.data,
            },
            Err(e @ (SearchError::EmptyQuery | SearchError::UnknownSite(_))) => {
                SearchResponse::error(e.to_string())
            }
            Err(e) => {
                error!("Search for {:?} failed: {}", query, e);
                SearchResponse::error(e.to_string())
            }
        }
    }

    /// Collects per-site and total statistics
    pub fn statistics(&self) -> Result<StatisticsResponse, SiteSearchError> {
        let storage = lock_storage(&self.storage)?;
        let statistics = load_statistics(&*storage, &self.config, self.is_running())?;
        Ok(StatisticsResponse {
            result: true,
            statistics,
        })
    }
}

fn recover<T>(result: std::sync::LockResult<MutexGuard<'_, T>>) -> MutexGuard<'_, T> {
    match result {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::morphology::StemmerAnalyzer;
    use crate::storage::SqliteStorage;

    const CONFIG: &str = r#"
[crawler]
max-concurrent-pages-open = 2
min-delay-ms = 0
max-delay-ms = 0

[user-agent]
agent = "TestBot/1.0"
referrer = "https://www.google.com"

[output]
database-path = "unused.db"

[[site]]
url = "https://a.example"
name = "A"
"#;

    fn service() -> IndexingService {
        let config = parse_config(CONFIG).unwrap();
        let storage = share(SqliteStorage::new_in_memory().unwrap());
        let lemmatizer = Lemmatizer::new(Arc::new(StemmerAnalyzer::new()));
        IndexingService::new(config, storage, lemmatizer).unwrap()
    }

    #[test]
    fn test_stop_when_idle() {
        assert_eq!(service().stop_indexing(), ServiceResponse::error(NOT_RUNNING));
    }

    #[test]
    fn test_empty_search_query() {
        let response = service().search("  ", None, 0, None);
        assert!(!response.result);
        assert_eq!(response.error.as_deref(), Some("Empty search query"));
    }

    #[tokio::test]
    async fn test_page_outside_configured_sites() {
        let response = service().index_page("https://elsewhere.example/page").await;
        assert_eq!(response, ServiceResponse::error(OUTSIDE_CONFIGURED_SITES));
    }

    #[test]
    fn test_statistics_before_indexing() {
        let response = service().statistics().unwrap();
        assert!(response.result);
        assert_eq!(response.statistics.total.sites, 1);
        assert!(!response.statistics.total.indexing);
    }

    #[test]
    fn test_response_json_shape() {
        let json = serde_json::to_string(&ServiceResponse::ok()).unwrap();
        assert_eq!(json, r#"{"result":true}"#);

        let json = serde_json::to_value(ServiceResponse::error(ALREADY_RUNNING)).unwrap();
        assert_eq!(json["error"], ALREADY_RUNNING);
    }
}
