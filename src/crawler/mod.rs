//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with status and content-type validation
//! - HTML parsing, text extraction and link extraction
//! - The per-job dedup store and the registry of running jobs
//! - The bounded worker pool and per-site crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod monitor;
mod parser;
mod scheduler;

pub use coordinator::{crawl_task, Coordinator, CrawlContext, IndexedPage, SiteJob, STOPPED_BY_USER};
pub use fetcher::{
    build_http_client, FetchOutcome, Fetcher, PageFetcher, FETCH_FAILED_STATUS, NOT_HTML_STATUS,
};
pub use frontier::DedupStore;
pub use monitor::{JobMonitor, StopSignal};
pub use parser::{html_to_text, page_title, parse_html, ParsedPage};
pub use scheduler::{PoolSummary, Scheduler, TaskReport};
