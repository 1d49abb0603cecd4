//! Statistics generation from the index database
//!
//! This module provides functionality for extracting and displaying
//! per-site and total index statistics from the storage layer.

use crate::config::Config;
use crate::state::SiteStatus;
use crate::storage::{Storage, StorageResult};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Totals over every configured site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TotalStatistics {
    pub sites: usize,
    pub pages: u64,
    pub lemmas: u64,
    /// True while at least one indexing job runs
    pub indexing: bool,
}

/// Statistics of one configured site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatistics {
    pub url: String,
    pub name: String,
    /// None when the site was never indexed
    pub status: Option<SiteStatus>,
    /// Milliseconds since the Unix epoch of the last status change
    pub status_time: Option<i64>,
    pub error: Option<String>,
    pub pages: u64,
    pub lemmas: u64,
}

/// Index statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total: TotalStatistics,
    pub detailed: Vec<SiteStatistics>,
}

/// Loads statistics for every configured site from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `config` - Configuration holding the site list
/// * `running` - Whether an indexing job is currently active
///
/// # Returns
///
/// * `Ok(Statistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(
    storage: &dyn Storage,
    config: &Config,
    running: bool,
) -> StorageResult<Statistics> {
    let mut stats = Statistics {
        total: TotalStatistics {
            sites: config.sites.len(),
            indexing: running,
            ..TotalStatistics::default()
        },
        detailed: Vec::with_capacity(config.sites.len()),
    };

    for site in &config.sites {
        let item = match storage.find_site_by_url(&site.url)? {
            Some(record) => SiteStatistics {
                url: site.url.clone(),
                name: site.name.clone(),
                status: Some(record.status),
                status_time: record.status_time_millis(),
                error: record.last_error.clone(),
                pages: storage.count_pages(Some(record.id))?,
                lemmas: storage.count_lemmas(Some(record.id))?,
            },
            None => SiteStatistics {
                url: site.url.clone(),
                name: site.name.clone(),
                status: None,
                status_time: None,
                error: None,
                pages: 0,
                lemmas: 0,
            },
        };

        stats.total.pages += item.pages;
        stats.total.lemmas += item.lemmas;
        stats.detailed.push(item);
    }

    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &Statistics) {
    println!("=== Index Statistics ===\n");

    println!("Overview:");
    println!("  Sites: {}", stats.total.sites);
    println!("  Pages: {}", stats.total.pages);
    println!("  Lemmas: {}", stats.total.lemmas);
    println!(
        "  Indexing: {}",
        if stats.total.indexing { "running" } else { "idle" }
    );
    println!();

    println!("Sites:");
    for site in &stats.detailed {
        let status = site
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "NOT INDEXED".to_string());
        println!("  {} ({})", site.name, site.url);
        println!("    Status: {}", status);
        if let Some(time) = site
            .status_time
            .and_then(DateTime::<Utc>::from_timestamp_millis)
        {
            println!("    Status time: {}", time.to_rfc3339());
        }
        println!("    Pages: {}, lemmas: {}", site.pages, site.lemmas);
        if let Some(error) = &site.error {
            println!("    Last error: {}", error);
        }
    }
}
