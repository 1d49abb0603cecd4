//! Per-job set of claimed URLs

use std::collections::HashSet;
use std::sync::Mutex;

/// Thread-safe set of URLs already claimed by a crawl task of one job
///
/// A URL is fetched only by the task that claimed it first.
#[derive(Debug, Default)]
pub struct DedupStore {
    claimed: Mutex<HashSet<String>>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `url` if absent; returns true only to the caller that added it
    pub fn try_claim(&self, url: &str) -> bool {
        match self.claimed.lock() {
            Ok(mut claimed) => claimed.insert(url.to_string()),
            Err(poisoned) => poisoned.into_inner().insert(url.to_string()),
        }
    }

    pub fn is_claimed(&self, url: &str) -> bool {
        match self.claimed.lock() {
            Ok(claimed) => claimed.contains(url),
            Err(poisoned) => poisoned.into_inner().contains(url),
        }
    }

    pub fn len(&self) -> usize {
        match self.claimed.lock() {
            Ok(claimed) => claimed.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Releases every claim at the end of a job
    pub fn clear(&self) {
        match self.claimed.lock() {
            Ok(mut claimed) => claimed.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}
