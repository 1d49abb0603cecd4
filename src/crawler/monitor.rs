//! Registry of running crawl jobs and the global stop flag

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Cooperative stop signal of one crawl job
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trip(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_tripped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct MonitorState {
    active: HashMap<i64, StopSignal>,
    stop_requested: bool,
}

/// Tracks active crawl jobs keyed by site id
///
/// Indexing is "running" while at least one job is registered. Unregistering the
/// last job clears a pending stop request.
#[derive(Debug, Default)]
pub struct JobMonitor {
    state: Mutex<MonitorState>,
}

impl JobMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MonitorState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Registers a job and returns its stop signal
    ///
    /// A job registered while a stop is pending starts already tripped.
    pub fn register(&self, site_id: i64) -> StopSignal {
        let mut state = self.state();
        let signal = StopSignal::new();
        if state.stop_requested {
            signal.trip();
        }
        state.active.insert(site_id, signal.clone());
        signal
    }

    /// Removes a finished job
    pub fn unregister(&self, site_id: i64) {
        let mut state = self.state();
        state.active.remove(&site_id);
        if state.active.is_empty() && state.stop_requested {
            info!("All indexing jobs finished, clearing stop request");
            state.stop_requested = false;
        }
    }

    /// Sets the stop flag and trips every registered job's signal
    pub fn request_stop(&self) {
        let mut state = self.state();
        state.stop_requested = true;
        for signal in state.active.values() {
            signal.trip();
        }
    }

    /// True while a job for `site_id` is registered
    pub fn is_active(&self, site_id: i64) -> bool {
        self.state().active.contains_key(&site_id)
    }

    pub fn is_running(&self) -> bool {
        !self.state().active.is_empty()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.state().stop_requested
    }

    pub fn active_jobs(&self) -> usize {
        self.state().active.len()
    }
}
