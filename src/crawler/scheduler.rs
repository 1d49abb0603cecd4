//! Bounded worker pool for crawl tasks
//!
//! This module handles:
//! - The FIFO queue of URLs waiting for a worker, each URL queued at most once
//! - Capping the number of in-flight tasks at the pool size
//! - Drain detection: the pool is done when the queue is empty and no task runs
//! - Collecting task outcomes

use crate::state::TaskOutcome;
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// What a finished crawl task hands back to the pool
#[derive(Debug, Clone)]
pub struct TaskReport {
    /// The URL the task was started with
    pub url: String,

    pub outcome: TaskOutcome,

    /// Links to schedule as child tasks
    pub children: Vec<String>,
}

impl TaskReport {
    /// A report without children
    pub fn leaf(url: impl Into<String>, outcome: TaskOutcome) -> Self {
        Self {
            url: url.into(),
            outcome,
            children: Vec::new(),
        }
    }
}

/// Tally of task outcomes after the pool drained
#[derive(Debug, Clone, Default)]
pub struct PoolSummary {
    pub completed: usize,
    pub stopped: usize,
    pub duplicates: usize,
    pub errors: Vec<String>,
}

impl PoolSummary {
    fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Ok => self.completed += 1,
            TaskOutcome::Stopped => self.stopped += 1,
            TaskOutcome::Duplicate => self.duplicates += 1,
            TaskOutcome::Error(message) => self.errors.push(message),
        }
    }

    /// The first error reported by any task
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }

    /// True if any task observed the stop signal
    pub fn was_stopped(&self) -> bool {
        self.stopped > 0
    }
}

/// Scheduler manages the crawl queue and the bounded set of running tasks
///
/// The scheduler coordinates:
/// - A shared FIFO queue fed by every task's children; a URL that was ever
///   queued is not queued again
/// - At most `pool_size` tasks in flight at once
/// - Early drain after an error: queued URLs are dropped, running tasks finish
pub struct Scheduler {
    frontier: VecDeque<String>,
    queued: HashSet<String>,
    pool_size: usize,
}

impl Scheduler {
    /// Creates a scheduler seeded with one URL
    pub fn new(seed: impl Into<String>, pool_size: usize) -> Self {
        let mut scheduler = Self {
            frontier: VecDeque::new(),
            queued: HashSet::new(),
            pool_size: pool_size.max(1),
        };
        scheduler.enqueue(seed.into());
        scheduler
    }

    /// Queues `url` unless it was queued before
    fn enqueue(&mut self, url: String) {
        if self.queued.insert(url.clone()) {
            self.frontier.push_back(url);
        }
    }

    /// Number of URLs waiting for a worker
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Runs tasks until the queue is empty and every task has finished
    ///
    /// `make_task` turns a queued URL into the future run by the worker.
    pub async fn run<F, Fut>(mut self, mut make_task: F) -> PoolSummary
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = TaskReport> + Send + 'static,
    {
        let mut tasks: JoinSet<TaskReport> = JoinSet::new();
        let mut summary = PoolSummary::default();

        loop {
            while tasks.len() < self.pool_size {
                match self.frontier.pop_front() {
                    Some(url) => {
                        tasks.spawn(make_task(url));
                    }
                    None => break,
                }
            }

            let Some(joined) = tasks.join_next().await else {
                debug!("Crawl pool drained");
                break;
            };

            match joined {
                Ok(report) => {
                    debug!("{} -> {}", report.url, report.outcome);
                    let failed = report.outcome.is_error();
                    summary.record(report.outcome);

                    if failed {
                        if !self.frontier.is_empty() {
                            warn!(
                                "Dropping {} queued URLs after a failed task",
                                self.frontier.len()
                            );
                        }
                        self.frontier.clear();
                    } else if summary.errors.is_empty() {
                        for child in report.children {
                            self.enqueue(child);
                        }
                    }
                }
                Err(e) => {
                    error!("Crawl task aborted: {}", e);
                    summary.record(TaskOutcome::Error(format!("crawl task aborted: {}", e)));
                    self.frontier.clear();
                }
            }
        }

        summary
    }
}
