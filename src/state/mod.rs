//! State module for tracking indexing progress
//!
//! # Components
//!
//! - `SiteStatus`: Lifecycle of a site's indexing job (indexing, indexed, failed)
//! - `TaskOutcome`: Result of a single crawl task

mod site_status;
mod task_outcome;

pub use site_status::SiteStatus;
pub use task_outcome::TaskOutcome;
