//! Output module for reporting index state
//!
//! This module handles:
//! - Collecting per-site and total statistics from storage
//! - Rendering statistics as text for the command line

pub mod stats;

pub use stats::{load_statistics, print_statistics, SiteStatistics, Statistics, TotalStatistics};
