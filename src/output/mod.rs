//! Output module for run reports and summaries
//!
//! This module handles:
//! - Resolving the display status of every URL in a run
//! - Rendering a run as a Graphviz DOT graph
//! - Formatting crawl and report statistics

mod dot;
mod report;
pub mod stats;
mod status;

pub use dot::{cluster_id, escape_label, format_dot, write_dot};
pub use report::{load_report, select_run, ReportNode, RunReport};
pub use stats::{format_crawl_summary, format_status_counts, print_crawl_summary};
pub use status::NodeStatus;

use crate::storage::{Storage, StorageError};
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("No such run: {0}")]
    NoRun(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Selects a run, resolves its statuses and writes it as DOT
///
/// # Arguments
///
/// * `storage` - The storage backend containing crawl data
/// * `run_id` - Explicit run id; when `None`, `offset` picks from the latest
/// * `offset` - 0 for the latest run, -1 for the one before, ...
/// * `out` - Where the DOT text goes
///
/// # Returns
///
/// * `Ok(RunReport)` - The report that was written
/// * `Err(OutputError)` - No such run, or storage/IO failure
pub fn generate_report<S: Storage, W: Write>(
    storage: &S,
    run_id: Option<i64>,
    offset: i64,
    out: &mut W,
) -> OutputResult<RunReport> {
    let run = select_run(storage, run_id, offset)?;
    tracing::info!("Generating report for run {} ({})", run.id, run.root);
    let report = load_report(storage, run)?;
    write_dot(&report, out)?;
    Ok(report)
}
