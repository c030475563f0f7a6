//! Run report assembly
//!
//! Loads everything the renderers need for one run out of storage: the run
//! itself, every participating URL with its resolved status, and the edges.

use crate::output::status::NodeStatus;
use crate::output::{OutputError, OutputResult};
use crate::storage::{EdgeRecord, RunRecord, Storage};
use crate::url::CanonicalId;
use std::collections::BTreeMap;

/// One URL of a run with its status
#[derive(Debug, Clone)]
pub struct ReportNode {
    pub url_id: i64,
    pub url: CanonicalId,
    pub status: NodeStatus,
}

/// Everything known about one run, ready to render
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run: RunRecord,
    pub nodes: Vec<ReportNode>,
    pub edges: Vec<EdgeRecord>,
}

impl RunReport {
    /// Number of nodes per status, in legend order
    pub fn status_counts(&self) -> BTreeMap<NodeStatus, usize> {
        let mut counts = BTreeMap::new();
        for node in &self.nodes {
            *counts.entry(node.status).or_insert(0) += 1;
        }
        counts
    }

    pub fn node(&self, url_id: i64) -> Option<&ReportNode> {
        self.nodes.iter().find(|n| n.url_id == url_id)
    }
}

/// Picks the run to report on
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `run_id` - Explicit run id, wins when given
/// * `offset` - Otherwise, the latest run shifted by this (0 = latest,
///   -1 = the one before)
///
/// # Returns
///
/// * `Ok(RunRecord)` - The selected run
/// * `Err(OutputError)` - No such run
pub fn select_run<S: Storage>(
    storage: &S,
    run_id: Option<i64>,
    offset: i64,
) -> OutputResult<RunRecord> {
    match run_id {
        Some(id) => Ok(storage.get_run(id)?),
        None => storage
            .latest_run(offset)?
            .ok_or_else(|| OutputError::NoRun(format!("no run at offset {}", offset))),
    }
}

/// Loads a run and resolves the status of every participating URL
pub fn load_report<S: Storage>(storage: &S, run: RunRecord) -> OutputResult<RunReport> {
    let nodes = storage
        .url_aggregates(run.id)?
        .iter()
        .map(|aggregate| ReportNode {
            url_id: aggregate.url_id,
            url: aggregate.url.clone(),
            status: NodeStatus::resolve(aggregate),
        })
        .collect();
    let edges = storage.run_edges(run.id)?;

    Ok(RunReport { run, nodes, edges })
}
