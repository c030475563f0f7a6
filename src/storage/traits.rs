//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{EdgeRecord, FetchRow, NewRun, RunRecord, UrlAggregate};
use crate::url::CanonicalId;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines every durable operation the spider and the report
/// need. Writes may be buffered in an open transaction until
/// [`Storage::commit`] is called.
pub trait Storage {
    // ===== URL Identity =====

    /// Returns the id of the `url` row for this 6-tuple, inserting it if needed
    fn url_id(&mut self, id: &CanonicalId) -> StorageResult<i64>;

    // ===== Run Management =====

    /// Creates a new crawl run and returns its id
    fn create_run(&mut self, run: &NewRun) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run shifted by `offset` (0 = latest, -1 = the one before)
    fn latest_run(&self, offset: i64) -> StorageResult<Option<RunRecord>>;

    // ===== Fetch Results =====

    /// Inserts a fetch row and returns its generated id
    fn insert_fetch(&mut self, fetch: &FetchRow) -> StorageResult<i64>;

    /// Inserts response headers for a fetch
    fn insert_headers(&mut self, fetch_id: i64, headers: &[(String, String)])
        -> StorageResult<()>;

    /// Inserts dependency edges `(target url id, dependency kind)` for a fetch
    fn insert_dependencies(&mut self, fetch_id: i64, targets: &[(i64, String)])
        -> StorageResult<()>;

    /// Inserts link edges for a fetch
    fn insert_links(&mut self, fetch_id: i64, targets: &[i64]) -> StorageResult<()>;

    /// Makes everything written so far durable
    fn commit(&mut self) -> StorageResult<()>;

    // ===== Reporting =====

    /// Per-URL aggregates for every URL that took part in a run
    ///
    /// A URL takes part if it was fetched in the run, is the target of a
    /// dependency or link recorded in the run, or is the run's root. Broken
    /// dependency/link flags look one hop through edges recorded in the run
    /// and only at fetch results from the same run.
    fn url_aggregates(&self, run_id: i64) -> StorageResult<Vec<UrlAggregate>>;

    /// Every dependency and link edge recorded in a run
    fn run_edges(&self, run_id: i64) -> StorageResult<Vec<EdgeRecord>>;

    /// Number of fetch rows and total bytes recorded for a run
    fn fetch_totals(&self, run_id: i64) -> StorageResult<(u64, u64)>;
}
