//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the spider, including:
//! - SQLite database initialization and schema management
//! - URL identity rows shared across runs
//! - Run metadata, fetch results and response headers
//! - Dependency and link edges
//! - The per-run aggregate query the status report is built from

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::ResultKind;
use crate::url::CanonicalId;

/// A run about to be created
#[derive(Debug, Clone)]
pub struct NewRun {
    pub root_url_id: i64,
    pub url_max_sec: u64,
    pub start_time: i64,
    pub hosts_allowed: String,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub root_url_id: i64,
    pub root: CanonicalId,
    pub url_max_sec: u64,
    pub start_time: i64,
    pub hosts_allowed: String,
}

/// A fetch result as written to `url_fetch`
#[derive(Debug, Clone)]
pub struct FetchRow {
    pub run_id: i64,
    pub url_id: i64,
    pub datetime: i64,
    pub result: ResultKind,
    pub msec: u64,
    pub bytes: u64,
}

/// What an edge means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeKind {
    /// Dependency with its category as stored (`image`, `script`, ...)
    Dependency(String),
    Link,
}

/// A dependency or link between two URL rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRecord {
    pub source_url_id: i64,
    pub target_url_id: i64,
    pub kind: EdgeKind,
}

/// Per-URL rollup for one run, the input of the status resolver
#[derive(Debug, Clone)]
pub struct UrlAggregate {
    pub url_id: i64,
    pub url: CanonicalId,

    /// The URL's own fetch result in this run; `None` if only referenced
    pub own: Option<ResultKind>,

    /// Some dependency target has an error result in this run
    pub broken_dependency: bool,

    /// Some link target has an error result in this run
    pub broken_link: bool,
}

impl UrlAggregate {
    pub fn was_fetched(&self) -> bool {
        matches!(self.own, Some(kind) if kind != ResultKind::NotFetched)
    }

    pub fn has_connection_error(&self) -> bool {
        self.own.is_some_and(|kind| kind.is_transport_failure())
    }

    pub fn has_http_error(&self) -> bool {
        matches!(self.own, Some(ResultKind::ClientOrServerError(_)))
    }
}
