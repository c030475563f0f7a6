//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the pieces together:
//! - Creating the run row and seeding the frontier with the root
//! - Visiting URLs breadth-first within the run's budgets
//! - Fetching, classifying and extracting references
//! - Persisting fetch results, headers and edges with periodic commits
//! - Reporting why the run stopped

use crate::config::{Config, CrawlerConfig};
use crate::crawler::extractor::extract_references;
use crate::crawler::fetcher::{FetchResponse, Fetcher, HttpFetcher};
use crate::crawler::scheduler::{CrawlBudget, Frontier, StopReason};
use crate::state::{FetchRecord, NodeId, References, ResultKind};
use crate::storage::{FetchRow, NewRun, SqliteStorage, Storage};
use crate::url::{canonicalize, HostMask, UrlRegistry};
use crate::SpiderError;
use chrono::Utc;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Totals reported when a run ends
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub run_id: i64,

    /// The limiting condition that ended the run
    pub stop_reason: StopReason,

    /// URLs known to the registry (fetched or only referenced)
    pub known: usize,

    /// URLs that passed the scheme check and were handed to the fetcher
    pub visited: u64,

    /// URLs with a fetch record
    pub fetched: usize,

    /// Bytes transferred (headers plus bodies)
    pub bytes: u64,

    pub elapsed: Duration,
}

impl CrawlSummary {
    /// Bytes per second over the whole run
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes as f64 / secs
        } else {
            0.0
        }
    }
}

/// Main crawler coordinator structure
///
/// Owns the storage handle, the fetcher and the in-memory URL registry for
/// exactly one run.
pub struct Coordinator<S: Storage, F: Fetcher> {
    storage: S,
    fetcher: F,
    registry: UrlRegistry,
    frontier: Frontier,
    hosts: HostMask,
    budget: CrawlBudget,
    commit_interval: u64,
    run_id: i64,
    visited: u64,
    bytes: u64,
}

impl<S: Storage, F: Fetcher> Coordinator<S, F> {
    /// Creates a new coordinator and the run it will fill
    ///
    /// # Arguments
    ///
    /// * `storage` - Storage backend the run is written to
    /// * `fetcher` - Source of page fetches
    /// * `config` - Budgets, extra hosts, timeout and commit interval
    /// * `root_url` - Where the crawl starts (depth 0)
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Run row created, frontier seeded
    /// * `Err(SpiderError::RunInit)` - The run row could not be written
    pub fn new(
        mut storage: S,
        fetcher: F,
        config: &CrawlerConfig,
        root_url: &str,
    ) -> Result<Self, SpiderError> {
        let mut registry = UrlRegistry::new();
        let (root, _) = registry.intern(root_url, 0, None);
        let root_id = canonicalize(root_url);
        let hosts = HostMask::new(&root_id.hostname(), &config.hosts);

        let run_id = Self::start_run(&mut storage, &mut registry, root, config, &hosts)
            .map_err(|e| SpiderError::RunInit(e.to_string()))?;

        info!(
            "Starting spider run {} at {} (hosts: {})",
            run_id,
            root_url,
            hosts.to_db_string()
        );

        Ok(Self {
            storage,
            fetcher,
            registry,
            frontier: Frontier::new(root),
            hosts,
            budget: CrawlBudget::from_config(config),
            commit_interval: u64::from(config.commit_interval.max(1)),
            run_id,
            visited: 0,
            bytes: 0,
        })
    }

    fn start_run(
        storage: &mut S,
        registry: &mut UrlRegistry,
        root: NodeId,
        config: &CrawlerConfig,
        hosts: &HostMask,
    ) -> Result<i64, SpiderError> {
        let root_node = registry
            .get_mut(root)
            .ok_or_else(|| SpiderError::RunInit("root URL was not registered".to_string()))?;
        let root_url_id = storage.url_id(&root_node.id)?;
        root_node.db_id = Some(root_url_id);

        let run_id = storage.create_run(&NewRun {
            root_url_id,
            url_max_sec: config.url_timeout,
            start_time: Utc::now().timestamp(),
            hosts_allowed: hosts.to_db_string(),
        })?;
        storage.commit()?;
        Ok(run_id)
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn registry(&self) -> &UrlRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Gives the storage handle back once the run is over
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Runs the crawl loop until a limiting condition is hit
    ///
    /// Per-URL failures are logged and never end the run. Commits happen
    /// every `commit-interval` visited URLs and once more at the end; a
    /// failed commit is retried at the next checkpoint.
    pub async fn run(&mut self) -> CrawlSummary {
        let started = Instant::now();
        let mut since_commit = 0;

        let stop_reason = loop {
            let node = match self.frontier.next(&self.budget, self.visited, self.bytes) {
                Ok(node) => node,
                Err(reason) => break reason,
            };

            let Some((url, depth, spiderable)) = self
                .registry
                .get(node)
                .map(|n| (n.url.clone(), n.depth, n.id.is_spiderable()))
            else {
                continue;
            };

            if !spiderable {
                debug!("Skipping {}: unsupported scheme", url);
                continue;
            }

            self.visited += 1;
            if let Err(e) = self.visit(node, &url, depth).await {
                error!("Error processing {}: {}", url, e);
            }

            since_commit += 1;
            if since_commit >= self.commit_interval {
                self.checkpoint();
                since_commit = 0;
            }

            if self.budget.depth_exceeded(depth) {
                info!(
                    "{} is at depth {}, past the limit of {}",
                    url, depth, self.budget.max_depth
                );
                break StopReason::MaxDepth;
            }
        };

        self.checkpoint();

        let summary = CrawlSummary {
            run_id: self.run_id,
            stop_reason,
            known: self.registry.len(),
            visited: self.visited,
            fetched: self.registry.fetched_count(),
            bytes: self.bytes,
            elapsed: started.elapsed(),
        };
        info!("Run {} stopped: {}", self.run_id, stop_reason);
        summary
    }

    /// Fetches, extracts and persists one URL
    async fn visit(&mut self, node: NodeId, url: &str, depth: u32) -> Result<(), SpiderError> {
        let host = self
            .registry
            .get(node)
            .map(|n| n.id.hostname())
            .unwrap_or_default();
        let allowed = self.hosts.allows(&host);

        let started_at = Utc::now().timestamp();
        let response = self.fetcher.fetch(url, allowed).await;
        let kind = ResultKind::classify(&response.outcome);
        self.bytes += response.bytes;

        debug!(
            "{} {} ({} bytes, {} ms{})",
            kind,
            url,
            response.bytes,
            response.elapsed_ms,
            if allowed { "" } else { ", probe only" }
        );

        let references = match (&response.body, allowed) {
            (Some(body), true) => {
                let base = response.final_url.as_deref().unwrap_or(url);
                extract_references(body, base)
            }
            _ => References::default(),
        };

        for (_, target) in references.all() {
            let (child, created) = self.registry.intern(target, depth + 1, Some(node));
            if created {
                self.frontier.push(child);
            }
        }

        self.persist(url, kind, started_at, &response, &references)?;

        if let Some(n) = self.registry.get_mut(node) {
            n.fetch = Some(FetchRecord {
                kind,
                started_at,
                elapsed_ms: response.elapsed_ms,
                bytes: response.bytes,
                headers: response.headers,
            });
            n.set_references(references);
        }

        Ok(())
    }

    fn persist(
        &mut self,
        url: &str,
        kind: ResultKind,
        started_at: i64,
        response: &FetchResponse,
        references: &References,
    ) -> Result<(), SpiderError> {
        let url_id = self.url_db_id(url)?;
        let fetch_id = self.storage.insert_fetch(&FetchRow {
            run_id: self.run_id,
            url_id,
            datetime: started_at,
            result: kind,
            msec: response.elapsed_ms,
            bytes: response.bytes,
        })?;
        self.storage.insert_headers(fetch_id, &response.headers)?;

        let mut dependencies = Vec::new();
        for (dependency, target) in references.dependencies() {
            dependencies.push((self.url_db_id(target)?, dependency.to_db_string().to_string()));
        }
        self.storage.insert_dependencies(fetch_id, &dependencies)?;

        let mut links = Vec::new();
        for target in references.links() {
            links.push(self.url_db_id(target)?);
        }
        self.storage.insert_links(fetch_id, &links)?;

        Ok(())
    }

    /// Database id for a URL, cached on its registry node
    fn url_db_id(&mut self, raw: &str) -> Result<i64, SpiderError> {
        let node = self.registry.lookup(raw);
        match node.and_then(|n| self.registry.get_mut(n)) {
            Some(node) => {
                if let Some(id) = node.db_id {
                    return Ok(id);
                }
                let id = self.storage.url_id(&node.id)?;
                node.db_id = Some(id);
                Ok(id)
            }
            None => Ok(self.storage.url_id(&canonicalize(raw))?),
        }
    }

    fn checkpoint(&mut self) {
        if let Err(e) = self.storage.commit() {
            warn!("Commit failed, retrying at the next checkpoint: {}", e);
        }
    }
}

/// Runs a complete crawl against the network
///
/// Opens the database named in the configuration, builds the HTTP fetcher,
/// and crawls from `root_url` until a limiting condition is hit.
///
/// # Arguments
///
/// * `config` - The spider configuration
/// * `root_url` - Where the crawl starts
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - The run finished (per-URL failures included)
/// * `Err(SpiderError)` - Storage, client or run setup failed
///
/// # Example
///
/// ```no_run
/// use depspider::config::Config;
/// use depspider::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = run_crawl(&Config::default(), "http://example.com/").await?;
/// println!("{}", summary.stop_reason);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, root_url: &str) -> Result<CrawlSummary, SpiderError> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let fetcher = HttpFetcher::new(config)?;
    let mut coordinator = Coordinator::new(storage, fetcher, &config.crawler, root_url)?;
    Ok(coordinator.run().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TransportOutcome;
    use crate::storage::{
        EdgeKind, EdgeRecord, RunRecord, StorageError, StorageResult, UrlAggregate,
    };
    use crate::url::CanonicalId;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct MockPage {
        status: u16,
        html: Option<&'static str>,
    }

    /// Scripted fetcher: unknown URLs fail to connect
    #[derive(Default)]
    struct MockFetcher {
        pages: HashMap<String, MockPage>,
        calls: RefCell<Vec<(String, bool)>>,
    }

    impl MockFetcher {
        fn page(mut self, url: &str, html: &'static str) -> Self {
            self.pages.insert(
                url.to_string(),
                MockPage {
                    status: 200,
                    html: Some(html),
                },
            );
            self
        }

        fn status(mut self, url: &str, status: u16) -> Self {
            self.pages
                .insert(url.to_string(), MockPage { status, html: None });
            self
        }
    }

    impl Fetcher for MockFetcher {
        async fn fetch(&self, url: &str, allow_body: bool) -> FetchResponse {
            self.calls.borrow_mut().push((url.to_string(), allow_body));

            let Some(page) = self.pages.get(url) else {
                return FetchResponse::failure(
                    TransportOutcome::ConnectFailed("connection refused".to_string()),
                    1,
                );
            };

            let body = match (allow_body, page.html) {
                (true, Some(html)) => Some(html.to_string()),
                _ => None,
            };

            FetchResponse {
                outcome: TransportOutcome::Status(page.status),
                final_url: Some(url.to_string()),
                headers: vec![("content-type".to_string(), "text/html".to_string())],
                bytes: 10 + body.as_ref().map_or(0, |b| b.len() as u64),
                elapsed_ms: 1,
                body,
            }
        }
    }

    fn create_test_config() -> CrawlerConfig {
        CrawlerConfig {
            max_depth: 0,
            ..CrawlerConfig::default()
        }
    }

    fn coordinator(
        fetcher: MockFetcher,
        config: &CrawlerConfig,
    ) -> Coordinator<SqliteStorage, MockFetcher> {
        let storage = SqliteStorage::new_in_memory().unwrap();
        Coordinator::new(storage, fetcher, config, "http://a.test/").unwrap()
    }

    fn fetched_urls(coordinator: &Coordinator<SqliteStorage, MockFetcher>) -> Vec<String> {
        coordinator
            .fetcher
            .calls
            .borrow()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_single_page_run() {
        let fetcher = MockFetcher::default().page("http://a.test/", "<p>no links</p>");
        let mut coordinator = coordinator(fetcher, &create_test_config());

        let summary = coordinator.run().await;

        assert_eq!(summary.stop_reason, StopReason::QueueExhausted);
        assert_eq!(summary.visited, 1);
        assert_eq!(summary.fetched, 1);
        assert_eq!(summary.known, 1);
        assert_eq!(coordinator.storage().fetch_totals(summary.run_id).unwrap().0, 1);
    }

    #[tokio::test]
    async fn test_breadth_first_order() {
        let fetcher = MockFetcher::default()
            .page("http://a.test/", r#"<a href="/a">a</a><a href="/b">b</a>"#)
            .page("http://a.test/a", r#"<a href="/c">c</a>"#)
            .page("http://a.test/b", "")
            .page("http://a.test/c", "");
        let mut coordinator = coordinator(fetcher, &create_test_config());

        coordinator.run().await;

        assert_eq!(
            fetched_urls(&coordinator),
            [
                "http://a.test/",
                "http://a.test/a",
                "http://a.test/b",
                "http://a.test/c"
            ]
        );
    }

    #[tokio::test]
    async fn test_url_budget_stops_run() {
        let fetcher = MockFetcher::default().page(
            "http://a.test/",
            r#"<a href="/1">1</a><a href="/2">2</a><a href="/3">3</a><a href="/4">4</a>"#,
        );
        let config = CrawlerConfig {
            max_urls: 3,
            ..create_test_config()
        };
        let mut coordinator = coordinator(fetcher, &config);

        let summary = coordinator.run().await;

        assert_eq!(summary.stop_reason, StopReason::MaxUrls);
        assert_eq!(summary.visited, 3);
        assert_eq!(fetched_urls(&coordinator).len(), 3);
        assert_eq!(summary.known, 5);
    }

    #[tokio::test]
    async fn test_byte_budget_stops_run() {
        let fetcher = MockFetcher::default()
            .page("http://a.test/", r#"<a href="/1">1</a><a href="/2">2</a>"#)
            .page("http://a.test/1", "");
        let config = CrawlerConfig {
            max_bytes: 1,
            ..create_test_config()
        };
        let mut coordinator = coordinator(fetcher, &config);

        let summary = coordinator.run().await;

        assert_eq!(summary.stop_reason, StopReason::MaxBytes);
        assert_eq!(summary.visited, 1);
    }

    #[tokio::test]
    async fn test_disallowed_host_is_probe_only_leaf() {
        let fetcher = MockFetcher::default()
            .page("http://a.test/", r#"<a href="http://b.test/x">x</a>"#)
            .page("http://b.test/x", r#"<a href="http://b.test/y">y</a>"#);
        let mut coordinator = coordinator(fetcher, &create_test_config());

        let summary = coordinator.run().await;

        assert_eq!(summary.stop_reason, StopReason::QueueExhausted);
        let calls = coordinator.fetcher.calls.borrow().clone();
        assert_eq!(
            calls,
            [
                ("http://a.test/".to_string(), true),
                ("http://b.test/x".to_string(), false)
            ]
        );
        assert!(!coordinator.registry().contains("http://b.test/y"));

        let registry = coordinator.registry();
        let outside = registry.get(registry.lookup("http://b.test/x").unwrap()).unwrap();
        assert!(outside.fetch.is_some());
        assert!(outside.references().is_empty());

        // only the root's link; the HEAD-only fetch adds no edges
        let storage = coordinator.storage();
        let root_id = storage.get_run(summary.run_id).unwrap().root_url_id;
        let edges = storage.run_edges(summary.run_id).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source_url_id, root_id);
        assert_eq!(Some(edges[0].target_url_id), outside.db_id);
    }

    #[tokio::test]
    async fn test_extra_host_is_crawled() {
        let fetcher = MockFetcher::default()
            .page("http://a.test/", r#"<a href="http://cdn.b.test/x">x</a>"#)
            .page("http://cdn.b.test/x", r#"<a href="http://cdn.b.test/y">y</a>"#)
            .page("http://cdn.b.test/y", "");
        let config = CrawlerConfig {
            hosts: vec!["b.test".to_string()],
            ..create_test_config()
        };
        let mut coordinator = coordinator(fetcher, &config);

        coordinator.run().await;

        assert_eq!(fetched_urls(&coordinator).len(), 3);
    }

    #[tokio::test]
    async fn test_first_discovery_fixes_depth() {
        let fetcher = MockFetcher::default()
            .page("http://a.test/", r#"<a href="/a">a</a><a href="/b">b</a>"#)
            .page("http://a.test/a", r#"<a href="/c">c</a>"#)
            .page("http://a.test/b", r#"<a href="/c">c</a><a href="/">home</a>"#)
            .page("http://a.test/c", "");
        let mut coordinator = coordinator(fetcher, &create_test_config());

        coordinator.run().await;

        let registry = coordinator.registry();
        let a = registry.lookup("http://a.test/a").unwrap();
        let c = registry.get(registry.lookup("http://a.test/c").unwrap()).unwrap();
        assert_eq!(c.depth, 2);
        assert_eq!(c.parent, Some(a));

        let root = registry.get(registry.lookup("http://a.test/").unwrap()).unwrap();
        assert_eq!(root.depth, 0);
        assert_eq!(fetched_urls(&coordinator).len(), 4);
    }

    #[tokio::test]
    async fn test_over_depth_node_is_processed_then_run_stops() {
        let fetcher = MockFetcher::default()
            .page("http://a.test/", r#"<a href="/a">a</a>"#)
            .page("http://a.test/a", r#"<a href="/b">b</a>"#)
            .page("http://a.test/b", r#"<a href="/c">c</a>"#)
            .page("http://a.test/c", "");
        let config = CrawlerConfig {
            max_depth: 1,
            ..create_test_config()
        };
        let mut coordinator = coordinator(fetcher, &config);

        let summary = coordinator.run().await;

        assert_eq!(summary.stop_reason, StopReason::MaxDepth);
        assert_eq!(fetched_urls(&coordinator).len(), 3);
        // b was fully processed: its link to c is known and persisted
        assert!(coordinator.registry().contains("http://a.test/c"));
        let edges = coordinator.storage().run_edges(summary.run_id).unwrap();
        assert_eq!(edges.len(), 3);
    }

    #[tokio::test]
    async fn test_unsupported_scheme_skipped() {
        let fetcher = MockFetcher::default().page(
            "http://a.test/",
            r#"<a href="mailto:someone@a.test">mail</a><a href="javascript:void(0)">js</a>"#,
        );
        let mut coordinator = coordinator(fetcher, &create_test_config());

        let summary = coordinator.run().await;

        assert_eq!(summary.visited, 1);
        assert_eq!(summary.known, 3);
        assert_eq!(fetched_urls(&coordinator), ["http://a.test/"]);
        // the link edges are still recorded
        assert_eq!(coordinator.storage().run_edges(summary.run_id).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_is_recorded() {
        let fetcher = MockFetcher::default().page("http://a.test/", r#"<a href="/gone">x</a>"#);
        let mut coordinator = coordinator(fetcher, &create_test_config());

        let summary = coordinator.run().await;
        assert_eq!(summary.fetched, 2);

        let registry = coordinator.registry();
        let gone = registry.get(registry.lookup("http://a.test/gone").unwrap()).unwrap();
        assert_eq!(
            gone.fetch.as_ref().map(|f| f.kind),
            Some(ResultKind::ConnectionError)
        );
    }

    #[tokio::test]
    async fn test_edges_persisted_with_kinds() {
        let fetcher = MockFetcher::default()
            .page(
                "http://a.test/",
                r#"<link rel="stylesheet" href="/s.css"><a href="/p1">p1</a>"#,
            )
            .page("http://a.test/p1", "")
            .status("http://a.test/s.css", 200);
        let mut coordinator = coordinator(fetcher, &create_test_config());

        let summary = coordinator.run().await;

        let storage = coordinator.storage();
        let root_id = storage.get_run(summary.run_id).unwrap().root_url_id;
        let edges = storage.run_edges(summary.run_id).unwrap();
        assert_eq!(edges.len(), 2);
        assert!(edges
            .iter()
            .all(|e| e.source_url_id == root_id));
        assert!(edges
            .iter()
            .any(|e| e.kind == EdgeKind::Dependency("stylesheet".to_string())));
        assert!(edges.iter().any(|e| e.kind == EdgeKind::Link));
    }

    #[tokio::test]
    async fn test_references_stored_on_node() {
        let fetcher = MockFetcher::default()
            .page("http://a.test/", r#"<img src="/logo.png"><a href="/p1">p1</a>"#)
            .status("http://a.test/logo.png", 200)
            .status("http://a.test/p1", 404);
        let mut coordinator = coordinator(fetcher, &create_test_config());

        coordinator.run().await;

        let registry = coordinator.registry();
        let root = registry.get(registry.lookup("http://a.test/").unwrap()).unwrap();
        assert_eq!(root.references().links(), ["http://a.test/p1"]);
        assert_eq!(root.references().dependencies().count(), 1);
    }

    /// SQLite storage that refuses the fetch row of one URL and fails
    /// one commit
    struct FlakyStorage {
        inner: SqliteStorage,
        reject_url: CanonicalId,
        rejected_id: Option<i64>,
        fail_commit: usize,
        commits: Vec<bool>,
    }

    impl FlakyStorage {
        fn busy() -> StorageError {
            StorageError::Sqlite(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
                Some("database is locked".to_string()),
            ))
        }
    }

    impl Storage for FlakyStorage {
        fn url_id(&mut self, id: &CanonicalId) -> StorageResult<i64> {
            let url_id = self.inner.url_id(id)?;
            if *id == self.reject_url {
                self.rejected_id = Some(url_id);
            }
            Ok(url_id)
        }

        fn create_run(&mut self, run: &NewRun) -> StorageResult<i64> {
            self.inner.create_run(run)
        }

        fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
            self.inner.get_run(run_id)
        }

        fn latest_run(&self, offset: i64) -> StorageResult<Option<RunRecord>> {
            self.inner.latest_run(offset)
        }

        fn insert_fetch(&mut self, fetch: &FetchRow) -> StorageResult<i64> {
            if Some(fetch.url_id) == self.rejected_id {
                return Err(Self::busy());
            }
            self.inner.insert_fetch(fetch)
        }

        fn insert_headers(
            &mut self,
            fetch_id: i64,
            headers: &[(String, String)],
        ) -> StorageResult<()> {
            self.inner.insert_headers(fetch_id, headers)
        }

        fn insert_dependencies(
            &mut self,
            fetch_id: i64,
            targets: &[(i64, String)],
        ) -> StorageResult<()> {
            self.inner.insert_dependencies(fetch_id, targets)
        }

        fn insert_links(&mut self, fetch_id: i64, targets: &[i64]) -> StorageResult<()> {
            self.inner.insert_links(fetch_id, targets)
        }

        fn commit(&mut self) -> StorageResult<()> {
            let attempt = self.commits.len();
            if attempt == self.fail_commit {
                self.commits.push(false);
                return Err(Self::busy());
            }
            self.inner.commit()?;
            self.commits.push(true);
            Ok(())
        }

        fn url_aggregates(&self, run_id: i64) -> StorageResult<Vec<UrlAggregate>> {
            self.inner.url_aggregates(run_id)
        }

        fn run_edges(&self, run_id: i64) -> StorageResult<Vec<EdgeRecord>> {
            self.inner.run_edges(run_id)
        }

        fn fetch_totals(&self, run_id: i64) -> StorageResult<(u64, u64)> {
            self.inner.fetch_totals(run_id)
        }
    }

    #[tokio::test]
    async fn test_storage_failures_do_not_end_run() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("crawl.sqlite3");

        let fetcher = MockFetcher::default()
            .page(
                "http://a.test/",
                r#"<a href="/1">1</a><a href="/2">2</a><a href="/3">3</a>"#,
            )
            .page("http://a.test/1", "")
            .page("http://a.test/2", r#"<a href="/4">4</a>"#)
            .page("http://a.test/3", "");
        let storage = FlakyStorage {
            inner: SqliteStorage::new(&db_path).unwrap(),
            reject_url: canonicalize("http://a.test/2"),
            rejected_id: None,
            // commit 0 creates the run; the first checkpoint fails
            fail_commit: 1,
            commits: Vec::new(),
        };
        let config = CrawlerConfig {
            commit_interval: 1,
            ..create_test_config()
        };
        let mut coordinator =
            Coordinator::new(storage, fetcher, &config, "http://a.test/").unwrap();

        let summary = coordinator.run().await;

        // /4 was found on the rejected page and still visited
        assert_eq!(summary.stop_reason, StopReason::QueueExhausted);
        assert_eq!(summary.visited, 5);
        assert_eq!(coordinator.fetcher.calls.borrow().len(), 5);
        let registry = coordinator.registry();
        let rejected = registry.get(registry.lookup("http://a.test/2").unwrap()).unwrap();
        assert!(rejected.fetch.is_none());
        assert_eq!(summary.fetched, 4);

        // the checkpoint after the failed one committed the backlog
        let commits = coordinator.storage().commits.clone();
        assert_eq!(commits[..3], [true, false, true]);
        assert!(commits[2..].iter().all(|ok| *ok));

        drop(coordinator);
        let reopened = SqliteStorage::new(&db_path).unwrap();
        assert_eq!(reopened.fetch_totals(summary.run_id).unwrap().0, 4);
    }
}
