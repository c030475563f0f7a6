//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! Writes are grouped into an implicit transaction that stays open until
//! [`Storage::commit`] is called.

use crate::state::ResultKind;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{EdgeKind, EdgeRecord, FetchRow, NewRun, RunRecord, UrlAggregate};
use crate::url::CanonicalId;
use crate::SpiderError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "r.id, r.url_id, r.url_max_sec, r.start_time, r.hosts_allowed,
     u.scheme, u.host, u.path, u.params, u.query, u.fragment";

/// Per-URL rollup of one run
///
/// `?1` is the run id. Participants are the URLs fetched in the run, the
/// targets of edges recorded by those fetches, and the run's root. A target
/// counts as broken only through a fetch in the same run.
const AGGREGATE_SQL: &str = "
WITH run_fetch AS (
    SELECT id, url_id, result FROM url_fetch WHERE run_id = ?1
),
participant AS (
    SELECT url_id FROM run_fetch
    UNION
    SELECT d.url_target_id FROM url_depend d JOIN run_fetch f ON d.url_fetch_id = f.id
    UNION
    SELECT l.url_target_id FROM url_link l JOIN run_fetch f ON l.url_fetch_id = f.id
    UNION
    SELECT url_id FROM spider_run WHERE id = ?1
),
broken AS (
    SELECT DISTINCT url_id FROM run_fetch WHERE result < 0 OR result >= 400
)
SELECT
    u.id, u.scheme, u.host, u.path, u.params, u.query, u.fragment,
    (SELECT f.result FROM run_fetch f WHERE f.url_id = u.id ORDER BY f.id DESC LIMIT 1),
    EXISTS (
        SELECT 1 FROM run_fetch f
        JOIN url_depend d ON d.url_fetch_id = f.id
        JOIN broken b ON b.url_id = d.url_target_id
        WHERE f.url_id = u.id
    ),
    EXISTS (
        SELECT 1 FROM run_fetch f
        JOIN url_link l ON l.url_fetch_id = f.id
        JOIN broken b ON b.url_id = l.url_target_id
        WHERE f.url_id = u.id
    )
FROM url u
JOIN participant p ON p.url_id = u.id
ORDER BY u.id
";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SpiderError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SpiderError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, SpiderError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Opens a transaction unless one is already open
    fn ensure_transaction(&self) -> StorageResult<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn find_url(&self, id: &CanonicalId) -> StorageResult<Option<i64>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id FROM url WHERE scheme = ?1 AND host = ?2 AND path = ?3
             AND params = ?4 AND query = ?5 AND fragment = ?6",
        )?;
        let found = stmt
            .query_row(
                params![id.scheme, id.host, id.path, id.params, id.query, id.fragment],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found)
    }

    fn select_run(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Option<RunRecord>> {
        let sql = format!(
            "SELECT {} FROM spider_run r JOIN url u ON u.id = r.url_id {}",
            RUN_COLUMNS, filter
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let run = stmt.query_row(params, run_from_row).optional()?;
        Ok(run)
    }
}

fn canonical_from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<CanonicalId> {
    Ok(CanonicalId {
        scheme: row.get(start)?,
        host: row.get(start + 1)?,
        path: row.get(start + 2)?,
        params: row.get(start + 3)?,
        query: row.get(start + 4)?,
        fragment: row.get(start + 5)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        root_url_id: row.get(1)?,
        url_max_sec: row.get::<_, i64>(2)?.max(0) as u64,
        start_time: row.get(3)?,
        hosts_allowed: row.get(4)?,
        root: canonical_from_row(row, 5)?,
    })
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl Storage for SqliteStorage {
    // ===== URL Identity =====

    fn url_id(&mut self, id: &CanonicalId) -> StorageResult<i64> {
        if let Some(existing) = self.find_url(id)? {
            return Ok(existing);
        }

        self.ensure_transaction()?;
        self.conn.execute(
            "INSERT INTO url (scheme, host, path, params, query, fragment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id.scheme, id.host, id.path, id.params, id.query, id.fragment],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ===== Run Management =====

    fn create_run(&mut self, run: &NewRun) -> StorageResult<i64> {
        self.ensure_transaction()?;
        self.conn.execute(
            "INSERT INTO spider_run (url_id, url_max_sec, start_time, hosts_allowed)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                run.root_url_id,
                to_sql_int(run.url_max_sec),
                run.start_time,
                run.hosts_allowed
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.select_run("WHERE r.id = ?1", params![run_id])?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn latest_run(&self, offset: i64) -> StorageResult<Option<RunRecord>> {
        if offset > 0 {
            return Ok(None);
        }
        self.select_run("ORDER BY r.id DESC LIMIT 1 OFFSET ?1", params![-offset])
    }

    // ===== Fetch Results =====

    fn insert_fetch(&mut self, fetch: &FetchRow) -> StorageResult<i64> {
        self.ensure_transaction()?;
        self.conn.execute(
            "INSERT INTO url_fetch (run_id, url_id, datetime, result, msec, bytes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                fetch.run_id,
                fetch.url_id,
                fetch.datetime,
                fetch.result.code(),
                to_sql_int(fetch.msec),
                to_sql_int(fetch.bytes)
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_headers(
        &mut self,
        fetch_id: i64,
        headers: &[(String, String)],
    ) -> StorageResult<()> {
        self.ensure_transaction()?;
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO url_fetch_header (url_fetch_id, header, value) VALUES (?1, ?2, ?3)",
        )?;
        for (header, value) in headers {
            stmt.execute(params![fetch_id, header, value])?;
        }
        Ok(())
    }

    fn insert_dependencies(
        &mut self,
        fetch_id: i64,
        targets: &[(i64, String)],
    ) -> StorageResult<()> {
        self.ensure_transaction()?;
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO url_depend (url_fetch_id, url_target_id, kind) VALUES (?1, ?2, ?3)",
        )?;
        for (target, kind) in targets {
            stmt.execute(params![fetch_id, target, kind])?;
        }
        Ok(())
    }

    fn insert_links(&mut self, fetch_id: i64, targets: &[i64]) -> StorageResult<()> {
        self.ensure_transaction()?;
        let mut stmt = self
            .conn
            .prepare_cached("INSERT INTO url_link (url_fetch_id, url_target_id) VALUES (?1, ?2)")?;
        for target in targets {
            stmt.execute(params![fetch_id, target])?;
        }
        Ok(())
    }

    fn commit(&mut self) -> StorageResult<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    // ===== Reporting =====

    fn url_aggregates(&self, run_id: i64) -> StorageResult<Vec<UrlAggregate>> {
        let mut stmt = self.conn.prepare(AGGREGATE_SQL)?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok(UrlAggregate {
                url_id: row.get(0)?,
                url: canonical_from_row(row, 1)?,
                own: row.get::<_, Option<i64>>(7)?.map(ResultKind::from_code),
                broken_dependency: row.get(8)?,
                broken_link: row.get(9)?,
            })
        })?;

        let mut aggregates = Vec::new();
        for row in rows {
            aggregates.push(row?);
        }
        Ok(aggregates)
    }

    fn run_edges(&self, run_id: i64) -> StorageResult<Vec<EdgeRecord>> {
        let mut edges = Vec::new();

        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT f.url_id, d.url_target_id, d.kind
             FROM url_depend d JOIN url_fetch f ON d.url_fetch_id = f.id
             WHERE f.run_id = ?1
             ORDER BY f.url_id, d.url_target_id",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok(EdgeRecord {
                source_url_id: row.get(0)?,
                target_url_id: row.get(1)?,
                kind: EdgeKind::Dependency(row.get(2)?),
            })
        })?;
        for row in rows {
            edges.push(row?);
        }

        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT f.url_id, l.url_target_id
             FROM url_link l JOIN url_fetch f ON l.url_fetch_id = f.id
             WHERE f.run_id = ?1
             ORDER BY f.url_id, l.url_target_id",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok(EdgeRecord {
                source_url_id: row.get(0)?,
                target_url_id: row.get(1)?,
                kind: EdgeKind::Link,
            })
        })?;
        for row in rows {
            edges.push(row?);
        }

        Ok(edges)
    }

    fn fetch_totals(&self, run_id: i64) -> StorageResult<(u64, u64)> {
        let (count, bytes): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(bytes), 0) FROM url_fetch WHERE run_id = ?1",
            params![run_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((count.max(0) as u64, bytes.max(0) as u64))
    }
}
