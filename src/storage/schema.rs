//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the depspider database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Every URL ever referenced, one row per decomposed 6-tuple
CREATE TABLE IF NOT EXISTS url (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scheme TEXT NOT NULL,
    host TEXT NOT NULL,
    path TEXT NOT NULL,
    params TEXT NOT NULL,
    query TEXT NOT NULL,
    fragment TEXT NOT NULL,
    UNIQUE(scheme, host, path, params, query, fragment)
);

CREATE INDEX IF NOT EXISTS idx_url_host ON url(host);

-- One row per crawl execution
CREATE TABLE IF NOT EXISTS spider_run (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url_id INTEGER NOT NULL REFERENCES url(id),
    url_max_sec INTEGER NOT NULL,
    start_time INTEGER NOT NULL,
    hosts_allowed TEXT NOT NULL
);

-- Result of fetching one URL during one run
CREATE TABLE IF NOT EXISTS url_fetch (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES spider_run(id),
    url_id INTEGER NOT NULL REFERENCES url(id),
    datetime INTEGER NOT NULL,
    result INTEGER NOT NULL,
    msec INTEGER NOT NULL,
    bytes INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_url_fetch_run ON url_fetch(run_id);
CREATE INDEX IF NOT EXISTS idx_url_fetch_url ON url_fetch(url_id);

CREATE TABLE IF NOT EXISTS url_fetch_header (
    url_fetch_id INTEGER NOT NULL REFERENCES url_fetch(id),
    header TEXT NOT NULL,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_url_fetch_header_fetch ON url_fetch_header(url_fetch_id);

-- Embedded resources a fetched page depends on
CREATE TABLE IF NOT EXISTS url_depend (
    url_fetch_id INTEGER NOT NULL REFERENCES url_fetch(id),
    url_target_id INTEGER NOT NULL REFERENCES url(id),
    kind TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_url_depend_fetch ON url_depend(url_fetch_id);

-- Navigational links out of a fetched page
CREATE TABLE IF NOT EXISTS url_link (
    url_fetch_id INTEGER NOT NULL REFERENCES url_fetch(id),
    url_target_id INTEGER NOT NULL REFERENCES url(id)
);

CREATE INDEX IF NOT EXISTS idx_url_link_fetch ON url_link(url_fetch_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
