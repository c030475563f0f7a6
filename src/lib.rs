//! depspider: a broken-link and broken-dependency web spider
//!
//! This crate crawls a site breadth-first from a root URL, records every fetch
//! together with the links and embedded resources each page references, and
//! renders a per-run status graph that highlights pages with broken links,
//! broken dependencies, HTTP errors or connection failures.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for depspider operations
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Crawl run could not be started: {0}")]
    RunInit(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid root URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias for depspider operations
pub type Result<T> = std::result::Result<T, SpiderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use output::NodeStatus;
pub use state::{DependencyKind, ReferenceKind, ResultKind, UrlNode};
pub use url::{canonicalize, CanonicalId, HostMask, UrlRegistry};
