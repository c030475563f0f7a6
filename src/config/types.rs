use serde::Deserialize;

/// User agent sent when no other is configured
pub const DEFAULT_AGENT: &str = "Mozilla/5.0 (compatible; MSIE 9.0; Windows NT 6.1; Trident/5.0)";

/// Largest response body read for link extraction
pub const DEFAULT_MAX_CONTENT_SIZE: u64 = 1024 * 1024;

/// Main configuration structure for depspider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler budgets and traversal settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum discovery depth; 0 means unlimited
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum URLs to visit; 0 means unlimited
    #[serde(rename = "max-urls")]
    pub max_urls: u64,

    /// Maximum bytes to transfer; 0 means unlimited
    #[serde(rename = "max-bytes")]
    pub max_bytes: u64,

    /// Per-URL timeout in seconds
    #[serde(rename = "url-timeout")]
    pub url_timeout: u64,

    /// Extra host suffixes to traverse besides the root host
    pub hosts: Vec<String>,

    /// Number of processed URLs between partial commits
    #[serde(rename = "commit-interval")]
    pub commit_interval: u32,

    /// Response bodies are truncated to this many bytes
    #[serde(rename = "max-content-size")]
    pub max_content_size: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 30,
            max_urls: 0,
            max_bytes: 0,
            url_timeout: 5,
            hosts: Vec::new(),
            commit_interval: 20,
            max_content_size: DEFAULT_MAX_CONTENT_SIZE,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Full User-Agent header value
    pub agent: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            agent: DEFAULT_AGENT.to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "crawl.sqlite3".to_string(),
        }
    }
}
