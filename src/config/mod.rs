//! Configuration module for depspider
//!
//! Settings come from an optional TOML file; command-line flags override
//! individual values before the crawl starts.
//!
//! # Example
//!
//! ```no_run
//! use depspider::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("depspider.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, UserAgentConfig, DEFAULT_AGENT, DEFAULT_MAX_CONTENT_SIZE,
};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default, parse_config};
pub use validation::{validate, validate_host_entry};
