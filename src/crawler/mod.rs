//! Crawler module for the spider's traversal engine
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching (HEAD probe, GET for HTML on allowed hosts)
//! - Reference extraction into links and typed dependencies
//! - The breadth-first frontier and run budgets
//! - Overall crawl coordination and persistence

mod coordinator;
mod extractor;
mod fetcher;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, CrawlSummary};
pub use extractor::extract_references;
pub use fetcher::{
    build_http_client, classify_transport_error, is_html, FetchResponse, Fetcher, HttpFetcher,
};
pub use scheduler::{CrawlBudget, Frontier, StopReason};
