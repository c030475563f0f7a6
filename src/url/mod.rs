//! URL handling module for depspider
//!
//! This module provides URL canonicalization, the registry that interns URLs
//! to crawl nodes, and the allow-host mask that decides which hosts are
//! traversed.

mod canonical;
mod host;
mod registry;

// Re-export main types
pub use canonical::{canonicalize, CanonicalId};
pub use host::HostMask;
pub use registry::UrlRegistry;
