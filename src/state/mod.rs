//! State module for the in-memory crawl graph
//!
//! # Components
//!
//! - `UrlNode`: a URL known to the crawl, with its depth, fetch record and references
//! - `References`: the finalized link and dependency sets of a page
//! - `ResultKind`: the classified outcome of a fetch

mod node;
mod result;

// Re-export main types
pub use node::{DependencyKind, NodeId, ReferenceKind, References, ReferencesBuilder, UrlNode};
pub use result::{FetchRecord, ResultKind, TransportOutcome};
