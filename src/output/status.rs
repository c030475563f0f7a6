//! Per-URL display status for a finished run
//!
//! Statuses are derived only from persisted state, through the per-URL
//! aggregates the storage layer computes. Problems propagate exactly one hop:
//! a page is flagged for a broken dependency or link target, never for
//! something further away.

use crate::state::ResultKind;
use crate::storage::UrlAggregate;
use std::fmt;

/// Display status of one URL in one run
///
/// Variants are listed in legend order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeStatus {
    Ok,
    NotFetched,
    LinkError,
    DependencyError,
    ServerError,
    ConnectionError,
}

impl NodeStatus {
    pub const ALL: [NodeStatus; 6] = [
        NodeStatus::Ok,
        NodeStatus::NotFetched,
        NodeStatus::LinkError,
        NodeStatus::DependencyError,
        NodeStatus::ServerError,
        NodeStatus::ConnectionError,
    ];

    /// Resolves the status of a URL from its run aggregate
    ///
    /// # Precedence
    ///
    /// | Order | Condition | Status |
    /// |-------|-----------|--------|
    /// | 1 | own result is 4xx/5xx | `ServerError` |
    /// | 2 | a dependency target failed | `DependencyError` |
    /// | 3 | a link target failed | `LinkError` |
    /// | 4 | own result is connect error or timeout | `ConnectionError` |
    /// | 5 | not fetched in this run | `NotFetched` |
    /// | 6 | otherwise | `Ok` |
    pub fn resolve(aggregate: &UrlAggregate) -> Self {
        match aggregate.own {
            Some(ResultKind::ClientOrServerError(_)) => Self::ServerError,
            _ if aggregate.broken_dependency => Self::DependencyError,
            _ if aggregate.broken_link => Self::LinkError,
            Some(ResultKind::ConnectionError | ResultKind::Timeout) => Self::ConnectionError,
            None | Some(ResultKind::NotFetched) => Self::NotFetched,
            Some(ResultKind::Ok(_)) => Self::Ok,
        }
    }

    /// Graphviz fill color; `None` keeps the graph's default node color
    pub fn color(&self) -> Option<&'static str> {
        match self {
            Self::Ok => None,
            Self::NotFetched => Some("gray90"),
            Self::LinkError => Some("yellow2"),
            Self::DependencyError => Some("orange"),
            Self::ServerError => Some("firebrick1"),
            Self::ConnectionError => Some("mediumorchid2"),
        }
    }

    /// Legend text
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotFetched => "Not Fetched",
            Self::LinkError => "Broken Link(s)",
            Self::DependencyError => "Dependency Error(s)",
            Self::ServerError => "4xx/5xx Error",
            Self::ConnectionError => "Connect/Timeout",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
