//! Frontier and budgets for a crawl run
//!
//! This module handles:
//! - The FIFO frontier of discovered-but-unvisited URLs
//! - URL, byte and depth budgets
//! - Deciding which limiting condition ended a run

use crate::config::CrawlerConfig;
use crate::state::NodeId;
use std::collections::VecDeque;
use std::fmt;

/// Why a crawl run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Nothing left to visit
    QueueExhausted,

    /// The URL budget was reached
    MaxUrls,

    /// The byte budget was reached
    MaxBytes,

    /// A visited URL was deeper than the depth limit
    MaxDepth,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::QueueExhausted => "no more URLs to visit",
            Self::MaxUrls => "maximum number of URLs reached",
            Self::MaxBytes => "maximum number of bytes reached",
            Self::MaxDepth => "maximum depth exceeded",
        };
        write!(f, "{}", text)
    }
}

/// Budgets for one run; `0` means unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlBudget {
    pub max_urls: u64,
    pub max_bytes: u64,
    pub max_depth: u32,
}

impl CrawlBudget {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_urls: config.max_urls,
            max_bytes: config.max_bytes,
            max_depth: config.max_depth,
        }
    }

    /// Checks the budgets that are evaluated before each dequeue
    pub fn exhausted(&self, visited: u64, bytes: u64) -> Option<StopReason> {
        if self.max_urls > 0 && visited >= self.max_urls {
            return Some(StopReason::MaxUrls);
        }
        if self.max_bytes > 0 && bytes >= self.max_bytes {
            return Some(StopReason::MaxBytes);
        }
        None
    }

    /// Returns true if a node at `depth` is past the depth limit
    pub fn depth_exceeded(&self, depth: u32) -> bool {
        self.max_depth > 0 && depth > self.max_depth
    }
}

/// Breadth-first frontier
///
/// Holds registry indices in discovery order. Visit-once is enforced by the
/// registry: a URL is only pushed when its node is created.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<NodeId>,
}

impl Frontier {
    /// Creates a frontier seeded with the root
    pub fn new(root: NodeId) -> Self {
        Self {
            queue: VecDeque::from([root]),
        }
    }

    pub fn push(&mut self, node: NodeId) {
        self.queue.push_back(node);
    }

    pub fn pop(&mut self) -> Option<NodeId> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Picks the next node to visit, or the reason the run must stop
    ///
    /// An empty queue wins over the budgets.
    pub fn next(
        &mut self,
        budget: &CrawlBudget,
        visited: u64,
        bytes: u64,
    ) -> Result<NodeId, StopReason> {
        if self.is_empty() {
            return Err(StopReason::QueueExhausted);
        }
        if let Some(reason) = budget.exhausted(visited, bytes) {
            return Err(reason);
        }
        self.pop().ok_or(StopReason::QueueExhausted)
    }
}
