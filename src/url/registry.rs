use crate::state::{NodeId, UrlNode};
use crate::url::canonical::{canonicalize, CanonicalId};
use std::collections::HashMap;

/// Interns URLs to nodes, one node per canonical identity
///
/// The first call to [`UrlRegistry::intern`] for an identity decides the
/// node's depth and parent. Later calls return the same node untouched, even
/// when they come from a shallower page.
#[derive(Debug, Default)]
pub struct UrlRegistry {
    nodes: Vec<UrlNode>,
    index: HashMap<CanonicalId, NodeId>,
}

impl UrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node for `raw`, creating it on first sight
    ///
    /// # Returns
    ///
    /// The node id and whether this call created it
    pub fn intern(&mut self, raw: &str, depth: u32, parent: Option<NodeId>) -> (NodeId, bool) {
        let id = canonicalize(raw);
        if let Some(existing) = self.index.get(&id) {
            return (*existing, false);
        }

        let node_id = NodeId(self.nodes.len());
        self.nodes
            .push(UrlNode::new(raw.to_string(), id.clone(), depth, parent));
        self.index.insert(id, node_id);
        (node_id, true)
    }

    /// Looks up an already interned URL
    pub fn lookup(&self, raw: &str) -> Option<NodeId> {
        self.index.get(&canonicalize(raw)).copied()
    }

    pub fn get(&self, id: NodeId) -> Option<&UrlNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut UrlNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.lookup(raw).is_some()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &UrlNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Number of nodes that have a fetch record
    pub fn fetched_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_fetched()).count()
    }
}
