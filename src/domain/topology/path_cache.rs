use std::collections::HashMap;

use crate::domain::utils::id::NodeId;

/// Last successfully used path per (source, destination) pair.
///
/// Entries are candidates only. The cache does not follow capacity changes, so
/// whoever reads an entry must re-validate it against the current residual state.
#[derive(Debug, Clone, Default)]
pub struct PathCache {
    entries: HashMap<(NodeId, NodeId), Vec<NodeId>>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, source: NodeId, destination: NodeId) -> Option<&[NodeId]> {
        self.entries.get(&(source, destination)).map(Vec::as_slice)
    }

    /// Stores `path`, replacing any previous entry for the pair.
    pub fn store(&mut self, source: NodeId, destination: NodeId, path: Vec<NodeId>) {
        if let Some(previous) = self.entries.insert((source, destination), path) {
            log::trace!("PathCache: replaced entry {} -> {} ({} nodes)", source, destination, previous.len());
        }
    }

    pub fn invalidate(&mut self, source: NodeId, destination: NodeId) -> Option<Vec<NodeId>> {
        self.entries.remove(&(source, destination))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
