//! Identifier registry: numeric node ids keyed by structural path.

use std::collections::HashMap;

use super::node::NodeId;

/// Issues dense ids, starting at 1, and remembers the path that earned each.
///
/// One registry belongs to one tree build. Ids are never reused: removing a
/// node from a tree keeps its path resolvable.
#[derive(Debug, Clone, Default)]
pub struct IdentifierRegistry {
    paths: Vec<String>,
    by_path: HashMap<String, NodeId>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id for `path`.
    pub fn next_id(&mut self, path: impl Into<String>) -> NodeId {
        let path = path.into();
        let id = NodeId(self.paths.len() as u32 + 1);
        self.by_path.entry(path.clone()).or_insert(id);
        self.paths.push(path);
        id
    }

    /// The structural path an id was issued for.
    pub fn path_of(&self, id: NodeId) -> Option<&str> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.paths.get(index).map(String::as_str)
    }

    /// The first id issued for `path`.
    pub fn id_of(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// All `(id, path)` pairs in issue order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &str)> + '_ {
        self.paths
            .iter()
            .enumerate()
            .map(|(i, path)| (NodeId(i as u32 + 1), path.as_str()))
    }
}
