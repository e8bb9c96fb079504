//! The semantic tree.
//!
//! A [`SemanticTree`] is an arena of [`SemanticNode`]s indexed by
//! [`NodeId`]. Nodes reference their parent and children by id only, so
//! cloning a tree is a plain deep copy with no aliasing between copies. The
//! tree owns the [`IdentifierRegistry`] of the build that produced it.

mod builder;
mod node;
mod registry;
mod render;
mod validate;

pub use builder::TreeBuilder;
pub use node::{NodeId, ROOT_PATH, SemanticNode};
pub use registry::IdentifierRegistry;
pub use validate::TreeIssue;

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::classify::classify;
use crate::dom::{self, MarkupDom};
use crate::error::{Error, Result};
use crate::rank::assign_ranks;
use crate::util::decode_text;

/// Logical content hierarchy of one document.
#[derive(Debug, Clone)]
pub struct SemanticTree {
    /// Slot `i` holds the node with id `i + 1`; removed nodes leave `None`.
    nodes: Vec<Option<SemanticNode>>,
    registry: IdentifierRegistry,
}

impl SemanticTree {
    /// Create a tree holding only `root`, registered under `registry_path`.
    pub(crate) fn with_root(registry_path: impl Into<String>, mut root: SemanticNode) -> Self {
        let mut registry = IdentifierRegistry::new();
        root.id = registry.next_id(registry_path);
        root.parent = None;
        root.children.clear();
        Self {
            nodes: vec![Some(root)],
            registry,
        }
    }

    /// Attach `node` as the last child of `parent` and issue its id.
    pub(crate) fn attach(
        &mut self,
        parent: NodeId,
        registry_path: impl Into<String>,
        mut node: SemanticNode,
    ) -> NodeId {
        let id = self.registry.next_id(registry_path);
        node.id = id;
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(Some(node));
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.push(id);
        }
        id
    }

    /// Parse, clean and structure an HTML document.
    pub fn from_html(html: &str) -> Result<Self> {
        let mut dom = dom::parse_html(html);
        dom::clean::clean(&mut dom);
        Self::from_markup(dom)
    }

    /// Decode raw bytes (UTF-8, then `encoding`, then windows-1252) and build.
    pub fn from_bytes(bytes: &[u8], encoding: Option<&str>) -> Result<Self> {
        Self::from_html(&decode_text(bytes, encoding))
    }

    /// Read and build an HTML file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, None)
    }

    /// Classify, rank and build an already cleaned document.
    pub fn from_markup(mut dom: MarkupDom) -> Result<Self> {
        let root = dom.document();
        classify(&mut dom, root)?;
        assign_ranks(&mut dom, root)?;
        TreeBuilder::new(&dom).build()
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&SemanticNode> {
        self.nodes.get(id.index()?)?.as_ref()
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut SemanticNode> {
        self.nodes.get_mut(id.index()?)?.as_mut()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(SemanticNode::is_leaf)
    }

    /// Ancestors of `id`, nearest first, ending at the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nodes in pre-order (document order), starting at the root.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            tree: self,
            stack: vec![self.root()],
        }
    }

    /// Leaves in document order. The root is never a leaf.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|n| !n.is_root() && n.is_leaf())
            .map(|n| n.id)
            .collect()
    }

    /// The structural path the id was issued for.
    ///
    /// Removed nodes keep resolving: ids are never reused within a build.
    pub fn path_of(&self, id: NodeId) -> Option<&str> {
        self.registry.path_of(id)
    }

    pub fn id_of_path(&self, path: &str) -> Option<NodeId> {
        self.registry.id_of(path)
    }

    pub fn registry(&self) -> &IdentifierRegistry {
        &self.registry
    }

    /// Remove a leaf. Inner nodes and the root are not removable.
    pub fn remove_leaf(&mut self, id: NodeId) -> Result<SemanticNode> {
        let node = self
            .get(id)
            .ok_or_else(|| Error::MalformedInput(format!("node {id} is not in the tree")))?;
        let Some(parent) = node.parent.filter(|_| node.is_leaf()) else {
            return Err(Error::MalformedInput(format!("node {id} is not a leaf")));
        };
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.retain(|&c| c != id);
        }
        let slot = id.index().and_then(|i| self.nodes.get_mut(i));
        slot.and_then(Option::take)
            .ok_or_else(|| Error::MalformedInput(format!("node {id} is not in the tree")))
    }

    /// Copy of the tree keeping only `leaves`, their ancestors and the root.
    ///
    /// Ids not in the tree are ignored.
    pub fn retain_leaves(&self, leaves: &[NodeId]) -> SemanticTree {
        let mut keep: HashSet<NodeId> = HashSet::from([self.root()]);
        for &leaf in leaves.iter().filter(|&&id| self.contains(id)) {
            keep.insert(leaf);
            keep.extend(self.ancestors(leaf));
        }

        let mut copy = self.clone();
        for slot in &mut copy.nodes {
            let Some(node) = slot else {
                continue;
            };
            if keep.contains(&node.id) {
                node.children.retain(|c| keep.contains(c));
            } else {
                *slot = None;
            }
        }
        copy
    }

    /// ASCII outline, one `id:text` line per node.
    pub fn render(&self) -> String {
        render::render(self)
    }

    /// Structural problems; empty for every tree produced by the builder.
    pub fn validate(&self) -> Vec<TreeIssue> {
        validate::validate(self)
    }

    pub(crate) fn slots(&self) -> &[Option<SemanticNode>] {
        &self.nodes
    }
}

impl fmt::Display for SemanticTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(feature = "cli")]
impl serde::Serialize for SemanticTree {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

/// Pre-order node iterator.
pub struct Iter<'a> {
    tree: &'a SemanticTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a SemanticNode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.stack.pop()?;
            let Some(node) = self.tree.get(id) else {
                continue;
            };
            self.stack.extend(node.children.iter().rev());
            return Some(node);
        }
    }
}
