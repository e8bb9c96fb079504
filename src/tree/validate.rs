//! Structural validation.
//!
//! Detects the problems a hand-edited or corrupted tree could have:
//! - a missing root, or a root with a parent
//! - child references to nodes that are not in the tree
//! - parent links that disagree with child lists
//! - nodes listed twice (cycles, shared children)
//! - orphaned nodes unreachable from the root
//! - nodes whose id has no registered path

use std::collections::HashSet;
use std::fmt;

use super::{NodeId, SemanticTree};

/// One structural problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeIssue {
    MissingRoot,
    RootHasParent(NodeId),
    /// A child list names a node that does not exist.
    DanglingChild { parent: NodeId, child: NodeId },
    /// A child's parent link points elsewhere.
    ParentMismatch {
        child: NodeId,
        listed_under: NodeId,
        parent: Option<NodeId>,
    },
    /// A node reached twice from the root.
    Revisited(NodeId),
    Orphan(NodeId),
    /// Stored under a slot that does not match its id.
    MisplacedId { slot: usize, id: NodeId },
    Unregistered(NodeId),
}

impl fmt::Display for TreeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeIssue::MissingRoot => write!(f, "tree has no root"),
            TreeIssue::RootHasParent(parent) => write!(f, "root has parent {parent}"),
            TreeIssue::DanglingChild { parent, child } => {
                write!(f, "node {parent} lists missing child {child}")
            }
            TreeIssue::ParentMismatch {
                child,
                listed_under,
                parent,
            } => match parent {
                Some(parent) => write!(
                    f,
                    "node {child} is listed under {listed_under} but its parent is {parent}"
                ),
                None => write!(f, "node {child} is listed under {listed_under} but has no parent"),
            },
            TreeIssue::Revisited(id) => write!(f, "node {id} is reachable more than once"),
            TreeIssue::Orphan(id) => write!(f, "node {id} is not reachable from the root"),
            TreeIssue::MisplacedId { slot, id } => write!(f, "slot {slot} holds node {id}"),
            TreeIssue::Unregistered(id) => write!(f, "node {id} has no registered path"),
        }
    }
}

pub(super) fn validate(tree: &SemanticTree) -> Vec<TreeIssue> {
    let mut issues = Vec::new();

    for (slot, node) in tree.slots().iter().enumerate() {
        let Some(node) = node else {
            continue;
        };
        if node.id.index() != Some(slot) {
            issues.push(TreeIssue::MisplacedId { slot, id: node.id });
        }
        if tree.path_of(node.id).is_none() {
            issues.push(TreeIssue::Unregistered(node.id));
        }
    }

    let Some(root) = tree.get(tree.root()) else {
        issues.push(TreeIssue::MissingRoot);
        return issues;
    };
    if let Some(parent) = root.parent {
        issues.push(TreeIssue::RootHasParent(parent));
    }

    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut stack = vec![root.id];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            issues.push(TreeIssue::Revisited(id));
            continue;
        }
        let Some(node) = tree.get(id) else {
            continue;
        };
        for &child in &node.children {
            match tree.get(child) {
                None => issues.push(TreeIssue::DanglingChild { parent: id, child }),
                Some(child_node) => {
                    if child_node.parent != Some(id) {
                        issues.push(TreeIssue::ParentMismatch {
                            child,
                            listed_under: id,
                            parent: child_node.parent,
                        });
                    }
                    stack.push(child);
                }
            }
        }
    }

    for node in tree.slots().iter().flatten() {
        if !visited.contains(&node.id) {
            issues.push(TreeIssue::Orphan(node.id));
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::super::{ROOT_PATH, SemanticNode};
    use super::*;

    fn tree_with_child() -> SemanticTree {
        let mut tree = SemanticTree::with_root(ROOT_PATH, SemanticNode::new(ROOT_PATH, "title", "T"));
        tree.attach(NodeId::ROOT, "a", SemanticNode::new("a", "p", "Child text"));
        tree
    }

    #[test]
    fn test_built_tree_is_valid() {
        assert!(tree_with_child().validate().is_empty());
    }

    #[test]
    fn test_detects_broken_links() {
        let mut tree = tree_with_child();
        // Cut the child off from the root and point a dangling reference at id 9
        if let Some(root) = tree.get_mut(NodeId::ROOT) {
            root.children = vec![NodeId(9)];
        }
        let issues = tree.validate();
        assert!(issues.contains(&TreeIssue::DanglingChild {
            parent: NodeId::ROOT,
            child: NodeId(9)
        }));
        assert!(issues.contains(&TreeIssue::Orphan(NodeId(2))));
    }

    #[test]
    fn test_detects_cycles() {
        let mut tree = tree_with_child();
        if let Some(child) = tree.get_mut(NodeId(2)) {
            child.children.push(NodeId::ROOT);
        }
        let issues = tree.validate();
        assert!(issues.iter().any(|i| matches!(i, TreeIssue::Revisited(NodeId(1)))));
        assert!(issues.iter().any(|i| matches!(i, TreeIssue::ParentMismatch { .. })));
    }
}
