//! Semantic tree nodes.

use std::fmt;

use crate::dom::Rank;

/// Numeric node id issued by the [`IdentifierRegistry`](super::IdentifierRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(transparent))]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root is always the first id issued.
    pub const ROOT: NodeId = NodeId(1);

    pub(crate) fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the root node.
pub const ROOT_PATH: &str = "root";

/// One node of a [`SemanticTree`](super::SemanticTree).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct SemanticNode {
    pub id: NodeId,
    /// Structural path of the source element, or `root` for the root.
    pub path: String,
    pub tag: String,
    /// Whitespace-collapsed visible text.
    pub text: String,
    /// Link targets of the element and its descendants.
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub hrefs: Vec<String>,
    pub is_repetitive: bool,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
    pub rank: Option<Rank>,
    /// Attached at a shallower level than its rank distance asked for.
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "std::ops::Not::not"))]
    pub clamped: bool,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
    pub parent: Option<NodeId>,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<NodeId>,
}

impl SemanticNode {
    pub fn new(path: impl Into<String>, tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: NodeId(0),
            path: path.into(),
            tag: tag.into(),
            text: text.into(),
            hrefs: Vec::new(),
            is_repetitive: false,
            rank: None,
            clamped: false,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Text handed to similarity scoring: the node text, or the tag name for
    /// nodes without text.
    pub fn scoring_text(&self) -> &str {
        if self.text.is_empty() {
            &self.tag
        } else {
            &self.text
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
