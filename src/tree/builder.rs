//! Tree reconstruction from ranked markup.
//!
//! The builder walks the body in document order and places every ranked
//! boundary node. Where a node goes depends only on its rank compared with
//! the node placed just before it:
//!
//! - a deeper rank nests the node under the previous one;
//! - an equal or shallower rank climbs to the closest placed ancestor whose
//!   rank is strictly smaller, making the node a sibling or an uncle.
//!
//! For contiguous ranks the climb is exactly `level_distance + 1` parent
//! steps. When ranks jump by more than one level the two disagree; the
//! builder keeps the rank comparison, marks the node `clamped` and logs it.

use crate::dom::{MarkupDom, MarkupNodeId, Rank, structural_path};
use crate::error::{Error, Result};

use super::{NodeId, ROOT_PATH, SemanticNode, SemanticTree};

/// Rank of a title or synthetic root: shallower than any stamped rank.
const ROOT_RANK: Rank = Rank(0);

/// Builds a [`SemanticTree`] from a classified, ranked [`MarkupDom`].
pub struct TreeBuilder<'a> {
    dom: &'a MarkupDom,
}

struct Cursor {
    node: NodeId,
    rank: Rank,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(dom: &'a MarkupDom) -> Self {
        Self { dom }
    }

    pub fn build(&self) -> Result<SemanticTree> {
        let body = self
            .dom
            .find_by_tag("body")
            .ok_or_else(|| Error::MalformedInput("document has no body".into()))?;

        let (mut tree, consumed, root_rank) = self.seed_root(body);
        let mut cursor = Cursor {
            node: tree.root(),
            rank: root_rank,
        };

        let mut stack: Vec<MarkupNodeId> = self.element_children_reversed(body);
        while let Some(id) = stack.pop() {
            if Some(id) == consumed {
                continue;
            }
            if self.is_boundary(id)
                && let Some(rank) = self.dom.rank(id)
            {
                let placed = self.place(&mut tree, &cursor, id, rank);
                cursor = Cursor { node: placed, rank };
                continue;
            }
            stack.extend(self.element_children_reversed(id));
        }

        log::debug!("built semantic tree with {} nodes", tree.len());
        Ok(tree)
    }

    /// Root from `<title>`, else the first body `<h1>`, else a synthetic node.
    ///
    /// Returns the tree, the markup node consumed as root (if it lives in the
    /// body) and the rank the root counts as.
    fn seed_root(&self, body: MarkupNodeId) -> (SemanticTree, Option<MarkupNodeId>, Rank) {
        let titled = |id: &MarkupNodeId| self.dom.has_text(*id);

        if let Some(title) = self.dom.find_by_tag("title").filter(titled) {
            let root = SemanticNode::new(ROOT_PATH, "title", self.dom.visible_text(title));
            let tree = SemanticTree::with_root(structural_path(self.dom, title), root);
            return (tree, None, ROOT_RANK);
        }

        if let Some(h1) = self
            .dom
            .descendants_by_tag(body, "h1")
            .into_iter()
            .find(titled)
        {
            let mut root = self.semantic_node(h1);
            root.path = ROOT_PATH.to_string();
            let rank = root.rank.unwrap_or(Rank::FIRST);
            let tree = SemanticTree::with_root(structural_path(self.dom, h1), root);
            return (tree, Some(h1), rank);
        }

        let root = SemanticNode::new(ROOT_PATH, "root", "");
        (SemanticTree::with_root(ROOT_PATH, root), None, ROOT_RANK)
    }

    /// Ranked nodes that become tree nodes: single-text elements and headers.
    fn is_boundary(&self, id: MarkupNodeId) -> bool {
        self.dom.is_header(id) || self.dom.is_single_text(id)
    }

    fn place(
        &self,
        tree: &mut SemanticTree,
        cursor: &Cursor,
        id: MarkupNodeId,
        rank: Rank,
    ) -> NodeId {
        let parent = resolve_parent(tree, cursor.node, rank);
        let literal = literal_walk(tree, cursor.node, cursor.rank, rank);

        let mut node = self.semantic_node(id);
        node.clamped = literal != Some(parent);
        if node.clamped {
            log::debug!(
                "clamped {:?} (rank {}) under node {parent}: rank distance from node {} was {}",
                node.text,
                rank.0,
                cursor.node,
                i64::from(cursor.rank.0) - i64::from(rank.0),
            );
        }
        let path = node.path.clone();
        tree.attach(parent, path, node)
    }

    fn semantic_node(&self, id: MarkupNodeId) -> SemanticNode {
        let tag = self
            .dom
            .element_name(id)
            .map(|n| n.to_string())
            .unwrap_or_default();
        let path = structural_path(self.dom, id);
        let mut node = SemanticNode::new(path, tag, self.dom.visible_text(id));
        node.hrefs = self.dom.hrefs(id);
        node.is_repetitive = self.dom.is_repetitive(id);
        node.rank = self.dom.rank(id);
        node
    }

    fn element_children_reversed(&self, id: MarkupNodeId) -> Vec<MarkupNodeId> {
        let mut children: Vec<_> = self.dom.element_children(id).collect();
        children.reverse();
        children
    }
}

/// Closest node, starting at `current` and climbing, ranked strictly below `rank`.
fn resolve_parent(tree: &SemanticTree, current: NodeId, rank: Rank) -> NodeId {
    std::iter::once(current)
        .chain(tree.ancestors(current))
        .find(|&id| {
            tree.get(id)
                .is_some_and(|n| n.is_root() || n.rank.is_some_and(|r| r < rank))
        })
        .unwrap_or(tree.root())
}

/// The parent the plain rank-distance rule picks, or `None` when the walk
/// runs out of ancestors.
fn literal_walk(
    tree: &SemanticTree,
    current: NodeId,
    current_rank: Rank,
    rank: Rank,
) -> Option<NodeId> {
    let distance = i64::from(current_rank.0) - i64::from(rank.0);
    if distance < 0 {
        return Some(current);
    }
    let mut node = current;
    for _ in 0..=distance {
        node = tree.parent(node)?;
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn build(html: &str) -> SemanticTree {
        SemanticTree::from_html(html).unwrap()
    }

    fn texts(tree: &SemanticTree, id: NodeId) -> Vec<&str> {
        tree.children(id)
            .iter()
            .filter_map(|&c| tree.get(c))
            .map(|n| n.text.as_str())
            .collect()
    }

    #[test]
    fn test_headings_own_their_paragraphs() {
        let tree = build(
            "<h1>Title</h1><h2>Section A</h2><p>First sentence.</p><p>Second sentence.</p>\
             <p>Third sentence.</p><h2>Section B</h2><p>Only sentence.</p>",
        );
        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.text, "Title");
        assert_eq!(root.path, ROOT_PATH);
        assert_eq!(texts(&tree, tree.root()), ["Section A", "Section B"]);

        let sections = tree.children(tree.root());
        assert_eq!(
            texts(&tree, sections[0]),
            ["First sentence.", "Second sentence.", "Third sentence."]
        );
        assert_eq!(texts(&tree, sections[1]), ["Only sentence."]);
        assert!(tree.iter().all(|n| !n.clamped));
    }

    #[test]
    fn test_title_element_seeds_root() {
        let tree = build("<title>Page title</title><h1>Heading</h1><p>Body text</p>");
        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.text, "Page title");
        assert_eq!(tree.path_of(tree.root()), Some("html > head > title"));
        assert_eq!(texts(&tree, tree.root()), ["Heading"]);
        let heading = tree.children(tree.root())[0];
        assert_eq!(texts(&tree, heading), ["Body text"]);
    }

    #[test]
    fn test_synthetic_root_without_title_or_h1() {
        let tree = build("<p>Just a paragraph</p>");
        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.text, "");
        assert_eq!(tree.path_of(tree.root()), Some(ROOT_PATH));
        assert_eq!(texts(&tree, tree.root()), ["Just a paragraph"]);
    }

    #[test]
    fn test_nodes_carry_paths_links_and_repetition() {
        let tree = build(
            "<title>T</title><h2>Links</h2><ul><li>Read <a href='/docs'>the docs</a> first</li></ul>",
        );
        let list = tree
            .iter()
            .find(|n| n.tag == "ul")
            .expect("single-item list is a boundary node");
        assert!(list.is_repetitive);
        assert_eq!(list.hrefs, ["/docs"]);
        assert_eq!(list.text, "Read the docs first");
        assert_eq!(tree.id_of_path(&list.path), Some(list.id));
    }

    #[test]
    fn test_rank_jump_is_clamped() {
        // List items rank two below the heading, so climbing back out of the
        // list overshoots the literal rank distance
        let tree = build(
            "<title>T</title><h2>Fruits</h2><ul><li><b>Apple</b><p>Red and crunchy</p></li></ul>\
             <h2>Vegetables</h2>",
        );
        let fruits = tree.children(tree.root())[0];
        assert_eq!(texts(&tree, fruits), ["Apple"]);

        let veg = tree.iter().find(|n| n.text == "Vegetables").unwrap();
        assert_eq!(veg.parent, Some(tree.root()));
        assert!(veg.clamped);
        assert!(tree.validate().is_empty());
    }

    #[test]
    fn test_missing_body_is_malformed() {
        let dom = crate::dom::MarkupDom::new();
        assert!(matches!(
            TreeBuilder::new(&dom).build(),
            Err(Error::MalformedInput(_))
        ));
        // html5ever always synthesizes a body
        let parsed = parse_html("");
        assert!(TreeBuilder::new(&parsed).build().is_ok());
    }
}
