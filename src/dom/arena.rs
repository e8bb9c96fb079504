//! Arena-based markup tree.
//!
//! html5ever parses into this arena; the cleaning, classification and rank
//! passes then annotate it in place. Nodes carry explicit annotation fields
//! (`section`, `rank`, `repetitive`, `header`) instead of stashing values in
//! the attribute list.

use std::cell::OnceCell;

use html5ever::{LocalName, QualName};

use super::text::TextStats;

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkupNodeId(pub u32);

impl MarkupNodeId {
    /// Sentinel value for no node.
    pub const NONE: MarkupNodeId = MarkupNodeId(u32::MAX);

    /// Check if this is a valid node ID.
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Structural classification attached by the section classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "kebab-case"))]
pub enum SectionKind {
    Table,
    Media,
    List,
    ListItem,
    /// Markup recovered from a `<script>` body during cleaning.
    Script,
}

impl SectionKind {
    /// Kinds whose first header-like child is promoted before ranking the rest.
    pub fn promotes_header(self) -> bool {
        matches!(
            self,
            SectionKind::Media | SectionKind::ListItem | SectionKind::Script
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Table => "table",
            SectionKind::Media => "media",
            SectionKind::List => "list",
            SectionKind::ListItem => "list-item",
            SectionKind::Script => "script",
        }
    }
}

/// Logical nesting level stamped on boundary nodes.
///
/// Ranks are only compared, never interpreted as depths: a gap between two
/// ranks carries no meaning beyond ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Rank(pub u32);

impl Rank {
    pub const FIRST: Rank = Rank(1);

    /// The rank one level deeper.
    pub fn next(self) -> Rank {
        Rank(self.0.saturating_add(1))
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum MarkupData {
    /// Document root.
    Document,
    /// Element with name and attributes.
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        /// Pre-extracted classes for boilerplate matching.
        classes: Vec<String>,
    },
    /// Text content.
    Text(String),
    /// Comment (removed by cleaning but needed for TreeSink).
    Comment(String),
    /// Document type declaration.
    Doctype,
}

/// HTML attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct MarkupNode {
    pub data: MarkupData,
    pub parent: MarkupNodeId,
    pub first_child: MarkupNodeId,
    pub last_child: MarkupNodeId,
    pub prev_sibling: MarkupNodeId,
    pub next_sibling: MarkupNodeId,
    pub section: Option<SectionKind>,
    pub rank: Option<Rank>,
    pub repetitive: bool,
    /// Stamped as a heading or promoted header during ranking.
    pub header: bool,
}

impl MarkupNode {
    fn new(data: MarkupData) -> Self {
        Self {
            data,
            parent: MarkupNodeId::NONE,
            first_child: MarkupNodeId::NONE,
            last_child: MarkupNodeId::NONE,
            prev_sibling: MarkupNodeId::NONE,
            next_sibling: MarkupNodeId::NONE,
            section: None,
            rank: None,
            repetitive: false,
            header: false,
        }
    }
}

/// Arena-allocated markup tree.
///
/// All nodes are stored in a contiguous vector; parent/child/sibling links
/// are indices into it. Detached nodes stay allocated but unreachable.
#[derive(Debug, Clone)]
pub struct MarkupDom {
    nodes: Vec<MarkupNode>,
    document: MarkupNodeId,
    /// Per-node text summaries, dropped by every structural or text edit.
    text_stats: OnceCell<Vec<TextStats>>,
}

impl MarkupDom {
    /// Create a new empty DOM with a document root.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: MarkupNodeId::NONE,
            text_stats: OnceCell::new(),
        };
        dom.document = dom.alloc(MarkupNode::new(MarkupData::Document));
        dom
    }

    fn alloc(&mut self, node: MarkupNode) -> MarkupNodeId {
        self.text_stats.take();
        let id = MarkupNodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the document root ID.
    pub fn document(&self) -> MarkupNodeId {
        self.document
    }

    pub fn get(&self, id: MarkupNodeId) -> Option<&MarkupNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    /// Mutable access to a node. Invalidates the cached text summaries.
    pub fn get_mut(&mut self, id: MarkupNodeId) -> Option<&mut MarkupNode> {
        self.text_stats.take();
        self.annotation_mut(id)
    }

    /// Mutable access for annotations, which never change text.
    fn annotation_mut(&mut self, id: MarkupNodeId) -> Option<&mut MarkupNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    pub(super) fn text_stats(&self) -> &[TextStats] {
        self.text_stats.get_or_init(|| TextStats::compute(self))
    }

    /// Create a new, unattached element node.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> MarkupNodeId {
        let classes = attrs
            .iter()
            .find(|a| a.name.local.as_ref() == "class")
            .map(|a| a.value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        self.alloc(MarkupNode::new(MarkupData::Element {
            name,
            attrs,
            classes,
        }))
    }

    /// Create an element in the HTML namespace with no attributes.
    pub fn create_html_element(&mut self, local: &str) -> MarkupNodeId {
        let name = QualName::new(None, html5ever::ns!(html), LocalName::from(local));
        self.create_element(name, Vec::new())
    }

    pub fn create_text(&mut self, text: String) -> MarkupNodeId {
        self.alloc(MarkupNode::new(MarkupData::Text(text)))
    }

    pub fn create_comment(&mut self, text: String) -> MarkupNodeId {
        self.alloc(MarkupNode::new(MarkupData::Comment(text)))
    }

    pub fn create_doctype(&mut self) -> MarkupNodeId {
        self.alloc(MarkupNode::new(MarkupData::Doctype))
    }

    /// Append a child to a parent node.
    pub fn append(&mut self, parent: MarkupNodeId, child: MarkupNodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(MarkupNodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
            child_node.next_sibling = MarkupNodeId::NONE;
        }

        if last_child.is_some()
            && let Some(last_node) = self.get_mut(last_child)
        {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a node before a sibling.
    pub fn insert_before(&mut self, sibling: MarkupNodeId, new_node: MarkupNodeId) {
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Append text to the last child if it is a text node, or create a new one.
    pub fn append_text(&mut self, parent: MarkupNodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(MarkupNodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let MarkupData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Unlink a node from its parent and siblings. The subtree below it is kept.
    pub fn detach(&mut self, id: MarkupNodeId) {
        let (parent, prev, next) = match self.get(id) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = MarkupNodeId::NONE;
            node.prev_sibling = MarkupNodeId::NONE;
            node.next_sibling = MarkupNodeId::NONE;
        }
    }

    /// Move every child of `node` to the end of `new_parent`.
    pub fn reparent_children(&mut self, node: MarkupNodeId, new_parent: MarkupNodeId) {
        let children: Vec<_> = self.children(node).collect();
        for child in children {
            self.detach(child);
            self.append(new_parent, child);
        }
    }

    /// Replace an element by its children, keeping their position.
    pub fn unwrap(&mut self, id: MarkupNodeId) {
        let children: Vec<_> = self.children(id).collect();
        for child in children {
            self.detach(child);
            self.insert_before(id, child);
        }
        self.detach(id);
    }

    /// Merge runs of adjacent text children of `parent` into single nodes.
    pub fn merge_adjacent_text(&mut self, parent: MarkupNodeId) {
        let children: Vec<_> = self.children(parent).collect();
        let mut previous_text: Option<MarkupNodeId> = None;
        for child in children {
            let Some(text) = self.text_content(child).map(str::to_string) else {
                previous_text = None;
                continue;
            };
            match previous_text {
                Some(prev) => {
                    if let Some(node) = self.get_mut(prev)
                        && let MarkupData::Text(ref mut existing) = node.data
                    {
                        existing.push_str(&text);
                    }
                    self.detach(child);
                }
                None => previous_text = Some(child),
            }
        }
    }

    /// Deep-copy the subtree at `source` in `other` and append it under `parent`.
    ///
    /// Returns the id of the copied subtree root in this arena.
    pub fn import_subtree(
        &mut self,
        other: &MarkupDom,
        source: MarkupNodeId,
        parent: MarkupNodeId,
    ) -> Option<MarkupNodeId> {
        let source_node = other.get(source)?;
        let root = self.alloc(MarkupNode::new(source_node.data.clone()));
        self.append(parent, root);

        let mut stack = vec![(source, root)];
        while let Some((from, to)) = stack.pop() {
            for child in other.children(from) {
                let Some(child_node) = other.get(child) else {
                    continue;
                };
                let copy = self.alloc(MarkupNode::new(child_node.data.clone()));
                self.append(to, copy);
                stack.push((child, copy));
            }
        }
        Some(root)
    }

    /// Number of allocated nodes, including detached ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the DOM is empty (only has document root).
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn parent(&self, id: MarkupNodeId) -> Option<MarkupNodeId> {
        self.get(id).map(|n| n.parent).filter(MarkupNodeId::is_some)
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: MarkupNodeId) -> ChildrenIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(MarkupNodeId::NONE);
        ChildrenIter {
            dom: self,
            current: first,
        }
    }

    /// Iterate over element children only.
    pub fn element_children(&self, parent: MarkupNodeId) -> impl Iterator<Item = MarkupNodeId> + '_ {
        self.children(parent).filter(|&c| self.is_element(c))
    }

    /// Pre-order iterator over the descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: MarkupNodeId) -> Descendants<'_> {
        let mut stack = Vec::new();
        self.push_children_reversed(id, &mut stack);
        Descendants { dom: self, stack }
    }

    /// Iterator over the ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: MarkupNodeId) -> Ancestors<'_> {
        Ancestors {
            dom: self,
            current: self.parent(id),
        }
    }

    fn push_children_reversed(&self, id: MarkupNodeId, stack: &mut Vec<MarkupNodeId>) {
        let mut child = self
            .get(id)
            .map(|n| n.last_child)
            .unwrap_or(MarkupNodeId::NONE);
        while child.is_some() {
            stack.push(child);
            child = self
                .get(child)
                .map(|n| n.prev_sibling)
                .unwrap_or(MarkupNodeId::NONE);
        }
    }

    /// Find the first descendant of the document matching a predicate (DFS).
    pub fn find<F>(&self, predicate: F) -> Option<MarkupNodeId>
    where
        F: Fn(&MarkupNode) -> bool,
    {
        self.descendants(self.document)
            .find(|&id| self.get(id).is_some_and(&predicate))
    }

    /// Find element by tag name (first match in document order).
    pub fn find_by_tag(&self, tag: &str) -> Option<MarkupNodeId> {
        self.find(|node| match &node.data {
            MarkupData::Element { name, .. } => name.local.as_ref() == tag,
            _ => false,
        })
    }

    /// All descendant elements of `id` with the given tag, in document order.
    pub fn descendants_by_tag(&self, id: MarkupNodeId, tag: &str) -> Vec<MarkupNodeId> {
        self.descendants(id)
            .filter(|&d| self.element_name(d).is_some_and(|n| n.as_ref() == tag))
            .collect()
    }
}

impl Default for MarkupDom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    dom: &'a MarkupDom,
    current: MarkupNodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = MarkupNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .dom
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(MarkupNodeId::NONE);
        Some(id)
    }
}

/// Pre-order descendant iterator backed by an explicit stack.
pub struct Descendants<'a> {
    dom: &'a MarkupDom,
    stack: Vec<MarkupNodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = MarkupNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.dom.push_children_reversed(id, &mut self.stack);
        Some(id)
    }
}

/// Iterator walking parent links.
pub struct Ancestors<'a> {
    dom: &'a MarkupDom,
    current: Option<MarkupNodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = MarkupNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.dom.parent(id);
        Some(id)
    }
}

/// Element accessors and annotation setters.
impl MarkupDom {
    /// Get element's local name (tag).
    pub fn element_name(&self, id: MarkupNodeId) -> Option<&LocalName> {
        self.get(id).and_then(|n| match &n.data {
            MarkupData::Element { name, .. } => Some(&name.local),
            _ => None,
        })
    }

    /// Check whether `id` is an element with the given tag.
    pub fn is_tag(&self, id: MarkupNodeId, tag: &str) -> bool {
        self.element_name(id).is_some_and(|n| n.as_ref() == tag)
    }

    /// Get an attribute value.
    pub fn get_attr(&self, id: MarkupNodeId, attr_name: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            MarkupData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.local.as_ref() == attr_name)
                .map(|a| a.value.as_str()),
            _ => None,
        })
    }

    /// Get element's classes.
    pub fn element_classes(&self, id: MarkupNodeId) -> &[String] {
        static EMPTY: &[String] = &[];
        self.get(id)
            .and_then(|n| match &n.data {
                MarkupData::Element { classes, .. } => Some(classes.as_slice()),
                _ => None,
            })
            .unwrap_or(EMPTY)
    }

    pub fn is_element(&self, id: MarkupNodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, MarkupData::Element { .. }))
    }

    pub fn is_text(&self, id: MarkupNodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, MarkupData::Text(_)))
    }

    /// Get text content of a text node.
    pub fn text_content(&self, id: MarkupNodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            MarkupData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn section(&self, id: MarkupNodeId) -> Option<SectionKind> {
        self.get(id).and_then(|n| n.section)
    }

    /// Set the section kind unless one is already present.
    ///
    /// Returns `true` if the kind was written.
    pub fn set_section(&mut self, id: MarkupNodeId, kind: SectionKind) -> bool {
        match self.annotation_mut(id) {
            Some(node) if node.section.is_none() => {
                node.section = Some(kind);
                true
            }
            _ => false,
        }
    }

    pub fn rank(&self, id: MarkupNodeId) -> Option<Rank> {
        self.get(id).and_then(|n| n.rank)
    }

    /// Stamp a rank; a node is stamped at most once.
    ///
    /// Returns `true` if the rank was written.
    pub fn set_rank(&mut self, id: MarkupNodeId, rank: Rank) -> bool {
        match self.annotation_mut(id) {
            Some(node) if node.rank.is_none() => {
                node.rank = Some(rank);
                true
            }
            _ => false,
        }
    }

    pub fn is_repetitive(&self, id: MarkupNodeId) -> bool {
        self.get(id).is_some_and(|n| n.repetitive)
    }

    pub fn mark_repetitive(&mut self, id: MarkupNodeId) {
        if let Some(node) = self.annotation_mut(id) {
            node.repetitive = true;
        }
    }

    pub fn is_header(&self, id: MarkupNodeId) -> bool {
        self.get(id).is_some_and(|n| n.header)
    }

    pub fn mark_header(&mut self, id: MarkupNodeId) {
        if let Some(node) = self.annotation_mut(id) {
            node.header = true;
        }
    }
}
