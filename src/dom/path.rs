//! Structural paths: positional identity strings for markup nodes.
//!
//! A path lists every element from the document element down to the node.
//! Each segment is the tag name, suffixed with `:nth-child(n)` when the
//! element is the n-th (n > 1) sibling carrying the same tag:
//!
//! ```text
//! html > body > div:nth-child(2) > p:nth-child(3)
//! ```

use std::fmt::Write;

use super::arena::{MarkupDom, MarkupNodeId};

const SEPARATOR: &str = " > ";

/// Compute the structural path of `id`.
pub fn structural_path(dom: &MarkupDom, id: MarkupNodeId) -> String {
    let mut elements: Vec<MarkupNodeId> = std::iter::once(id)
        .chain(dom.ancestors(id))
        .filter(|&node| dom.is_element(node))
        .collect();
    elements.reverse();

    let mut path = String::new();
    for node in elements {
        let Some(tag) = dom.element_name(node) else {
            continue;
        };
        if !path.is_empty() {
            path.push_str(SEPARATOR);
        }
        path.push_str(tag.as_ref());
        let index = same_tag_index(dom, node);
        if index > 1 {
            let _ = write!(path, ":nth-child({index})");
        }
    }
    path
}

/// 1-based position of `id` among its siblings with the same tag.
fn same_tag_index(dom: &MarkupDom, id: MarkupNodeId) -> usize {
    let Some(tag) = dom.element_name(id) else {
        return 1;
    };
    let mut index = 1;
    let mut sibling = dom.get(id).map(|n| n.prev_sibling);
    while let Some(prev) = sibling.filter(MarkupNodeId::is_some) {
        if dom.element_name(prev) == Some(tag) {
            index += 1;
        }
        sibling = dom.get(prev).map(|n| n.prev_sibling);
    }
    index
}

/// Resolve a structural path back to the node it was computed from.
pub fn resolve_path(dom: &MarkupDom, path: &str) -> Option<MarkupNodeId> {
    let mut current = dom.document();
    for segment in path.split(SEPARATOR) {
        let (tag, index) = parse_segment(segment)?;
        current = dom
            .element_children(current)
            .filter(|&child| dom.is_tag(child, tag))
            .nth(index - 1)?;
    }
    (current != dom.document()).then_some(current)
}

fn parse_segment(segment: &str) -> Option<(&str, usize)> {
    match segment.split_once(":nth-child(") {
        Some((tag, rest)) => {
            let index: usize = rest.strip_suffix(')')?.parse().ok()?;
            (index >= 1).then_some((tag, index))
        }
        None => Some((segment, 1)),
    }
}
