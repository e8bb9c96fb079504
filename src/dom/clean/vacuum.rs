//! Pass 4: Vacuum (structural whitespace culling)

use std::collections::HashSet;

use super::super::predicates::{is_inline_tag, is_preformatted_tag};
use super::super::{MarkupDom, MarkupNodeId};
use super::pass::walk_bottom_up;

/// Remove whitespace-only text nodes that are structurally irrelevant.
///
/// Indentation between block tags parses as text. It is removed unless it
/// sits inside preformatted content, inside an inline element, or between
/// two pieces of inline content where it separates words. Returns the
/// number of removed nodes.
pub fn vacuum(dom: &mut MarkupDom) -> usize {
    let preformatted = preformatted_elements(dom);
    let mut removed = 0;
    walk_bottom_up(dom, |dom, parent_id| {
        if preformatted.contains(&parent_id) || !is_structural_parent(dom, parent_id) {
            return;
        }
        let doomed: Vec<_> = dom
            .children(parent_id)
            .filter(|&child| should_vacuum(dom, child))
            .collect();
        for child in doomed {
            dom.detach(child);
            removed += 1;
        }
    });
    removed
}

/// Preformatted elements and everything inside them.
fn preformatted_elements(dom: &MarkupDom) -> HashSet<MarkupNodeId> {
    let mut inside = HashSet::new();
    let mut stack = vec![dom.document()];
    while let Some(id) = stack.pop() {
        let is_pre = dom
            .element_name(id)
            .is_some_and(|name| is_preformatted_tag(name.as_ref()));
        if is_pre {
            inside.insert(id);
            inside.extend(dom.descendants(id));
        } else {
            stack.extend(dom.element_children(id));
        }
    }
    inside
}

fn is_structural_parent(dom: &MarkupDom, id: MarkupNodeId) -> bool {
    if id == dom.document() {
        return true;
    }
    dom.element_name(id)
        .is_some_and(|tag| !is_inline_tag(tag.as_ref()))
}

fn should_vacuum(dom: &MarkupDom, id: MarkupNodeId) -> bool {
    let Some(text) = dom.text_content(id) else {
        return false;
    };
    if !text.trim().is_empty() {
        return false;
    }
    let Some(node) = dom.get(id) else {
        return false;
    };
    !(is_inline_content(dom, node.prev_sibling) && is_inline_content(dom, node.next_sibling))
}

/// Non-blank text or an inline element.
fn is_inline_content(dom: &MarkupDom, id: MarkupNodeId) -> bool {
    if let Some(text) = dom.text_content(id) {
        return !text.trim().is_empty();
    }
    dom.element_name(id)
        .is_some_and(|name| is_inline_tag(name.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::super::super::parse_html;
    use super::*;

    #[test]
    fn test_removes_indentation_between_blocks() {
        let mut dom = parse_html("<ul>\n  <li>One</li>\n  <li>Two</li>\n</ul>");
        assert!(vacuum(&mut dom) >= 3);
        let ul = dom.find_by_tag("ul").unwrap();
        assert!(dom.children(ul).all(|c| dom.is_element(c)));
    }

    #[test]
    fn test_keeps_space_between_inline_elements() {
        let mut dom = parse_html("<div><b>Hello</b> <i>World</i></div>");
        vacuum(&mut dom);
        let div = dom.find_by_tag("div").unwrap();
        assert_eq!(dom.children(div).count(), 3);
        assert_eq!(dom.visible_text(div), "Hello World");
    }

    #[test]
    fn test_keeps_preformatted_whitespace() {
        let mut dom = parse_html("<pre><code>a</code>\n\n<code>b</code>\n</pre>");
        vacuum(&mut dom);
        let pre = dom.find_by_tag("pre").unwrap();
        assert_eq!(dom.children(pre).count(), 4);
    }
}
