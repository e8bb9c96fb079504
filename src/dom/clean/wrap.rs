//! Pass 5: Wrap mixed content (inline/block normalization)

use super::super::predicates::{is_inline_tag, is_preformatted_tag};
use super::super::{MarkupDom, MarkupNodeId};
use super::pass::walk_bottom_up;

/// Tag of the synthetic element wrapped around loose inline runs.
pub const WRAPPER_TAG: &str = "span";

/// Wrap consecutive inline children in a `<span>` when they are siblings
/// of block elements.
///
/// Loose text next to blocks has no element of its own to be placed in the
/// semantic tree:
///
/// ```text
/// Before: li > ["Fruit", ul > [...]]
/// After:  li > [span > ["Fruit"], ul > [...]]
/// ```
///
/// Returns the number of wrappers created.
pub fn wrap_mixed_content(dom: &mut MarkupDom) -> usize {
    let mut wrapped = 0;
    walk_bottom_up(dom, |dom, parent_id| {
        wrapped += wrap_mixed_children(dom, parent_id);
    });
    wrapped
}

fn wrap_mixed_children(dom: &mut MarkupDom, parent_id: MarkupNodeId) -> usize {
    let Some(tag) = dom.element_name(parent_id) else {
        return 0;
    };
    if is_inline_tag(tag.as_ref()) || is_preformatted_tag(tag.as_ref()) {
        return 0;
    }

    let children: Vec<(MarkupNodeId, bool)> = dom
        .children(parent_id)
        .map(|child| (child, is_inline_child(dom, child)))
        .collect();
    let has_block = children
        .iter()
        .any(|&(child, inline)| !inline && dom.is_element(child));
    if !has_block {
        return 0;
    }

    let mut runs: Vec<Vec<MarkupNodeId>> = Vec::new();
    let mut current: Vec<MarkupNodeId> = Vec::new();
    for (child, inline) in children {
        if inline {
            current.push(child);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    let mut created = 0;
    for run in runs {
        if run.iter().all(|&c| is_blank_text(dom, c)) {
            continue;
        }
        let wrapper = dom.create_html_element(WRAPPER_TAG);
        dom.insert_before(run[0], wrapper);
        for child in run {
            dom.detach(child);
            dom.append(wrapper, child);
        }
        created += 1;
    }
    created
}

fn is_inline_child(dom: &MarkupDom, id: MarkupNodeId) -> bool {
    dom.is_text(id)
        || dom
            .element_name(id)
            .is_some_and(|name| is_inline_tag(name.as_ref()))
}

fn is_blank_text(dom: &MarkupDom, id: MarkupNodeId) -> bool {
    dom.text_content(id).is_some_and(|t| t.trim().is_empty())
}
