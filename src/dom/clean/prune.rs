//! Pass 6: Prune empty elements (cascading)

use super::super::predicates::{is_media_tag, is_void_tag};
use super::super::{MarkupDom, MarkupNodeId};
use super::pass::walk_bottom_up;

/// Remove elements that have no content.
///
/// Runs bottom-up, so a container whose children were all pruned is pruned
/// in turn. Void and media elements, anchors, link targets and table cells
/// are kept: they are meaningful without text. Returns the number of
/// removed elements.
pub fn prune_empty(dom: &mut MarkupDom) -> usize {
    let mut removed = 0;
    walk_bottom_up(dom, |dom, id| {
        if is_prunable(dom, id) {
            dom.detach(id);
            removed += 1;
        }
    });
    removed
}

fn is_prunable(dom: &MarkupDom, id: MarkupNodeId) -> bool {
    let Some(tag) = dom.element_name(id) else {
        return false;
    };
    let tag = tag.as_ref();
    if matches!(tag, "html" | "head" | "body" | "tr" | "td" | "th")
        || is_void_tag(tag)
        || is_media_tag(tag)
    {
        return false;
    }
    if dom.get_attr(id, "href").is_some() || dom.get_attr(id, "id").is_some() {
        return false;
    }
    dom.children(id)
        .all(|child| dom.text_content(child).is_some_and(|t| t.trim().is_empty()))
}
