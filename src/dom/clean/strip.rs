//! Pass 1: Strip (boilerplate removal)

use super::super::predicates::is_boilerplate_tag;
use super::super::{MarkupData, MarkupDom, MarkupNodeId};
use super::pass::walk_bottom_up;

/// Remove comments, doctypes and boilerplate elements.
///
/// Boilerplate is chrome that never carries page content: stylesheets,
/// navigation, footers, form selects, embedded frames. Elements with a
/// `nav` class are treated like `<nav>`. Returns the number of removed nodes
/// (subtrees count once).
pub fn strip_boilerplate(dom: &mut MarkupDom) -> usize {
    let mut removed = 0;
    walk_bottom_up(dom, |dom, parent_id| {
        let doomed: Vec<_> = dom
            .children(parent_id)
            .filter(|&child| should_strip(dom, child))
            .collect();
        for child in doomed {
            dom.detach(child);
            removed += 1;
        }
    });
    removed
}

fn should_strip(dom: &MarkupDom, id: MarkupNodeId) -> bool {
    match dom.get(id).map(|n| &n.data) {
        Some(MarkupData::Comment(_) | MarkupData::Doctype) => true,
        Some(MarkupData::Element { name, classes, .. }) => {
            is_boilerplate_tag(name.local.as_ref()) || classes.iter().any(|c| c == "nav")
        }
        _ => false,
    }
}
