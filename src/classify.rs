//! Section classification.
//!
//! Annotates markup nodes with a [`SectionKind`] from structural heuristics.
//! Rules run in a fixed order (tables, media, lists) and never override a
//! kind that is already set, so classifying twice changes nothing.

use crate::dom::predicates::{is_list_tag, is_media_tag};
use crate::dom::{MarkupDom, MarkupNodeId, SectionKind};
use crate::error::{Error, Result};

/// Number of nodes newly annotated by each rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyReport {
    pub tables: usize,
    pub media: usize,
    pub lists: usize,
    pub list_items: usize,
}

/// Classify the subtree under `root` (normally the document).
///
/// Fails with [`Error::MalformedInput`] when `root` is not an element or
/// document node.
pub fn classify(dom: &mut MarkupDom, root: MarkupNodeId) -> Result<ClassifyReport> {
    if root != dom.document() && !dom.is_element(root) {
        return Err(Error::MalformedInput(format!(
            "classification root {root:?} is not an element"
        )));
    }

    let mut report = ClassifyReport::default();
    let elements: Vec<_> = dom
        .descendants(root)
        .filter(|&id| dom.is_element(id))
        .collect();

    for &id in &elements {
        if dom.is_tag(id, "table")
            && is_structured_table(dom, id)
            && dom.set_section(id, SectionKind::Table)
        {
            report.tables += 1;
        }
    }

    for &id in &elements {
        let is_media = dom.element_name(id).is_some_and(|n| is_media_tag(n.as_ref()));
        if is_media
            && let Some(owner) = media_owner(dom, id)
            && dom.set_section(owner, SectionKind::Media)
        {
            report.media += 1;
        }
    }

    for &id in &elements {
        let is_list = dom.element_name(id).is_some_and(|n| is_list_tag(n.as_ref()));
        if !is_list {
            continue;
        }
        if dom.set_section(id, SectionKind::List) {
            report.lists += 1;
        }
        dom.mark_repetitive(id);
        for item in dom.descendants_by_tag(id, "li") {
            if dom.section(item).is_none()
                && !dom.is_single_text(item)
                && dom.set_section(item, SectionKind::ListItem)
            {
                report.list_items += 1;
            }
        }
    }

    log::debug!("classified sections: {report:?}");
    Ok(report)
}

/// A table with more than one row and at least one row of several cells.
fn is_structured_table(dom: &MarkupDom, table: MarkupNodeId) -> bool {
    let cells_per_row: Vec<usize> = dom
        .descendants_by_tag(table, "tr")
        .into_iter()
        .map(|row| {
            dom.element_children(row)
                .filter(|&c| dom.is_tag(c, "td") || dom.is_tag(c, "th"))
                .count()
        })
        .collect();
    cells_per_row.len() > 1 && cells_per_row.iter().any(|&cells| cells != 1)
}

/// The nearest ancestor whose visible text differs from the media node's own.
///
/// An ancestor's text contains the media node's text, so the two differ
/// exactly when the ancestor has more visible characters.
fn media_owner(dom: &MarkupDom, media: MarkupNodeId) -> Option<MarkupNodeId> {
    let own_chars = dom.visible_chars(media);
    dom.ancestors(media)
        .take_while(|&a| a != dom.document())
        .find(|&a| dom.visible_chars(a) > own_chars)
}
