//! Tree traversal utilities for cleaning passes.

use super::super::{MarkupDom, MarkupNodeId};

/// Walk the tree bottom-up and call `visitor` at each element and the document.
///
/// Children are visited before their parent, so a pass can react to what an
/// earlier visit removed (e.g. prune a container once its children are gone).
/// The visit order is fixed before the walk starts; nodes created by the
/// visitor are not visited.
pub fn walk_bottom_up<F>(dom: &mut MarkupDom, mut visitor: F)
where
    F: FnMut(&mut MarkupDom, MarkupNodeId),
{
    for id in post_order(dom) {
        visitor(dom, id);
    }
}

/// Elements (and the document) in post-order, computed with an explicit stack.
fn post_order(dom: &MarkupDom) -> Vec<MarkupNodeId> {
    let mut order = Vec::new();
    let mut stack = vec![(dom.document(), false)];
    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            order.push(id);
            continue;
        }
        stack.push((id, true));
        let children: Vec<_> = dom.element_children(id).collect();
        stack.extend(children.into_iter().rev().map(|child| (child, false)));
    }
    order
}
