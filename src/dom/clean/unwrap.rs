//! Pass 3: Unwrap presentational wrappers

use super::super::MarkupDom;

/// Replace every `<font>` element by its children.
///
/// The text around the unwrapped element is merged back together so that
/// `a<font>b</font>c` becomes a single text node. Returns the number of
/// unwrapped elements.
pub fn unwrap_font(dom: &mut MarkupDom) -> usize {
    let fonts = dom.descendants_by_tag(dom.document(), "font");
    let count = fonts.len();
    // Innermost first so nested fonts unwrap into their final parent
    for font in fonts.into_iter().rev() {
        let Some(parent) = dom.parent(font) else {
            continue;
        };
        dom.unwrap(font);
        dom.merge_adjacent_text(parent);
    }
    count
}
