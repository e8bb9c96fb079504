//! Markup cleaning passes.
//!
//! Cleaning turns scraped HTML into the shape the classifier and rank
//! assigner expect. All passes mutate the arena in place and report how many
//! nodes they touched.
//!
//! ## Pipeline Order
//!
//! 1. **Strip** - Remove comments, doctype and boilerplate elements
//! 2. **Scripts** - Graft markup rendered by scripts, drop the scripts
//! 3. **Unwrap** - Replace `<font>` by its children
//! 4. **Vacuum** - Remove structural whitespace noise
//! 5. **Wrap Mixed Content** - Give loose inline runs an element of their own
//! 6. **Prune** - Remove elements emptied by previous passes (cascading)

mod pass;
mod prune;
mod script;
mod strip;
mod unwrap;
mod vacuum;
mod wrap;

pub use wrap::WRAPPER_TAG;

use super::MarkupDom;

/// Node counts touched by each cleaning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub stripped: usize,
    pub scripts_converted: usize,
    pub unwrapped: usize,
    pub vacuumed: usize,
    pub wrapped: usize,
    pub pruned: usize,
}

/// Run all cleaning passes on a parsed document.
pub fn clean(dom: &mut MarkupDom) -> CleanReport {
    let report = CleanReport {
        stripped: strip::strip_boilerplate(dom),
        scripts_converted: script::convert_scripts(dom),
        unwrapped: unwrap::unwrap_font(dom),
        vacuumed: vacuum::vacuum(dom),
        wrapped: wrap::wrap_mixed_content(dom),
        pruned: prune::prune_empty(dom),
    };
    log::debug!("cleaned markup: {report:?}");
    report
}
