//! Text extraction over the markup arena.
//!
//! A *text run* is a maximal stretch of text that is not interrupted by a
//! block-level element. Inline elements (`a`, `b`, `span`, ...) are part of
//! the run that surrounds them, so `<p>see <a>this</a> page</p>` has one run.
//!
//! Run counts, visible character counts and heading counts are summarized
//! for every node in one bottom-up pass and cached on the arena, so the
//! structural queries used while ranking and building stay constant time
//! on deeply nested pages.

use super::arena::{MarkupData, MarkupDom, MarkupNodeId};
use super::predicates::{heading_level, is_inline_tag};
use crate::util::push_collapsed;

/// How the text of a node sequence splits into runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// No block boundary inside; `text` if any visible character was seen.
    Flat { text: bool },
    /// Open text before the first boundary, closed runs between boundaries,
    /// open text after the last one.
    Split { head: bool, inner: usize, tail: bool },
}

impl Shape {
    const EMPTY: Shape = Shape::Flat { text: false };

    /// The shape of `self` followed by `next`.
    fn then(self, next: Shape) -> Shape {
        match (self, next) {
            (Shape::Flat { text: a }, Shape::Flat { text: b }) => Shape::Flat { text: a || b },
            (Shape::Flat { text }, Shape::Split { head, inner, tail }) => Shape::Split {
                head: text || head,
                inner,
                tail,
            },
            (Shape::Split { head, inner, tail }, Shape::Flat { text }) => Shape::Split {
                head,
                inner,
                tail: tail || text,
            },
            (
                Shape::Split { head, inner, tail },
                Shape::Split {
                    head: next_head,
                    inner: next_inner,
                    tail: next_tail,
                },
            ) => Shape::Split {
                head,
                inner: inner + next_inner + usize::from(tail || next_head),
                tail: next_tail,
            },
        }
    }

    fn runs(self) -> usize {
        match self {
            Shape::Flat { text } => usize::from(text),
            Shape::Split { head, inner, tail } => usize::from(head) + inner + usize::from(tail),
        }
    }
}

/// Text summary of everything below one node.
#[derive(Debug, Clone, Copy)]
pub(super) struct TextStats {
    content: Shape,
    /// Non-whitespace characters in the node's runs.
    visible_chars: usize,
    /// Heading elements among the descendants, saturating at two.
    headings: u8,
    /// The only heading descendant when `headings == 1`.
    heading: MarkupNodeId,
}

impl Default for TextStats {
    fn default() -> Self {
        Self {
            content: Shape::EMPTY,
            visible_chars: 0,
            headings: 0,
            heading: MarkupNodeId::NONE,
        }
    }
}

impl TextStats {
    /// Summaries for every allocated node, detached subtrees included.
    pub(super) fn compute(dom: &MarkupDom) -> Vec<TextStats> {
        let mut stats = vec![TextStats::default(); dom.len()];
        let roots = (0..dom.len() as u32)
            .map(MarkupNodeId)
            .filter(|&id| dom.parent(id).is_none());
        for root in roots {
            let order: Vec<_> = std::iter::once(root).chain(dom.descendants(root)).collect();
            // Reverse pre-order sees every child before its parent
            for &id in order.iter().rev() {
                let summary = dom
                    .children(id)
                    .fold(TextStats::default(), |acc, child| acc.then(dom, child, &stats));
                stats[id.0 as usize] = summary;
            }
        }
        stats
    }

    /// Extend the summary with `child`, whose own summary is already known.
    fn then(mut self, dom: &MarkupDom, child: MarkupNodeId, stats: &[TextStats]) -> Self {
        let Some(node) = dom.get(child) else {
            return self;
        };
        let below = stats[child.0 as usize];
        match &node.data {
            MarkupData::Text(text) => {
                let visible = text.chars().filter(|c| !c.is_whitespace()).count();
                self.content = self.content.then(Shape::Flat { text: visible > 0 });
                self.visible_chars += visible;
            }
            MarkupData::Element { name, .. } => {
                let tag = name.local.as_ref();
                if tag != "br" {
                    let outer = if is_inline_tag(tag) {
                        below.content
                    } else {
                        Shape::Split {
                            head: false,
                            inner: below.content.runs(),
                            tail: false,
                        }
                    };
                    self.content = self.content.then(outer);
                    self.visible_chars += below.visible_chars;
                }
                let (count, only) = if heading_level(tag).is_some() {
                    (below.headings.saturating_add(1), child)
                } else {
                    (below.headings, below.heading)
                };
                if count > 0 {
                    self.heading = if self.headings == 0 && count == 1 {
                        only
                    } else {
                        MarkupNodeId::NONE
                    };
                    self.headings = self.headings.saturating_add(count).min(2);
                }
            }
            _ => {}
        }
        self
    }
}

enum Step {
    Enter(MarkupNodeId),
    CloseBlock,
}

impl MarkupDom {
    /// Whitespace-collapsed text runs below `id`, in document order.
    pub fn text_runs(&self, id: MarkupNodeId) -> Vec<String> {
        let mut runs = Vec::new();
        let mut current = String::new();
        let mut stack: Vec<Step> = self.children_reversed(id).map(Step::Enter).collect();

        while let Some(step) = stack.pop() {
            let node_id = match step {
                Step::CloseBlock => {
                    flush_run(&mut current, &mut runs);
                    continue;
                }
                Step::Enter(node_id) => node_id,
            };
            let Some(node) = self.get(node_id) else {
                continue;
            };
            match &node.data {
                MarkupData::Text(text) => push_collapsed(&mut current, text),
                MarkupData::Element { name, .. } => {
                    let tag = name.local.as_ref();
                    if tag == "br" {
                        push_collapsed(&mut current, " ");
                    } else if is_inline_tag(tag) {
                        stack.extend(self.children_reversed(node_id).map(Step::Enter));
                    } else {
                        flush_run(&mut current, &mut runs);
                        stack.push(Step::CloseBlock);
                        stack.extend(self.children_reversed(node_id).map(Step::Enter));
                    }
                }
                _ => {}
            }
        }
        flush_run(&mut current, &mut runs);
        runs
    }

    fn children_reversed(&self, id: MarkupNodeId) -> impl Iterator<Item = MarkupNodeId> + '_ {
        let mut children: Vec<_> = self.children(id).collect();
        children.reverse();
        children.into_iter()
    }

    /// The node's text runs joined by single spaces.
    pub fn visible_text(&self, id: MarkupNodeId) -> String {
        self.text_runs(id).join(" ")
    }

    fn stats(&self, id: MarkupNodeId) -> TextStats {
        self.text_stats()
            .get(id.0 as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Number of text runs below `id`; same as `text_runs(id).len()`.
    pub fn run_count(&self, id: MarkupNodeId) -> usize {
        self.stats(id).content.runs()
    }

    /// Non-whitespace characters in the node's visible text.
    pub fn visible_chars(&self, id: MarkupNodeId) -> usize {
        self.stats(id).visible_chars
    }

    /// Whether `visible_text(id)` would be non-empty.
    pub fn has_text(&self, id: MarkupNodeId) -> bool {
        self.visible_chars(id) > 0
    }

    /// An element whose only content is one text run longer than two characters.
    pub fn is_single_text(&self, id: MarkupNodeId) -> bool {
        if !self.is_element(id) || self.run_count(id) != 1 {
            return false;
        }
        // Two visible characters may still be three with a space between
        self.visible_chars(id) > 2 || self.visible_text(id).chars().count() > 2
    }

    /// Heading level if `id` reads as a heading.
    ///
    /// That is either an `h1`..`h6` with text, or an element containing
    /// exactly one heading whose text is all of the element's text.
    pub fn heading_level(&self, id: MarkupNodeId) -> Option<u8> {
        let tag = self.element_name(id)?;
        if let Some(level) = heading_level(tag.as_ref()) {
            return self.has_text(id).then_some(level);
        }

        let stats = self.stats(id);
        if stats.headings != 1 || stats.visible_chars == 0 {
            return None;
        }
        // The heading's runs are part of the element's runs, so equal counts
        // mean the texts are equal
        let level = heading_level(self.element_name(stats.heading)?.as_ref())?;
        (self.visible_chars(stats.heading) == stats.visible_chars).then_some(level)
    }

    /// Hyperlink targets of `id` and its descendants, in document order.
    pub fn hrefs(&self, id: MarkupNodeId) -> Vec<String> {
        std::iter::once(id)
            .chain(self.descendants(id))
            .filter_map(|n| self.get_attr(n, "href"))
            .map(str::to_string)
            .collect()
    }
}

fn flush_run(current: &mut String, runs: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        runs.push(trimmed.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::super::parse_html;

    #[test]
    fn test_inline_elements_join_runs() {
        let dom = parse_html("<p>see <a href='/x'>this</a> page</p>");
        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(dom.text_runs(p), vec!["see this page"]);
        assert!(dom.is_single_text(p));
        assert_eq!(dom.hrefs(p), vec!["/x"]);
    }

    #[test]
    fn test_block_elements_split_runs() {
        let dom = parse_html("<div>Intro<p>First para</p><p>Second para</p></div>");
        let div = dom.find_by_tag("div").unwrap();
        assert_eq!(dom.text_runs(div), vec!["Intro", "First para", "Second para"]);
        assert!(!dom.is_single_text(div));
        assert_eq!(dom.visible_text(div), "Intro First para Second para");
    }

    #[test]
    fn test_short_text_is_not_single_text() {
        let dom = parse_html("<p>ok</p>");
        let p = dom.find_by_tag("p").unwrap();
        assert!(!dom.is_single_text(p));
    }

    #[test]
    fn test_whitespace_collapsed() {
        let dom = parse_html("<p>  lots\n\n of\t space  </p>");
        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(dom.visible_text(p), "lots of space");
    }

    #[test]
    fn test_heading_level_direct_and_wrapped() {
        let dom = parse_html("<h2>Direct</h2><div id='w'><h3>Wrapped</h3></div><h4></h4>");
        let h2 = dom.find_by_tag("h2").unwrap();
        let div = dom.find_by_tag("div").unwrap();
        let h4 = dom.find_by_tag("h4").unwrap();
        assert_eq!(dom.heading_level(h2), Some(2));
        assert_eq!(dom.heading_level(div), Some(3));
        assert_eq!(dom.heading_level(h4), None);
    }

    #[test]
    fn test_run_counts_match_text_runs() {
        let dom = parse_html(
            "<div>lead <b>bold</b><p>one</p> mid <span>x<p>two</p>y</span>\
             <br>after<ul><li>a</li><li> </li></ul><!-- note --> tail</div>\
             <section><h2>T</h2>body<em></em></section>",
        );
        for id in dom.descendants(dom.document()) {
            assert_eq!(dom.run_count(id), dom.text_runs(id).len(), "{id:?}");
            assert_eq!(dom.has_text(id), !dom.visible_text(id).is_empty(), "{id:?}");
        }
    }

    #[test]
    fn test_summaries_follow_edits() {
        let mut dom = parse_html("<div><p>Alpha text</p></div>");
        let div = dom.find_by_tag("div").unwrap();
        assert!(dom.is_single_text(div));

        let extra = dom.create_html_element("p");
        dom.append(div, extra);
        dom.append_text(extra, "Beta text");
        assert_eq!(dom.run_count(div), 2);
        assert!(!dom.is_single_text(div));

        dom.detach(extra);
        assert!(dom.is_single_text(div));
    }

    #[test]
    fn test_two_characters_with_space_are_single_text() {
        let dom = parse_html("<p>a b</p><p>ab</p>");
        let ps = dom.descendants_by_tag(dom.document(), "p");
        assert!(dom.is_single_text(ps[0]));
        assert!(!dom.is_single_text(ps[1]));
    }

    #[test]
    fn test_wrapper_with_two_headings_is_not_heading() {
        let dom = parse_html("<div><h3>One</h3><h4>Two</h4></div><div><h2><em>Nested</em></h2></div>");
        let divs = dom.descendants_by_tag(dom.document(), "div");
        assert_eq!(dom.heading_level(divs[0]), None);
        assert_eq!(dom.heading_level(divs[1]), Some(2));
    }

    #[test]
    fn test_wrapper_with_extra_text_is_not_heading() {
        let dom = parse_html("<div><h3>Title</h3><p>and body text</p></div>");
        let div = dom.find_by_tag("div").unwrap();
        assert_eq!(dom.heading_level(div), None);
    }
}
