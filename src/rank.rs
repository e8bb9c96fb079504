//! Rank assignment.
//!
//! A single pre-order pass stamps *boundary* nodes (headings, promoted
//! section headers and single-text elements) with a [`Rank`]. Ranks encode
//! logical nesting: a node ranked deeper than the node placed before it is
//! nested under it by the tree builder, anything else becomes a sibling or
//! climbs back up.
//!
//! The pass uses an explicit frame stack, so deeply nested documents cannot
//! exhaust the call stack.

use crate::dom::{MarkupDom, MarkupNodeId, Rank};
use crate::error::{Error, Result};

/// Stamp ranks on the subtree under `root`, starting at [`Rank::FIRST`].
///
/// Returns the rank that would follow the subtree. Fails with
/// [`Error::MalformedInput`] when `root` is not an element or document.
pub fn assign_ranks(dom: &mut MarkupDom, root: MarkupNodeId) -> Result<Rank> {
    RankAssigner::new(dom).run(root)
}

/// Depth-first rank stamper.
pub struct RankAssigner<'a> {
    dom: &'a mut MarkupDom,
    /// Headings whose section is still open, as `(level, rank)`, levels
    /// strictly increasing from bottom to top.
    open_headings: Vec<(u8, Rank)>,
}

enum Visit {
    /// The node is finished; the rank for its next sibling.
    Done(Rank),
    /// The node's children still need visiting.
    Descend(Frame),
}

struct Frame {
    children: Vec<MarkupNodeId>,
    next: usize,
    rank: Rank,
    /// Children of a section start one rank deeper than the section and do
    /// not thread their result to the next child.
    sectioned: bool,
    /// Promoted header, already stamped.
    header: Option<MarkupNodeId>,
}

impl Frame {
    fn new(dom: &MarkupDom, id: MarkupNodeId, rank: Rank) -> Self {
        Self {
            children: dom.element_children(id).collect(),
            next: 0,
            rank,
            sectioned: false,
            header: None,
        }
    }

    fn next_child(&mut self) -> Option<MarkupNodeId> {
        let child = self.children.get(self.next).copied()?;
        self.next += 1;
        Some(child)
    }

    fn absorb(&mut self, result: Rank) {
        if !self.sectioned {
            self.rank = result;
        }
    }
}

impl<'a> RankAssigner<'a> {
    pub fn new(dom: &'a mut MarkupDom) -> Self {
        Self {
            dom,
            open_headings: Vec::new(),
        }
    }

    pub fn run(mut self, root: MarkupNodeId) -> Result<Rank> {
        if root != self.dom.document() && !self.dom.is_element(root) {
            return Err(Error::MalformedInput(format!(
                "rank root {root:?} is not an element"
            )));
        }

        let mut stack = match self.visit(root, Rank::FIRST) {
            Visit::Done(rank) => return Ok(rank),
            Visit::Descend(frame) => vec![frame],
        };
        let mut result = Rank::FIRST;

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.next_child() else {
                let finished = frame.rank;
                stack.pop();
                match stack.last_mut() {
                    Some(parent) => parent.absorb(finished),
                    None => result = finished,
                }
                continue;
            };
            if frame.header == Some(child) {
                continue;
            }

            let entry = if frame.sectioned {
                if self.dom.is_single_text(child) {
                    self.dom.set_rank(child, frame.rank);
                    continue;
                }
                frame.rank.next()
            } else {
                frame.rank
            };

            match self.visit(child, entry) {
                Visit::Done(rank) => frame.absorb(rank),
                Visit::Descend(child_frame) => stack.push(child_frame),
            }
        }
        Ok(result)
    }

    fn visit(&mut self, id: MarkupNodeId, rank: Rank) -> Visit {
        let is_document = id == self.dom.document();
        if !is_document && !self.dom.is_element(id) {
            return Visit::Done(rank);
        }
        // Promoted headers are stamped before their turn comes
        if self.dom.rank(id).is_some() {
            return Visit::Done(rank);
        }
        let is_skeleton = is_document
            || self
                .dom
                .element_name(id)
                .is_some_and(|n| matches!(n.as_ref(), "html" | "head" | "body"));
        if !is_skeleton {
            if let Some(level) = self.dom.heading_level(id) {
                return Visit::Done(self.stamp_heading(id, level, rank));
            }
            if self.dom.is_single_text(id) {
                self.dom.set_rank(id, rank);
                return Visit::Done(rank);
            }
        }

        let mut frame = Frame::new(self.dom, id, rank);
        if let Some(kind) = self.dom.section(id) {
            frame.sectioned = true;
            if kind.promotes_header()
                && let Some(header) = find_header(self.dom, id)
            {
                frame.rank = self.stamp_header(header, rank);
                frame.header = Some(header);
            }
        }
        Visit::Descend(frame)
    }

    /// Stamp a heading of `level`, closing every open heading at that level
    /// or deeper.
    ///
    /// A heading that closes another reuses the closed heading's rank (never
    /// deeper than `rank`), which keeps successive headings of one level
    /// siblings no matter how much content sits between them.
    fn stamp_heading(&mut self, id: MarkupNodeId, level: u8, rank: Rank) -> Rank {
        let mut reused = None;
        while let Some(&(open_level, open_rank)) = self.open_headings.last() {
            if open_level < level {
                break;
            }
            self.open_headings.pop();
            reused = Some(open_rank);
        }
        let rank = reused.map_or(rank, |open| open.min(rank));

        self.dom.set_rank(id, rank);
        self.dom.mark_header(id);
        self.open_headings.push((level, rank));
        rank.next()
    }

    fn stamp_header(&mut self, id: MarkupNodeId, rank: Rank) -> Rank {
        if let Some(level) = self.dom.heading_level(id) {
            return self.stamp_heading(id, level, rank);
        }
        self.dom.set_rank(id, rank);
        self.dom.mark_header(id);
        rank.next()
    }
}

/// The header-like node of a section.
///
/// Scans element children in order: the first child with exactly one text
/// run is the header; if the first child with text has several runs, the
/// search continues inside it.
fn find_header(dom: &MarkupDom, section: MarkupNodeId) -> Option<MarkupNodeId> {
    let mut node = section;
    loop {
        let mut deeper = None;
        for child in dom.element_children(node) {
            match dom.run_count(child) {
                0 => continue,
                1 => return Some(child),
                _ => {
                    deeper = Some(child);
                    break;
                }
            }
        }
        node = deeper?;
    }
}
