//! Markup DOM: html5ever parsing into an arena, plus the queries and
//! cleaning passes the semantic tree is built from.

mod arena;
pub mod clean;
pub mod path;
pub mod predicates;
mod text;
mod tree_sink;

pub use arena::{
    Ancestors, Attribute, ChildrenIter, Descendants, MarkupData, MarkupDom, MarkupNode,
    MarkupNodeId, Rank, SectionKind,
};
pub use path::{resolve_path, structural_path};
use tree_sink::MarkupSink;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

/// Parse an HTML document into a [`MarkupDom`].
///
/// Parsing never fails: html5ever recovers from malformed markup the way a
/// browser would, synthesizing `html`/`head`/`body` when they are missing.
pub fn parse_html(html: &str) -> MarkupDom {
    let sink = MarkupSink::new();
    let result = parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes());
    result.into_dom()
}
