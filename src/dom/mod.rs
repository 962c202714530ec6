//! Owned HTML document trees.
//!
//! Content documents are parsed with html5ever into an arena-allocated
//! [`Dom`], inspected or edited in place, and serialized back to XHTML.

mod arena;
mod serialize;
mod tree_sink;

pub use arena::{Attribute, Children, Dom, Node, NodeData, NodeId};
pub use serialize::{serialize_children, serialize_node};
pub use tree_sink::{DomSink, NodeHandle};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

/// Parse an HTML or XHTML document. Never fails; malformed input is repaired.
pub fn parse_html(html: &str) -> Dom {
    let sink = DomSink::new();
    parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// Text of the first element with the given tag, trimmed.
pub fn first_text(dom: &Dom, tag: &str) -> Option<String> {
    let id = dom.find_by_tag(tag)?;
    let text = dom.collect_text(id);
    let trimmed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if trimmed.is_empty() { None } else { Some(trimmed) }
}
