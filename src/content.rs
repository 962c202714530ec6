//! Loading content documents for consolidation.

use std::fs;

use log::{debug, info};

use crate::book::Book;
use crate::classify::Classification;
use crate::dom::{self, Dom};
use crate::report::Warnings;
use crate::util::decode_markup;

pub const UNTITLED: &str = "Untitled";

/// A content document as read from the source package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub id: String,
    pub href: String,
    pub markup: String,
    /// First `<h1>`, else `<title>`, else [`UNTITLED`].
    pub title: String,
    /// Body text without script or style content.
    pub text: String,
    /// Length of the trimmed text, in characters.
    pub text_len: usize,
    pub link_count: usize,
}

impl RawDocument {
    /// Analyze decoded markup.
    pub fn from_markup(id: impl Into<String>, href: impl Into<String>, markup: String) -> Self {
        let dom = dom::parse_html(&markup);
        let title = dom::first_text(&dom, "h1")
            .or_else(|| dom::first_text(&dom, "title"))
            .unwrap_or_else(|| UNTITLED.to_string());
        let text = body_text(&dom);
        let text_len = text.trim().chars().count();
        let link_count = dom.find_all_by_tag("a").len();

        Self {
            id: id.into(),
            href: href.into(),
            markup,
            title,
            text,
            text_len,
            link_count,
        }
    }
}

fn body_text(dom: &Dom) -> String {
    let root = dom.find_by_tag("body").unwrap_or(dom.document());
    dom.collect_text(root)
}

/// Read every classified content document, in reading order.
pub fn load_documents(book: &Book, classification: &Classification) -> Vec<RawDocument> {
    load_documents_with_warnings(book, classification, &mut Warnings::new())
}

/// Like [`load_documents`], recording unreadable documents in `warnings`.
pub fn load_documents_with_warnings(
    book: &Book,
    classification: &Classification,
    warnings: &mut Warnings,
) -> Vec<RawDocument> {
    let mut documents = Vec::with_capacity(classification.documents.len());

    for item in &classification.documents {
        let path = book.resolve_href(&item.href);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warnings.push(format!("skipping content document {}: {e}", item.href));
                continue;
            }
        };

        let doc = RawDocument::from_markup(item.id.clone(), item.href.clone(), decode_markup(&bytes));
        debug!(
            "loaded {} ({} chars, {} links, title {:?})",
            doc.href, doc.text_len, doc.link_count, doc.title
        );
        documents.push(doc);
    }

    info!("loaded {} content documents", documents.len());
    documents
}
