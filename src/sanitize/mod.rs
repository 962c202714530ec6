//! Markup sanitizer.
//!
//! Chapter markup is parsed into an owned [`Dom`], stripped of
//! publisher-specific presentation (inline styles, calibre/Kobo/Adobe
//! classes, generated ids), has its image references pointed at the flat
//! `images/` directory and is serialized back as XHTML body content.
//! When the DOM path cannot be used, [`fallback_clean`] applies the same
//! rules with patterns.

mod fallback;

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

pub use fallback::fallback_clean;

use crate::book::{file_name, resolve_relative};
use crate::config::SanitizeConfig;
use crate::dom::{self, Dom, NodeId};

/// Directory chapter files reference images through.
pub const IMAGE_PREFIX: &str = "../images/";

/// Elements that never belong in chapter content, wherever the parser put them.
const HEAD_ONLY: &[&str] = &["title", "meta", "link", "base", "style", "script"];

/// Why the DOM sanitizer gave up on a fragment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("document has {nodes} nodes, above the limit of {limit}")]
    TooLarge { nodes: usize, limit: usize },

    #[error("document has no body")]
    NoBody,
}

/// Output file names of copied images.
///
/// Looked up by package path first and by file name second, since chapter
/// markup may come from a directory other than the one it was merged into.
#[derive(Debug, Clone, Default)]
pub struct ImageMap {
    by_path: HashMap<String, String>,
    by_name: HashMap<String, String>,
}

impl ImageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the image at package path `source` was written as `output`.
    pub fn insert(&mut self, source: &str, output: &str) {
        self.by_path.insert(source.to_string(), output.to_string());
        self.by_name
            .entry(file_name(source).to_string())
            .or_insert_with(|| output.to_string());
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Rewritten reference for an image `src` found in a document in `base_dir`.
    ///
    /// Returns `None` for external and inline references. Unknown images
    /// keep their file name so the reference stays inside `images/`.
    pub fn rewrite(&self, src: &str, base_dir: &str) -> Option<String> {
        let src = src.trim();
        if src.is_empty() || src.starts_with("data:") || src.contains("://") {
            return None;
        }
        let path = resolve_relative(base_dir, src);
        let name = file_name(&path);
        if name.is_empty() {
            return None;
        }
        let output = self
            .by_path
            .get(&path)
            .or_else(|| self.by_name.get(name))
            .map(String::as_str)
            .unwrap_or(name);
        Some(format!("{IMAGE_PREFIX}{output}"))
    }
}

/// Class tokens added by conversion tools rather than the author.
pub fn is_publisher_class(class: &str) -> bool {
    let lower = class.to_lowercase();
    lower.contains("calibre")
        || lower.starts_with("sgc-")
        || lower.starts_with("kobo-")
        || lower.starts_with("adobe-")
}

/// Ids generated by conversion tools or left over from old TOC anchors.
pub fn is_publisher_id(id: &str) -> bool {
    let lower = id.to_lowercase();
    lower.contains("calibre") || lower.contains("toc") || lower.starts_with("sgc-")
}

/// Class attribute with publisher tokens removed, or `None` if nothing is left.
pub fn filter_classes(value: &str) -> Option<String> {
    let kept: Vec<&str> = value
        .split_whitespace()
        .filter(|c| !is_publisher_class(c))
        .collect();
    if kept.is_empty() { None } else { Some(kept.join(" ")) }
}

/// DOM-based markup cleaner.
pub struct Sanitizer<'a> {
    config: &'a SanitizeConfig,
    images: &'a ImageMap,
    base_dir: String,
}

impl<'a> Sanitizer<'a> {
    pub fn new(config: &'a SanitizeConfig, images: &'a ImageMap) -> Self {
        Self {
            config,
            images,
            base_dir: String::new(),
        }
    }

    /// Package directory that relative image references resolve against.
    pub fn with_base_dir(mut self, dir: impl Into<String>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Clean a markup fragment and return the serialized body content.
    pub fn sanitize(&self, raw: &str) -> Result<String, SanitizeError> {
        let mut dom = dom::parse_html(raw);
        if dom.len() > self.config.max_dom_nodes {
            return Err(SanitizeError::TooLarge {
                nodes: dom.len(),
                limit: self.config.max_dom_nodes,
            });
        }
        let body = dom.find_by_tag("body").ok_or(SanitizeError::NoBody)?;

        // Heads of merged documents end up inside the first body
        let stray: Vec<NodeId> = dom
            .descendants(body)
            .into_iter()
            .filter(|&id| HEAD_ONLY.iter().any(|tag| dom.is_tag(id, tag)))
            .collect();
        for id in stray {
            dom.detach(id);
        }

        for id in dom.descendants(body) {
            if dom.is_element(id) {
                self.clean_element(&mut dom, id);
            }
        }
        remove_empty_wrappers(&mut dom, body);

        Ok(dom::serialize_children(&dom, body))
    }

    /// Sanitize, falling back to pattern cleanup. The flag reports the fallback.
    pub fn sanitize_or_fallback(&self, raw: &str) -> (String, bool) {
        match self.sanitize(raw) {
            Ok(clean) => (clean, false),
            Err(e) => {
                debug!("DOM sanitizer failed ({e}); using pattern cleanup");
                (fallback_clean(raw, self.images, &self.base_dir), true)
            }
        }
    }

    fn clean_element(&self, dom: &mut Dom, id: NodeId) {
        dom.remove_attr(id, "style");

        if dom.get_attr(id, "id").is_some_and(is_publisher_id) {
            dom.remove_attr(id, "id");
        }

        if let Some(class) = dom.get_attr(id, "class") {
            match filter_classes(class) {
                Some(kept) => {
                    dom.set_attr(id, "class", kept);
                }
                None => dom.remove_attr(id, "class"),
            }
        }

        let image_attr = if dom.is_tag(id, "img") {
            Some("src")
        } else if dom.is_tag(id, "image") {
            Some("href")
        } else {
            None
        };
        if let Some(attr) = image_attr
            && let Some(src) = dom.get_attr(id, attr)
            && let Some(rewritten) = self.images.rewrite(src, &self.base_dir)
        {
            dom.set_attr(id, attr, rewritten);
        }
    }
}

/// Drop `div`/`span` elements holding no text and no child elements.
///
/// A single pass: a wrapper that only becomes empty once its children are
/// removed is kept.
fn remove_empty_wrappers(dom: &mut Dom, root: NodeId) {
    let empty: Vec<NodeId> = dom
        .descendants(root)
        .into_iter()
        .filter(|&id| (dom.is_tag(id, "div") || dom.is_tag(id, "span")) && dom.is_blank(id))
        .collect();
    for id in empty {
        dom.detach(id);
    }
}
