use std::collections::HashMap;
use std::path::PathBuf;

/// In-memory model of an extracted EPUB package.
///
/// Built by [`crate::epub::parse`], filled with chapters by the consolidation
/// engine and consumed by the structure builder. Lives for one run only.
#[derive(Debug, Clone, Default)]
pub struct Book {
    /// Root of the extracted package.
    pub path: PathBuf,
    /// Package descriptor path, relative to `path`.
    pub opf_path: String,
    pub metadata: Metadata,
    pub manifest: Manifest,
    pub spine: Vec<SpineItem>,
    pub guide: Vec<GuideReference>,
    pub chapters: Vec<Chapter>,
    /// Cover image href, relative to the package descriptor directory.
    pub cover_image: Option<String>,
}

/// Dublin Core metadata. Absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub creator: String,
    pub language: String,
    pub identifier: String,
    pub publisher: String,
    pub description: String,
    pub date: String,
}

/// A file declared in the package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// Relative to the package descriptor directory.
    pub href: String,
    pub media_type: String,
    /// Whitespace-separated property flags (`cover-image`, `nav`, ...).
    pub properties: String,
}

/// An entry in the reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    pub idref: String,
    pub linear: bool,
    pub properties: String,
}

/// A legacy `<guide>` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideReference {
    pub kind: String,
    pub href: String,
    pub title: String,
}

/// A logical chapter produced by consolidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    /// Raw markup of every merged document, blank-line separated.
    pub content: String,
    /// Source position (0-based) of the first merged document.
    pub order: usize,
    /// Hrefs of the documents merged into this chapter.
    pub sources: Vec<String>,
    /// Summed plain-text length of the merged documents.
    pub text_len: usize,
}

/// Manifest items in declaration order with unique identifiers.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    items: Vec<ManifestItem>,
    index: HashMap<String, usize>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item. Returns false (and keeps the first) on a duplicate id.
    pub fn insert(&mut self, item: ManifestItem) -> bool {
        if self.index.contains_key(&item.id) {
            return false;
        }
        self.index.insert(item.id.clone(), self.items.len());
        self.items.push(item);
        true
    }

    pub fn get(&self, id: &str) -> Option<&ManifestItem> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Find the first item with the given href.
    pub fn by_href(&self, href: &str) -> Option<&ManifestItem> {
        self.items.iter().find(|item| item.href == href)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ManifestItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestItem;
    type IntoIter = std::slice::Iter<'a, ManifestItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Book {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Directory of the package descriptor, relative to the package root.
    pub fn opf_dir(&self) -> &str {
        parent_dir(&self.opf_path)
    }

    /// Absolute directory of the package descriptor.
    pub fn opf_base(&self) -> PathBuf {
        let dir = self.opf_dir();
        if dir.is_empty() {
            self.path.clone()
        } else {
            self.path.join(dir)
        }
    }

    /// Resolve a manifest href to a path on disk.
    pub fn resolve_href(&self, href: &str) -> PathBuf {
        self.path.join(resolve_relative(self.opf_dir(), href))
    }

    /// Manifest item behind a spine entry.
    pub fn spine_item(&self, spine: &SpineItem) -> Option<&ManifestItem> {
        self.manifest.get(&spine.idref)
    }
}

impl ManifestItem {
    pub fn new(id: impl Into<String>, href: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            properties: String::new(),
        }
    }

    pub fn with_properties(mut self, properties: impl Into<String>) -> Self {
        self.properties = properties.into();
        self
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.properties.split_ascii_whitespace().any(|p| p == property)
    }

    /// Last path segment of the href.
    pub fn file_name(&self) -> &str {
        file_name(&self.href)
    }
}

impl SpineItem {
    pub fn new(idref: impl Into<String>) -> Self {
        Self {
            idref: idref.into(),
            linear: true,
            properties: String::new(),
        }
    }
}

/// Last path segment of a slash-separated href.
pub fn file_name(href: &str) -> &str {
    let path = href.split(['#', '?']).next().unwrap_or(href);
    path.rsplit('/').next().unwrap_or(path)
}

/// Resolve a percent-encoded href against a package-relative directory.
///
/// Returns a package-relative path with `/` separators. Fragments are
/// dropped and `..` segments never climb above the package root.
pub fn resolve_relative(dir: &str, href: &str) -> String {
    let path = href.split('#').next().unwrap_or(href);
    let decoded = percent_encoding::percent_decode_str(path).decode_utf8_lossy();

    let mut parts: Vec<&str> = Vec::new();
    if !decoded.starts_with('/') {
        parts.extend(dir.split('/').filter(|s| !s.is_empty()));
    }
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Directory part of a package-relative path ("" at the root).
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}
