//! Building the in-memory [`Book`] from an extracted EPUB tree.
//!
//! The package descriptor is read through a [`DescriptorParser`]. The strict
//! event parser runs first; when it rejects the document the tolerant
//! [`ScanParser`] gets a go, and only if both fail does the run abort.

mod parser;
mod scan;

use std::fs;
use std::path::Path;

use log::{debug, info};

pub use parser::{StrictParser, parse_container_xml};
pub use scan::ScanParser;

use crate::book::{Book, GuideReference, Manifest, ManifestItem, Metadata, SpineItem};
use crate::book::{parent_dir, resolve_relative};
use crate::classify::is_image;
use crate::dom;
use crate::error::{Error, Result};
use crate::report::Warnings;
use crate::util::{decode_markup, strip_bom};

pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Everything a package descriptor declares, before spine validation.
#[derive(Debug, Default, Clone)]
pub struct Package {
    pub metadata: Metadata,
    pub manifest: Manifest,
    pub spine: Vec<SpineItem>,
    /// `spine@toc`, the NCX manifest id.
    pub toc: Option<String>,
    pub guide: Vec<GuideReference>,
    /// Manifest id from the legacy `<meta name="cover">`.
    pub cover_id: Option<String>,
}

impl Package {
    pub(crate) fn add_item(&mut self, item: ManifestItem) {
        let id = item.id.clone();
        if !self.manifest.insert(item) {
            debug!("duplicate manifest id {id}; keeping the first");
        }
    }
}

/// A way of reading a package descriptor.
pub trait DescriptorParser {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    fn parse(&self, content: &str) -> Result<Package>;
}

/// Parse a descriptor with the strict parser, falling back to the scanner.
pub fn parse_descriptor(content: &str) -> Result<Package> {
    let strict = StrictParser;
    let strict_err = match strict.parse(content) {
        Ok(package) => return Ok(package),
        Err(e) => e,
    };
    debug!("{} descriptor parse failed ({strict_err}); trying scan", strict.name());

    ScanParser.parse(content).map_err(|scan_err| {
        Error::InvalidPackage(format!("strict parse: {strict_err}; scan: {scan_err}"))
    })
}

/// Parse an extracted EPUB tree into a [`Book`].
pub fn parse(root: &Path) -> Result<Book> {
    parse_with_warnings(root, &mut Warnings::new())
}

/// Like [`parse`], recording resolution problems in `warnings`.
pub fn parse_with_warnings(root: &Path, warnings: &mut Warnings) -> Result<Book> {
    let container = fs::read(root.join(CONTAINER_PATH))
        .map_err(|e| Error::MissingRootFile(format!("{CONTAINER_PATH}: {e}")))?;
    let opf_path = parse_container_xml(&container)?;
    let opf_path = resolve_relative("", &opf_path);

    let opf_bytes = fs::read(root.join(&opf_path))
        .map_err(|e| Error::MissingRootFile(format!("{opf_path}: {e}")))?;
    let content = decode_markup(strip_bom(&opf_bytes));
    let package = parse_descriptor(&content)?;

    let mut book = Book::new(root);
    book.opf_path = opf_path;
    book.metadata = package.metadata;
    book.manifest = package.manifest;
    book.guide = package.guide;

    for item in package.spine {
        if book.manifest.contains(&item.idref) {
            book.spine.push(item);
        } else {
            warnings.push(format!("spine references unknown manifest item {}", item.idref));
        }
    }

    book.cover_image = resolve_cover(&book, package.cover_id.as_deref());
    match &book.cover_image {
        Some(href) => debug!("cover image: {href}"),
        None => debug!("no cover image declared"),
    }

    info!(
        "parsed {}: {} manifest items, {} spine items",
        book.opf_path,
        book.manifest.len(),
        book.spine.len()
    );
    Ok(book)
}

/// Find the cover image href, relative to the descriptor directory.
///
/// Tried in order: the `cover-image` property, the legacy cover meta, the
/// guide's cover reference, then any image whose id or file name mentions
/// "cover".
pub fn resolve_cover(book: &Book, cover_id: Option<&str>) -> Option<String> {
    if let Some(item) = book.manifest.iter().find(|i| i.has_property("cover-image")) {
        return Some(item.href.clone());
    }

    if let Some(id) = cover_id {
        if let Some(item) = book.manifest.get(id).filter(|i| is_image(&i.media_type)) {
            return Some(item.href.clone());
        }
        // Some producers put the href in the meta instead of the id
        if let Some(item) = book.manifest.by_href(id).filter(|i| is_image(&i.media_type)) {
            return Some(item.href.clone());
        }
    }

    if let Some(href) = guide_cover(book) {
        return Some(href);
    }

    book.manifest
        .iter()
        .filter(|i| is_image(&i.media_type))
        .find(|i| {
            i.id.to_lowercase().contains("cover") || i.file_name().to_lowercase().contains("cover")
        })
        .map(|i| i.href.clone())
}

fn guide_cover(book: &Book) -> Option<String> {
    let reference = book
        .guide
        .iter()
        .find(|r| r.kind.eq_ignore_ascii_case("cover"))?;
    let target = reference.href.split('#').next().unwrap_or(&reference.href);

    let is_image_href = book
        .manifest
        .by_href(target)
        .map(|i| is_image(&i.media_type))
        .unwrap_or_else(|| is_image(crate::util::guess_media_type(target)));
    if is_image_href {
        return Some(target.to_string());
    }

    // A cover page: use the first image it shows
    let page_path = resolve_relative(book.opf_dir(), target);
    let bytes = fs::read(book.path.join(&page_path)).ok()?;
    let page = dom::parse_html(&decode_markup(&bytes));
    let src = page.descendants(page.document()).into_iter().find_map(|id| {
        match page.element_name(id).map(|n| n.as_ref()) {
            Some("img") => page.get_attr(id, "src"),
            Some("image") => page.get_attr(id, "href"),
            _ => None,
        }
    })?;

    let image_path = resolve_relative(parent_dir(&page_path), src);
    let relative = relative_to(book.opf_dir(), &image_path);
    Some(
        book.manifest
            .iter()
            .find(|i| resolve_relative(book.opf_dir(), &i.href) == image_path)
            .map(|i| i.href.clone())
            .unwrap_or(relative),
    )
}

/// Express a package-relative path relative to `dir`.
fn relative_to(dir: &str, path: &str) -> String {
    if dir.is_empty() {
        return path.to_string();
    }
    if let Some(rest) = path.strip_prefix(dir).and_then(|r| r.strip_prefix('/')) {
        return rest.to_string();
    }
    let depth = dir.split('/').filter(|s| !s.is_empty()).count();
    format!("{}{}", "../".repeat(depth), path)
}

/// True when the manifest item is one of the generated front-matter pages
/// referenced by the guide as cover or title page.
pub fn is_front_matter(book: &Book, item: &ManifestItem) -> bool {
    book.guide.iter().any(|r| {
        let kind = r.kind.to_ascii_lowercase();
        (kind == "cover" || kind == "title-page")
            && resolve_relative(book.opf_dir(), &r.href)
                == resolve_relative(book.opf_dir(), &item.href)
    })
}
