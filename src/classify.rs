//! Bucketing manifest items by role.

use crate::book::{Book, ManifestItem};
use crate::epub::is_front_matter;

/// Manifest items grouped by what the builder does with them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub stylesheets: Vec<ManifestItem>,
    pub fonts: Vec<ManifestItem>,
    pub images: Vec<ManifestItem>,
    /// Content documents in reading order.
    pub documents: Vec<ManifestItem>,
}

pub fn is_stylesheet(media_type: &str) -> bool {
    media_type == "text/css"
}

pub fn is_font(media_type: &str) -> bool {
    media_type.starts_with("font/")
        || matches!(
            media_type,
            "application/vnd.ms-opentype"
                | "application/font-sfnt"
                | "application/x-font-ttf"
                | "application/x-font-truetype"
                | "application/x-font-opentype"
                | "application/font-woff"
                | "application/font-woff2"
        )
}

pub fn is_image(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

pub fn is_document(media_type: &str) -> bool {
    matches!(media_type, "application/xhtml+xml" | "text/html")
}

/// Split the manifest into stylesheets, fonts, images and content documents.
///
/// Assets keep manifest order. Documents follow the spine and skip the
/// navigation document and guide-referenced cover/title pages, which the
/// builder regenerates.
pub fn classify(book: &Book) -> Classification {
    let mut out = Classification::default();

    for item in &book.manifest {
        let media_type = item.media_type.as_str();
        if is_stylesheet(media_type) {
            out.stylesheets.push(item.clone());
        } else if is_font(media_type) {
            out.fonts.push(item.clone());
        } else if is_image(media_type) {
            out.images.push(item.clone());
        }
    }

    for spine_item in &book.spine {
        let Some(item) = book.spine_item(spine_item) else {
            continue;
        };
        if !is_document(&item.media_type)
            || item.has_property("nav")
            || is_front_matter(book, item)
            || out.documents.iter().any(|d| d.id == item.id)
        {
            continue;
        }
        out.documents.push(item.clone());
    }

    out
}
