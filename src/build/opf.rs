//! Package descriptor generation.

use std::fmt::Write;

use crate::book::Metadata;
use crate::util::{escape_xml, guess_media_type, utc_timestamp};

use super::Layout;

/// Container.xml pointing at the generated descriptor.
pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

struct Item {
    id: String,
    href: String,
    media_type: &'static str,
    properties: Option<&'static str>,
}

impl Item {
    fn new(id: impl Into<String>, href: impl Into<String>) -> Self {
        let href = href.into();
        Self {
            id: id.into(),
            media_type: guess_media_type(&href),
            href,
            properties: None,
        }
    }

    fn with_properties(mut self, properties: &'static str) -> Self {
        self.properties = Some(properties);
        self
    }
}

/// Manifest entries in their fixed order.
fn manifest_items(layout: &Layout) -> Vec<Item> {
    let mut items = vec![
        Item::new("ncx", "toc.ncx"),
        Item::new("nav", "nav.xhtml").with_properties("nav"),
    ];

    if let Some(cover) = &layout.cover {
        items.push(Item::new("titlepage", "titlepage.xhtml").with_properties("svg"));
        items.push(Item::new("jacket", "jacket.xhtml"));
        items.push(Item::new("cover-image", format!("images/{cover}")).with_properties("cover-image"));
        if let Some(logo) = &layout.logo {
            items.push(Item::new("logo", format!("images/{logo}")));
        }
    }

    items.push(Item::new("stylesheet", "styles/stylesheet.css"));

    for (i, chapter) in layout.chapters.iter().enumerate() {
        items.push(Item::new(format!("chapter{}", i + 1), format!("chapters/{}", chapter.file_name)));
    }
    for (i, image) in layout.images.iter().enumerate() {
        items.push(Item::new(format!("image{}", i + 1), format!("images/{image}")));
    }
    for (i, font) in layout.fonts.iter().enumerate() {
        items.push(Item::new(format!("font{}", i + 1), format!("fonts/{font}")));
    }

    items
}

/// Generate `content.opf`.
///
/// `metadata` must already carry the language and identifier defaults so
/// the descriptor and the NCX agree on the identifier.
pub fn generate_opf(metadata: &Metadata, layout: &Layout) -> String {
    generate_opf_at(metadata, layout, &utc_timestamp())
}

pub(crate) fn generate_opf_at(metadata: &Metadata, layout: &Layout, modified: &str) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
"#,
    );

    let _ = writeln!(opf, "    <dc:title>{}</dc:title>", escape_xml(&metadata.title));
    if !metadata.creator.is_empty() {
        let _ = writeln!(opf, "    <dc:creator>{}</dc:creator>", escape_xml(&metadata.creator));
    }
    let _ = writeln!(opf, "    <dc:language>{}</dc:language>", escape_xml(&metadata.language));
    let _ = writeln!(
        opf,
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>",
        escape_xml(&metadata.identifier)
    );
    if !metadata.publisher.is_empty() {
        let _ = writeln!(opf, "    <dc:publisher>{}</dc:publisher>", escape_xml(&metadata.publisher));
    }
    if !metadata.description.is_empty() {
        let _ = writeln!(
            opf,
            "    <dc:description>{}</dc:description>",
            escape_xml(&metadata.description)
        );
    }
    if !metadata.date.is_empty() {
        let _ = writeln!(opf, "    <dc:date>{}</dc:date>", escape_xml(&metadata.date));
    }
    let _ = writeln!(opf, "    <meta property=\"dcterms:modified\">{modified}</meta>");
    if layout.cover.is_some() {
        // EPUB 2 readers only look here
        opf.push_str("    <meta name=\"cover\" content=\"cover-image\"/>\n");
    }
    opf.push_str("  </metadata>\n");

    opf.push_str("  <manifest>\n");
    for item in manifest_items(layout) {
        let _ = write!(
            opf,
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"",
            escape_xml(&item.id),
            escape_xml(&item.href),
            item.media_type
        );
        if let Some(properties) = item.properties {
            let _ = write!(opf, " properties=\"{properties}\"");
        }
        opf.push_str("/>\n");
    }
    opf.push_str("  </manifest>\n");

    opf.push_str("  <spine toc=\"ncx\">\n");
    if layout.cover.is_some() {
        opf.push_str("    <itemref idref=\"titlepage\"/>\n");
        opf.push_str("    <itemref idref=\"jacket\"/>\n");
    }
    opf.push_str("    <itemref idref=\"nav\"/>\n");
    for i in 0..layout.chapters.len() {
        let _ = writeln!(opf, "    <itemref idref=\"chapter{}\"/>", i + 1);
    }
    opf.push_str("  </spine>\n");

    opf.push_str("  <guide>\n");
    if layout.cover.is_some() {
        opf.push_str("    <reference type=\"cover\" title=\"Cover\" href=\"titlepage.xhtml\"/>\n");
        opf.push_str(
            "    <reference type=\"title-page\" title=\"Title Page\" href=\"jacket.xhtml\"/>\n",
        );
    }
    opf.push_str(
        "    <reference type=\"toc\" title=\"Table of Contents\" href=\"nav.xhtml\"/>\n",
    );
    opf.push_str("  </guide>\n");

    opf.push_str("</package>\n");
    opf
}
