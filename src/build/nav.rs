//! Navigation documents: the EPUB 3 `nav.xhtml` and the legacy `toc.ncx`.

use std::fmt::Write;

use crate::book::Metadata;
use crate::util::escape_xml;

use super::Layout;
use super::templates::fill;

/// Instantiate the navigation template with one list entry per chapter.
pub fn generate_nav(template: &str, title: &str, layout: &Layout) -> String {
    let mut entries = String::new();
    for chapter in &layout.chapters {
        let _ = writeln!(
            entries,
            "<li><a href=\"chapters/{}\">{}</a></li>",
            chapter.file_name,
            escape_xml(&chapter.title)
        );
    }
    let title = escape_xml(title);
    fill(
        template,
        &[("BOOK_TITLE", title.as_str()), ("TOC_ENTRIES", entries.trim_end())],
    )
}

/// Generate `toc.ncx`. Cover pages come first when the book has a cover.
pub fn generate_ncx(metadata: &Metadata, layout: &Layout) -> String {
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
"#,
    );
    let _ = writeln!(
        ncx,
        "    <meta name=\"dtb:uid\" content=\"{}\"/>",
        escape_xml(&metadata.identifier)
    );
    ncx.push_str(
        r#"    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
"#,
    );
    let _ = writeln!(
        ncx,
        "  <docTitle>\n    <text>{}</text>\n  </docTitle>",
        escape_xml(&metadata.title)
    );
    ncx.push_str("  <navMap>\n");

    let mut play_order = 1;
    if layout.cover.is_some() {
        write_nav_point(&mut ncx, &mut play_order, "Cover", "titlepage.xhtml");
        write_nav_point(&mut ncx, &mut play_order, "Title Page", "jacket.xhtml");
    }
    for chapter in &layout.chapters {
        let href = format!("chapters/{}", chapter.file_name);
        write_nav_point(&mut ncx, &mut play_order, &chapter.title, &href);
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn write_nav_point(ncx: &mut String, play_order: &mut usize, label: &str, href: &str) {
    let _ = writeln!(
        ncx,
        "    <navPoint id=\"navPoint-{0}\" playOrder=\"{0}\">",
        play_order
    );
    let _ = writeln!(ncx, "      <navLabel><text>{}</text></navLabel>", escape_xml(label));
    let _ = writeln!(ncx, "      <content src=\"{}\"/>", escape_xml(href));
    ncx.push_str("    </navPoint>\n");
    *play_order += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::ChapterFile;

    fn layout(cover: bool) -> Layout {
        Layout {
            cover: cover.then(|| "cover.png".to_string()),
            chapters: vec![
                ChapterFile::new(1, "Arrival"),
                ChapterFile::new(2, "Fish & Chips"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_nav_entries() {
        let nav = generate_nav(
            "<h1>{{BOOK_TITLE}}</h1><ol>\n{{TOC_ENTRIES}}\n</ol>",
            "A <B>",
            &layout(false),
        );
        assert_eq!(
            nav,
            "<h1>A &lt;B&gt;</h1><ol>\n\
             <li><a href=\"chapters/chapter_001.xhtml\">Arrival</a></li>\n\
             <li><a href=\"chapters/chapter_002.xhtml\">Fish &amp; Chips</a></li>\n\
             </ol>"
        );
    }

    #[test]
    fn test_ncx_play_order() {
        let metadata = Metadata {
            title: "T".into(),
            identifier: "id-1".into(),
            ..Default::default()
        };
        let ncx = generate_ncx(&metadata, &layout(true));
        assert!(ncx.contains(r#"<meta name="dtb:uid" content="id-1"/>"#));
        let labels: Vec<&str> = ncx
            .lines()
            .filter_map(|l| l.trim().strip_prefix("<navLabel><text>"))
            .map(|l| l.trim_end_matches("</text></navLabel>"))
            .collect();
        assert_eq!(labels, ["Cover", "Title Page", "Arrival", "Fish &amp; Chips"]);
        assert!(ncx.contains(r#"<navPoint id="navPoint-4" playOrder="4">"#));
        assert!(ncx.contains(r#"<content src="chapters/chapter_002.xhtml"/>"#));

        let ncx = generate_ncx(&metadata, &layout(false));
        assert!(!ncx.contains("titlepage.xhtml"));
        assert!(ncx.contains(r#"<navPoint id="navPoint-1" playOrder="1">"#));
    }
}
