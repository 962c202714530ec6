//! Shared fixtures: EPUB archives assembled in memory with `zip`.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use refolio::{Config, ConsolidationConfig};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const TEMPLATES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/format");

/// A minimal but complete EPUB 3 package description.
pub struct EpubFixture {
    pub title: String,
    pub creator: String,
    pub description: String,
    documents: Vec<(String, String, String)>,
    images: Vec<(String, String, Vec<u8>)>,
    cover: Option<String>,
    descriptor: Option<String>,
    extra: Vec<(String, Vec<u8>)>,
}

impl EpubFixture {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            creator: "Jane Doe".to_string(),
            description: String::new(),
            documents: Vec::new(),
            images: Vec::new(),
            cover: None,
            descriptor: None,
            extra: Vec::new(),
        }
    }

    /// Add a spine document at `OEBPS/<href>`.
    pub fn document(mut self, id: &str, href: &str, markup: impl Into<String>) -> Self {
        self.documents
            .push((id.to_string(), href.to_string(), markup.into()));
        self
    }

    /// Add a manifest image at `OEBPS/<href>`.
    pub fn image(mut self, id: &str, href: &str) -> Self {
        self.images
            .push((id.to_string(), href.to_string(), b"\x89PNG fake image".to_vec()));
        self
    }

    /// Mark an already added image as the cover.
    pub fn cover(mut self, id: &str) -> Self {
        self.cover = Some(id.to_string());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }

    /// Use this descriptor text instead of the generated one.
    pub fn raw_descriptor(mut self, opf: &str) -> Self {
        self.descriptor = Some(opf.to_string());
        self
    }

    /// Add an archive entry outside the manifest.
    pub fn entry(mut self, name: &str, data: &[u8]) -> Self {
        self.extra.push((name.to_string(), data.to_vec()));
        self
    }

    /// Remove an image file while keeping it in the manifest.
    pub fn without_image_file(mut self, id: &str) -> Self {
        for image in &mut self.images {
            if image.0 == id {
                image.2.clear();
            }
        }
        self
    }

    pub fn descriptor(&self) -> String {
        if let Some(opf) = &self.descriptor {
            return opf.clone();
        }

        let mut manifest = String::new();
        let mut spine = String::new();
        for (id, href, _) in &self.documents {
            manifest.push_str(&format!(
                "    <item id=\"{id}\" href=\"{href}\" media-type=\"application/xhtml+xml\"/>\n"
            ));
            spine.push_str(&format!("    <itemref idref=\"{id}\"/>\n"));
        }
        for (id, href, _) in &self.images {
            let properties = if self.cover.as_deref() == Some(id) {
                " properties=\"cover-image\""
            } else {
                ""
            };
            let media_type = if href.ends_with(".jpg") { "image/jpeg" } else { "image/png" };
            manifest.push_str(&format!(
                "    <item id=\"{id}\" href=\"{href}\" media-type=\"{media_type}\"{properties}/>\n"
            ));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>{}</dc:title>
    <dc:creator>{}</dc:creator>
    <dc:language>en</dc:language>
    <dc:identifier id="uid">urn:isbn:9780000000000</dc:identifier>
    <dc:description>{}</dc:description>
  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine>
{spine}  </spine>
</package>
"#,
            xml_text(&self.title),
            xml_text(&self.creator),
            xml_text(&self.description)
        )
    }

    /// Write the archive to `path`.
    pub fn write(&self, path: &Path) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default();

        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();
        zip.start_file("META-INF/container.xml", deflated).unwrap();
        zip.write_all(CONTAINER.as_bytes()).unwrap();
        zip.start_file("OEBPS/content.opf", deflated).unwrap();
        zip.write_all(self.descriptor().as_bytes()).unwrap();

        for (_, href, markup) in &self.documents {
            zip.start_file(format!("OEBPS/{href}"), deflated).unwrap();
            zip.write_all(markup.as_bytes()).unwrap();
        }
        for (_, href, data) in &self.images {
            if data.is_empty() {
                continue;
            }
            zip.start_file(format!("OEBPS/{href}"), deflated).unwrap();
            zip.write_all(data).unwrap();
        }
        for (name, data) in &self.extra {
            zip.start_file(name.as_str(), deflated).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }
}

fn xml_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;")
}

pub const CONTAINER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// A content document with an `<h1>` (when `title` is non-empty) and one
/// paragraph of exactly `text_len` characters.
pub fn document(title: &str, text_len: usize) -> String {
    let heading = if title.is_empty() {
        String::new()
    } else {
        format!("<h1>{title}</h1>")
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><html xmlns=\"http://www.w3.org/1999/xhtml\">\
         <head><title>{title}</title></head><body>{heading}<p>{}</p></body></html>",
        filler(text_len)
    )
}

/// A table-of-contents page with `links` entries.
pub fn toc_document(links: usize) -> String {
    let items: String = (1..=links)
        .map(|i| format!("<li><a href=\"ch{i}.xhtml\">Part {i}</a></li>"))
        .collect();
    format!(
        "<html><head><title>Table of Contents</title></head><body>\
         <h1>Table of Contents</h1><ol>{items}</ol></body></html>"
    )
}

/// Text of exactly `len` characters.
pub fn filler(len: usize) -> String {
    "lorem ipsum dolor sit amet ".chars().cycle().take(len).collect()
}

/// Copy the shipped templates into `dir`, adding a stand-in font.
pub fn format_dir(dir: &Path) -> PathBuf {
    let format = dir.join("format");
    fs::create_dir_all(&format).unwrap();
    for name in ["stylesheet.css", "titlepage.xhtml", "jacket.xhtml", "nav.xhtml"] {
        fs::copy(Path::new(TEMPLATES_DIR).join(name), format.join(name)).unwrap();
    }
    fs::write(format.join("jura.ttf"), b"\x00\x01\x00\x00font").unwrap();
    format
}

pub fn config(dir: &Path) -> Config {
    Config::default().with_format_dir(format_dir(dir))
}

pub fn config_without_consolidation(dir: &Path) -> Config {
    config(dir).with_consolidation(ConsolidationConfig {
        enabled: false,
        ..Default::default()
    })
}

/// Entry names in archive order.
pub fn entry_names(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    archive.file_names().map(str::to_string).collect()
}

pub fn read_entry(path: &Path, name: &str) -> String {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    text
}

/// Chapter files in an output archive.
pub fn chapter_entries(path: &Path) -> Vec<String> {
    entry_names(path)
        .into_iter()
        .filter(|name| name.starts_with("OEBPS/chapters/"))
        .collect()
}
