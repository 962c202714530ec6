//! Laying out the restructured package.
//!
//! [`StructureBuilder`] writes the fixed output tree into a staging
//! directory:
//!
//! ```text
//! mimetype
//! META-INF/container.xml
//! OEBPS/content.opf  toc.ncx  nav.xhtml  [titlepage.xhtml  jacket.xhtml]
//! OEBPS/chapters/chapter_001.xhtml ...
//! OEBPS/images/  OEBPS/styles/stylesheet.css  OEBPS/fonts/
//! ```
//!
//! Generated files are required and abort the build on failure. Copying
//! source assets is best effort: anything that cannot be found or read is
//! reported in the warnings and left out of the manifest.

mod assets;
mod nav;
mod opf;
mod templates;

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

pub use assets::{NameRegistry, resolve_asset};
pub use nav::{generate_nav, generate_ncx};
pub use opf::{CONTAINER_XML, generate_opf};
pub use templates::{Templates, fill};

use crate::book::{Book, Chapter, Metadata, file_name, parent_dir, resolve_relative};
use crate::classify::Classification;
use crate::config::Config;
use crate::error::Result;
use crate::package::MIMETYPE;
use crate::report::Warnings;
use crate::sanitize::{ImageMap, Sanitizer};
use crate::util::{escape_xml, generate_identifier, truncate_chars};

pub const DEFAULT_TITLE: &str = "Book Title";
pub const DEFAULT_AUTHOR: &str = "Author";

/// Descriptions longer than this are shortened for the jacket.
const SUBTITLE_LIMIT: usize = 60;
const SUBTITLE_KEEP: usize = 57;

/// A generated chapter file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterFile {
    /// `chapter_NNN.xhtml`, inside `chapters/`.
    pub file_name: String,
    pub title: String,
}

impl ChapterFile {
    /// File for the chapter at 1-based `number`.
    pub fn new(number: usize, title: impl Into<String>) -> Self {
        Self {
            file_name: format!("chapter_{number:03}.xhtml"),
            title: title.into(),
        }
    }
}

/// What was written, in the order the descriptor lists it.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// Cover file name inside `images/`.
    pub cover: Option<String>,
    /// Logo file name inside `images/`. Only present with a cover.
    pub logo: Option<String>,
    pub chapters: Vec<ChapterFile>,
    /// Image file names inside `images/`, cover and logo excluded.
    pub images: Vec<String>,
    /// Font file names inside `fonts/`.
    pub fonts: Vec<String>,
}

/// Outcome of a build.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    pub layout: Layout,
    /// Chapters cleaned by the pattern fallback.
    pub fallback_sanitized: usize,
}

/// Writes the output tree for one book.
pub struct StructureBuilder<'a> {
    book: &'a Book,
    classification: &'a Classification,
    config: &'a Config,
    templates: &'a Templates,
    root: PathBuf,
}

impl<'a> StructureBuilder<'a> {
    pub fn new(
        book: &'a Book,
        classification: &'a Classification,
        config: &'a Config,
        templates: &'a Templates,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            book,
            classification,
            config,
            templates,
            root: root.into(),
        }
    }

    fn oebps(&self) -> PathBuf {
        self.root.join("OEBPS")
    }

    /// Lay out the book's chapters and assets under the staging root.
    pub fn build(&self, warnings: &mut Warnings) -> Result<BuildSummary> {
        let mut layout = Layout::default();
        let mut image_names = NameRegistry::new();
        let mut images = ImageMap::new();

        self.write_skeleton()?;
        self.write_styles(&mut layout, warnings)?;
        let cover_source = self.write_cover(&mut layout, &mut image_names, &mut images, warnings)?;
        self.copy_images(cover_source.as_deref(), &mut layout, &mut image_names, &mut images, warnings);
        let fallback_sanitized = self.write_chapters(&mut layout, &images)?;

        let metadata = output_metadata(&self.book.metadata, self.config);
        let oebps = self.oebps();
        fs::write(oebps.join("content.opf"), generate_opf(&metadata, &layout))?;
        fs::write(
            oebps.join("nav.xhtml"),
            generate_nav(&self.templates.nav, &metadata.title, &layout),
        )?;
        fs::write(oebps.join("toc.ncx"), generate_ncx(&metadata, &layout))?;

        info!(
            "built {} chapters, {} images, {} fonts (cover: {})",
            layout.chapters.len(),
            layout.images.len(),
            layout.fonts.len(),
            layout.cover.is_some()
        );
        Ok(BuildSummary {
            layout,
            fallback_sanitized,
        })
    }

    fn write_skeleton(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.root.join("mimetype"), MIMETYPE)?;
        let meta_inf = self.root.join("META-INF");
        fs::create_dir_all(&meta_inf)?;
        fs::write(meta_inf.join("container.xml"), CONTAINER_XML)?;

        let oebps = self.oebps();
        for dir in ["chapters", "images", "styles", "fonts"] {
            fs::create_dir_all(oebps.join(dir))?;
        }
        Ok(())
    }

    fn write_styles(&self, layout: &mut Layout, warnings: &mut Warnings) -> Result<()> {
        let oebps = self.oebps();
        fs::write(oebps.join("styles").join(templates::STYLESHEET), &self.templates.stylesheet)?;

        let mut font_names = NameRegistry::new();
        font_names.reserve(templates::FONT);
        fs::write(oebps.join("fonts").join(templates::FONT), &self.templates.font)?;
        layout.fonts.push(templates::FONT.to_string());

        for item in &self.classification.fonts {
            let Some(source) = resolve_asset(self.book, &item.href, warnings) else {
                warnings.push(format!("font {} not found", item.href));
                continue;
            };
            let (name, _) = font_names.claim(&output_name(&source, &item.href));
            match fs::copy(&source, oebps.join("fonts").join(&name)) {
                Ok(_) => layout.fonts.push(name),
                Err(e) => warnings.push(format!("could not copy font {}: {e}", item.href)),
            }
        }
        Ok(())
    }

    /// Copy the cover and write the pages built around it.
    ///
    /// Returns the cover's package path so the image pass can skip it.
    fn write_cover(
        &self,
        layout: &mut Layout,
        names: &mut NameRegistry,
        images: &mut ImageMap,
        warnings: &mut Warnings,
    ) -> Result<Option<String>> {
        let Some(href) = self.book.cover_image.as_deref() else {
            debug!("no cover image; skipping title page and jacket");
            return Ok(None);
        };
        let Some(source) = resolve_asset(self.book, href, warnings) else {
            warnings.push(format!("cover image {href} not found"));
            return Ok(None);
        };

        let (titlepage, jacket) = self.templates.cover_pages()?;
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "jpg".to_string());
        let cover_name = format!("cover.{ext}");
        names.reserve(&cover_name);
        names.reserve(templates::LOGO);

        let oebps = self.oebps();
        if let Err(e) = fs::copy(&source, oebps.join("images").join(&cover_name)) {
            warnings.push(format!("could not copy cover image {href}: {e}"));
            return Ok(None);
        }
        let package_path = resolve_relative(self.book.opf_dir(), href);
        images.insert(&package_path, &cover_name);

        let cover_ref = format!("images/{cover_name}");
        fs::write(
            oebps.join("titlepage.xhtml"),
            fill(titlepage, &[("COVER_IMAGE", cover_ref.as_str())]),
        )?;

        let metadata = &self.book.metadata;
        let title = escape_xml(non_empty(&metadata.title, DEFAULT_TITLE));
        let author = escape_xml(non_empty(&metadata.creator, DEFAULT_AUTHOR));
        let subtitle = escape_xml(&subtitle(&metadata.description, &self.config.default_subtitle));
        fs::write(
            oebps.join("jacket.xhtml"),
            fill(
                jacket,
                &[
                    ("BOOK_TITLE", title.as_str()),
                    ("BOOK_AUTHOR", author.as_str()),
                    ("BOOK_SUBTITLE", subtitle.as_str()),
                ],
            ),
        )?;

        if let Some(logo) = &self.templates.logo {
            fs::write(oebps.join("images").join(templates::LOGO), logo)?;
            layout.logo = Some(templates::LOGO.to_string());
        }

        info!("cover {href} written as {cover_name}");
        layout.cover = Some(cover_name);
        Ok(Some(package_path))
    }

    fn copy_images(
        &self,
        cover: Option<&str>,
        layout: &mut Layout,
        names: &mut NameRegistry,
        images: &mut ImageMap,
        warnings: &mut Warnings,
    ) {
        let images_dir = self.oebps().join("images");
        for item in &self.classification.images {
            let package_path = resolve_relative(self.book.opf_dir(), &item.href);
            if cover == Some(package_path.as_str()) {
                continue;
            }
            let Some(source) = resolve_asset(self.book, &item.href, warnings) else {
                warnings.push(format!("image {} not found", item.href));
                continue;
            };

            let (name, renamed) = names.claim(&output_name(&source, &item.href));
            if renamed {
                warnings.push(format!(
                    "image name {} already used, writing {} as {name}",
                    file_name(&package_path),
                    item.href
                ));
            }
            match fs::copy(&source, images_dir.join(&name)) {
                Ok(_) => {
                    images.insert(&package_path, &name);
                    layout.images.push(name);
                }
                Err(e) => warnings.push(format!("could not copy image {}: {e}", item.href)),
            }
        }
    }

    /// Write one file per chapter. Returns how many needed the fallback.
    fn write_chapters(&self, layout: &mut Layout, images: &ImageMap) -> Result<usize> {
        let dir = self.oebps().join("chapters");
        let language = non_empty(&self.book.metadata.language, &self.config.default_language);
        let mut fallbacks = 0;

        for (i, chapter) in self.book.chapters.iter().enumerate() {
            let file = ChapterFile::new(i + 1, chapter.title.clone());
            let sanitizer =
                Sanitizer::new(&self.config.sanitize, images).with_base_dir(self.source_dir(chapter));
            let (body, fell_back) = sanitizer.sanitize_or_fallback(&chapter.content);
            if fell_back {
                fallbacks += 1;
            }

            fs::write(dir.join(&file.file_name), chapter_document(&file.title, language, &body))?;
            debug!("wrote {} from {} source(s)", file.file_name, chapter.sources.len());
            layout.chapters.push(file);
        }
        Ok(fallbacks)
    }

    /// Package directory of the chapter's first source document.
    fn source_dir(&self, chapter: &Chapter) -> String {
        chapter
            .sources
            .first()
            .map(|href| parent_dir(&resolve_relative(self.book.opf_dir(), href)).to_string())
            .unwrap_or_default()
    }
}

/// Wrap sanitized body content into a chapter document.
pub fn chapter_document(title: &str, language: &str, body: &str) -> String {
    let title = escape_xml(title);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="{lang}" lang="{lang}">
<head>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="../styles/stylesheet.css"/>
</head>
<body>
  <h1>{title}</h1>
{body}
</body>
</html>
"#,
        lang = escape_xml(language),
    )
}

/// Metadata as written to the descriptor and NCX, with defaults applied.
pub fn output_metadata(source: &Metadata, config: &Config) -> Metadata {
    let mut metadata = source.clone();
    if metadata.title.trim().is_empty() {
        metadata.title = DEFAULT_TITLE.to_string();
    }
    if metadata.language.trim().is_empty() {
        metadata.language = config.default_language.clone();
    }
    if metadata.identifier.trim().is_empty() {
        metadata.identifier = generate_identifier();
    }
    metadata
}

/// Jacket subtitle: the description, shortened past 60 characters.
pub fn subtitle(description: &str, default: &str) -> String {
    let description = description.trim();
    if description.is_empty() {
        default.to_string()
    } else if description.chars().count() > SUBTITLE_LIMIT {
        format!("{}...", truncate_chars(description, SUBTITLE_KEEP))
    } else {
        description.to_string()
    }
}

fn non_empty<'s>(value: &'s str, default: &'s str) -> &'s str {
    if value.trim().is_empty() { default } else { value }
}

/// File name to write a resolved asset under.
fn output_name(source: &Path, href: &str) -> String {
    source
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| file_name(href).to_string())
}
