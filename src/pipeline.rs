//! The end-to-end restructuring run.
//!
//! extract → parse → classify/load → consolidate → build → package.
//! Every run works inside its own temporary directory, removed on every
//! exit path when the [`TempDir`] drops.

use std::path::{Path, PathBuf};

use log::info;
use tempfile::TempDir;

use crate::build::{StructureBuilder, Templates};
use crate::classify::classify;
use crate::config::Config;
use crate::consolidate::consolidate;
use crate::content::load_documents_with_warnings;
use crate::epub;
use crate::error::{Result, ResultExt, Stage};
use crate::package::{extract, write_archive};
use crate::report::{Report, Warnings};

/// Runs the pipeline for one input file.
pub struct Processor<'a> {
    config: &'a Config,
}

impl<'a> Processor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Restructure `input` into `output`.
    ///
    /// Structural failures return an error tagged with the failed
    /// [`Stage`]; asset problems end up in [`Report::warnings`].
    pub fn process(&self, input: &Path, output: &Path) -> Result<Report> {
        let config = self.config;
        let mut warnings = Warnings::new();

        let templates = Templates::load(&config.format_dir).stage(Stage::Build)?;

        let work = TempDir::new().stage(Stage::Extract)?;
        let source = work.path().join("source");
        let staging = work.path().join("output");

        extract(input, &source, config.max_entry_size).stage(Stage::Extract)?;
        info!("extracted {}", input.display());

        let mut book = epub::parse_with_warnings(&source, &mut warnings).stage(Stage::Parse)?;
        info!("parsed \"{}\"", book.metadata.title);

        let classification = classify(&book);
        let documents = load_documents_with_warnings(&book, &classification, &mut warnings);
        let document_count = documents.len();

        book.chapters = consolidate(documents, &config.consolidation, &config.chapter_label);
        info!("{document_count} documents became {} chapters", book.chapters.len());

        let summary = StructureBuilder::new(&book, &classification, config, &templates, &staging)
            .build(&mut warnings)
            .stage(Stage::Build)?;

        write_archive(&staging, output, config.compression_level).stage(Stage::Package)?;
        info!("wrote {}", output.display());

        Ok(Report {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            title: book.metadata.title.clone(),
            documents: document_count,
            chapters: summary.layout.chapters.len(),
            fallback_sanitized: summary.fallback_sanitized,
            images: summary.layout.images.len(),
            has_cover: summary.layout.cover.is_some(),
            warnings: warnings.into_vec(),
        })
    }
}

/// Restructure `input` into `output` with `config`.
pub fn process(input: &Path, output: &Path, config: &Config) -> Result<Report> {
    Processor::new(config).process(input, output)
}

/// `<stem>-fixed.epub` next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string());
    input.with_file_name(format!("{stem}-fixed.epub"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/books/Dune.epub")),
            PathBuf::from("/books/Dune-fixed.epub")
        );
        assert_eq!(
            default_output_path(Path::new("novel")),
            PathBuf::from("novel-fixed.epub")
        );
    }

    #[test]
    fn test_missing_input_fails_in_extract() {
        let dir = tempfile::tempdir().unwrap();
        let format = dir.path().join("format");
        std::fs::create_dir(&format).unwrap();
        std::fs::write(format.join("stylesheet.css"), "").unwrap();
        std::fs::write(format.join("jura.ttf"), "").unwrap();
        std::fs::write(format.join("nav.xhtml"), "").unwrap();

        let config = Config::default().with_format_dir(&format);
        let err = process(&dir.path().join("absent.epub"), &dir.path().join("out.epub"), &config)
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Extract));
        assert!(err.to_string().starts_with("extract failed: "));
        assert!(!dir.path().join("out.epub").exists());
    }

    #[test]
    fn test_missing_templates_fail_in_build() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default().with_format_dir(dir.path().join("nowhere"));
        let err = process(&dir.path().join("in.epub"), &dir.path().join("out.epub"), &config)
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Build));
    }
}
