//! # refolio
//!
//! Restructures fragmented EPUB files into clean, consistently organized
//! packages.
//!
//! Ebooks coming out of conversion tools often split a chapter across
//! dozens of tiny files, pad the reading order with table-of-contents pages
//! and carry converter-specific markup. refolio reads such a package,
//! folds the fragments back into chapters, strips publisher noise and
//! writes a fresh EPUB 3 with a fixed layout: one file per chapter,
//! generated navigation, a title page and jacket when a cover exists.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use refolio::{Config, process};
//!
//! let config = Config::default().with_format_dir("format");
//! let report = process(Path::new("book.epub"), Path::new("book-fixed.epub"), &config)?;
//! println!("{} chapters, {} warnings", report.chapters, report.warnings.len());
//! # Ok::<(), refolio::Error>(())
//! ```
//!
//! ## Pipeline
//!
//! 1. [`package::extract`] unpacks the archive into a temporary directory.
//! 2. [`epub::parse`] reads the container and package descriptor into a
//!    [`Book`], falling back to a tolerant scanner for broken descriptors.
//! 3. [`classify::classify`] buckets the manifest and [`content`] loads the
//!    spine documents.
//! 4. [`consolidate::consolidate`] turns documents into chapters.
//! 5. [`build::StructureBuilder`] sanitizes chapters and lays out the new
//!    package, which [`package::write_archive`] zips up.

pub mod analyze;
pub mod book;
pub mod build;
pub mod classify;
pub mod config;
pub mod consolidate;
pub mod content;
pub mod dom;
pub mod epub;
pub mod error;
pub mod package;
pub mod pipeline;
pub mod report;
pub mod sanitize;
pub(crate) mod util;

pub use analyze::{EpubStats, Validation, analyze, compare, validate};
pub use book::{Book, Chapter, ManifestItem, Metadata, SpineItem};
pub use config::{Config, ConsolidationConfig, SanitizeConfig};
pub use error::{Error, Result, Stage};
pub use pipeline::{Processor, default_output_path, process};
pub use report::Report;
