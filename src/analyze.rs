//! Archive-level inspection: statistics, structural validation and
//! before/after comparison.
//!
//! Everything here works from the zip listing alone; nothing is extracted.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Serialize;
use zip::ZipArchive;

use crate::epub::CONTAINER_PATH;
use crate::error::Result;

/// File-type counts of an EPUB archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EpubStats {
    pub path: PathBuf,
    pub entries: usize,
    /// Content documents, not counting navigation and cover pages.
    pub content_files: usize,
    pub images: usize,
    pub stylesheets: usize,
    pub fonts: usize,
    /// Sum of uncompressed entry sizes, in bytes.
    pub total_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Content,
    Image,
    Stylesheet,
    Font,
    Other,
}

fn entry_kind(name: &str) -> EntryKind {
    let lower = name.to_ascii_lowercase();
    let base = lower.rsplit('/').next().unwrap_or(&lower);
    let ext = base.rsplit_once('.').map_or("", |(_, ext)| ext);

    match ext {
        "xhtml" | "html" | "htm" => {
            if ["nav", "toc", "title", "cover"].iter().any(|w| base.contains(w)) {
                EntryKind::Other
            } else {
                EntryKind::Content
            }
        }
        "jpg" | "jpeg" | "png" | "gif" | "svg" | "webp" => EntryKind::Image,
        "css" => EntryKind::Stylesheet,
        "ttf" | "otf" | "woff" | "woff2" => EntryKind::Font,
        _ => EntryKind::Other,
    }
}

/// Count the entries of an EPUB archive by type.
pub fn analyze(path: &Path) -> Result<EpubStats> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut stats = EpubStats {
        path: path.to_path_buf(),
        entries: archive.len(),
        ..Default::default()
    };

    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        stats.total_size += entry.size();
        match entry_kind(entry.name()) {
            EntryKind::Content => stats.content_files += 1,
            EntryKind::Image => stats.images += 1,
            EntryKind::Stylesheet => stats.stylesheets += 1,
            EntryKind::Font => stats.fonts += 1,
            EntryKind::Other => {}
        }
    }

    Ok(stats)
}

impl fmt::Display for EpubStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File: {}", self.path.display())?;
        writeln!(f, "Entries: {}", self.entries)?;
        writeln!(f, "Content files: {}", self.content_files)?;
        writeln!(f, "Images: {}", self.images)?;
        writeln!(f, "Stylesheets: {}", self.stylesheets)?;
        writeln!(f, "Fonts: {}", self.fonts)?;
        write!(f, "Total size: {}", format_size(self.total_size))
    }
}

fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let value = bytes as f64;
    if value >= KIB * KIB {
        format!("{:.1} MiB", value / (KIB * KIB))
    } else if value >= KIB {
        format!("{:.1} KiB", value / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Outcome of a structural check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check that an archive looks like an EPUB.
///
/// A container document and a package descriptor are required. A missing
/// or misplaced `mimetype` is only a warning; most readers cope.
/// Archives that cannot be opened at all return an error.
pub fn validate(path: &Path) -> Result<Validation> {
    let archive = ZipArchive::new(File::open(path)?)?;
    let names: Vec<&str> = archive.file_names().collect();
    let mut validation = Validation::default();

    if !names.contains(&CONTAINER_PATH) {
        validation.errors.push(format!("missing {CONTAINER_PATH}"));
    }
    if !names.iter().any(|n| n.to_ascii_lowercase().ends_with(".opf")) {
        validation.errors.push("no package descriptor (.opf)".to_string());
    }

    match names.iter().position(|&n| n == "mimetype") {
        None => validation.warnings.push("missing mimetype".to_string()),
        Some(0) => {}
        Some(_) => validation.warnings.push("mimetype is not the first entry".to_string()),
    }

    Ok(validation)
}

/// Statistics of two archives, typically input and output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub before: EpubStats,
    pub after: EpubStats,
}

impl Comparison {
    /// Relative size change in percent; negative when the output shrank.
    pub fn size_change_percent(&self) -> f64 {
        if self.before.total_size == 0 {
            return 0.0;
        }
        (self.after.total_size as f64 - self.before.total_size as f64) * 100.0
            / self.before.total_size as f64
    }
}

pub fn compare(before: &Path, after: &Path) -> Result<Comparison> {
    Ok(Comparison {
        before: analyze(before)?,
        after: analyze(after)?,
    })
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("Content files", self.before.content_files, self.after.content_files),
            ("Images", self.before.images, self.after.images),
            ("Stylesheets", self.before.stylesheets, self.after.stylesheets),
            ("Fonts", self.before.fonts, self.after.fonts),
        ];
        writeln!(f, "{:<14} {:>10} {:>10}", "", "before", "after")?;
        for (label, before, after) in rows {
            writeln!(f, "{label:<14} {before:>10} {after:>10}")?;
        }
        write!(
            f,
            "{:<14} {:>10} {:>10} ({:+.1}%)",
            "Total size",
            format_size(self.before.total_size),
            format_size(self.after.total_size),
            self.size_change_percent()
        )
    }
}
