//! Locating source assets on disk.
//!
//! Manifest hrefs in the wild are frequently wrong: relative to the wrong
//! directory, pointing into a flattened `images/` folder, or naming a file
//! that only exists somewhere else in the tree. Resolution tries the
//! declared location first and widens from there.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use walkdir::WalkDir;

use crate::book::{Book, file_name, resolve_relative};
use crate::report::Warnings;

/// Find the file behind a manifest href.
///
/// Tried in order: the descriptor directory, `OEBPS/<href>`,
/// `OEBPS/images/<name>`, `<root>/<name>`, then a search of the whole tree
/// by file name. Several search hits are reported and the first is used.
pub fn resolve_asset(book: &Book, href: &str, warnings: &mut Warnings) -> Option<PathBuf> {
    let root = book.path.as_path();
    let decoded = decode(href);
    let name = file_name(&decoded).to_string();
    if name.is_empty() {
        return None;
    }

    let candidates = [
        book.resolve_href(href),
        root.join(resolve_relative("OEBPS", href.trim_start_matches('/'))),
        root.join("OEBPS").join("images").join(&name),
        root.join(&name),
    ];
    if let Some(found) = candidates.into_iter().find(|p| p.is_file()) {
        return Some(found);
    }

    let matches = search(root, &name);
    if matches.len() > 1 {
        let listed: Vec<String> = matches.iter().map(|p| p.display().to_string()).collect();
        warnings.push(format!(
            "{href} matches several files, using the first: {}",
            listed.join(", ")
        ));
    }
    matches.into_iter().next()
}

fn decode(href: &str) -> String {
    let path = href.split(['#', '?']).next().unwrap_or(href);
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

/// Files named `name` below `root`, in sorted walk order.
fn search(root: &Path, name: &str) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name().to_str() == Some(name))
        .map(|entry| entry.into_path())
        .collect()
}

/// Output file names already taken in one directory.
#[derive(Debug, Default)]
pub struct NameRegistry {
    used: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a name as taken without renaming.
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_ascii_lowercase());
    }

    /// Claim `name`, or `<stem>-<n>.<ext>` with the smallest free `n`.
    ///
    /// The flag is true when the name had to change. Names compare
    /// case-insensitively so the output also works on such filesystems.
    pub fn claim(&mut self, name: &str) -> (String, bool) {
        if self.used.insert(name.to_ascii_lowercase()) {
            return (name.to_string(), false);
        }
        let (stem, ext) = match name.rfind('.') {
            Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
            _ => (name, ""),
        };
        let mut n = 1;
        loop {
            let candidate = format!("{stem}-{n}{ext}");
            if self.used.insert(candidate.to_ascii_lowercase()) {
                return (candidate, true);
            }
            n += 1;
        }
    }
}
