use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use log::debug;
use zip::ZipArchive;

use crate::error::{Error, Result};

/// Unpack an EPUB archive into `dest`.
///
/// Entries whose names would escape `dest` fail with
/// [`Error::PathTraversal`]. Entries larger than `max_entry_size` (declared or
/// actual) fail with [`Error::EntryTooLarge`] and leave no partial file behind.
pub fn extract(archive_path: &Path, dest: &Path, max_entry_size: u64) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    fs::create_dir_all(dest)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        let Some(relative) = entry.enclosed_name() else {
            return Err(Error::PathTraversal(name));
        };
        let target = dest.join(&relative);
        if !target.starts_with(dest) {
            return Err(Error::PathTraversal(name));
        }

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if entry.size() > max_entry_size {
            return Err(Error::EntryTooLarge {
                name,
                limit: max_entry_size,
            });
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        // Declared sizes can lie; cap the actual bytes read as well
        let mut out = File::create(&target)?;
        let written = io::copy(&mut (&mut entry).take(max_entry_size + 1), &mut out)?;
        if written > max_entry_size {
            drop(out);
            fs::remove_file(&target)?;
            return Err(Error::EntryTooLarge {
                name,
                limit: max_entry_size,
            });
        }
        debug!("extracted {name} ({written} bytes)");
    }

    Ok(())
}
