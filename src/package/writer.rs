use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;

pub const MIMETYPE: &[u8] = b"application/epub+zip";
const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Serialize a laid-out package directory into an EPUB archive.
///
/// `mimetype` is written first and stored, `META-INF/container.xml` second,
/// then every other file deflated in sorted walk order. The archive is
/// assembled in a temporary file next to `dest` and only moved into place
/// once complete, so a failed run never leaves a truncated output.
pub fn write_archive(src_dir: &Path, dest: &Path, compression_level: Option<i64>) -> Result<()> {
    let dest_dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = NamedTempFile::new_in(&dest_dir)?;

    {
        let mut zip = ZipWriter::new(tmp.as_file_mut());

        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level.unwrap_or(6)));

        zip.start_file("mimetype", stored)?;
        zip.write_all(MIMETYPE)?;

        let container = src_dir.join(CONTAINER_PATH);
        if container.is_file() {
            zip.start_file(CONTAINER_PATH, deflated)?;
            io::copy(&mut File::open(&container)?, &mut zip)?;
        }

        for (name, path) in package_files(src_dir)? {
            if name == "mimetype" || name == CONTAINER_PATH {
                continue;
            }
            zip.start_file(name.as_str(), deflated)?;
            io::copy(&mut File::open(&path)?, &mut zip)?;
            debug!("packed {name}");
        }

        zip.finish()?;
    }

    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

/// Regular files below `root` as (forward-slash name, path), sorted.
fn package_files(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((name, entry.path().to_path_buf()));
    }
    Ok(files)
}
