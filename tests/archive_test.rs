//! Layout of the archives refolio writes.

mod common;

use std::fs::File;
use std::io::Read;

use common::{EpubFixture, config, document, entry_names, read_entry};
use refolio::epub::parse_descriptor;
use refolio::{process, validate};
use zip::{CompressionMethod, ZipArchive};

fn build(dir: &std::path::Path) -> std::path::PathBuf {
    let input = dir.join("in.epub");
    EpubFixture::new("Layout")
        .document("a", "Text/a.xhtml", document("First", 900))
        .document("b", "Text/b.xhtml", document("Second", 900))
        .image("cover", "Images/cover.png")
        .image("map", "Images/map.png")
        .cover("cover")
        .write(&input);
    let output = dir.join("out.epub");
    process(&input, &output, &config(dir)).unwrap();
    output
}

#[test]
fn test_mimetype_is_first_and_stored() {
    let dir = tempfile::tempdir().unwrap();
    let output = build(dir.path());

    let mut archive = ZipArchive::new(File::open(&output).unwrap()).unwrap();
    let mut first = archive.by_index(0).unwrap();
    assert_eq!(first.name(), "mimetype");
    assert_eq!(first.compression(), CompressionMethod::Stored);
    let mut content = Vec::new();
    first.read_to_end(&mut content).unwrap();
    assert_eq!(content, b"application/epub+zip");
}

#[test]
fn test_entry_order() {
    let dir = tempfile::tempdir().unwrap();
    let names = entry_names(&build(dir.path()));

    assert_eq!(names[0], "mimetype");
    assert_eq!(names[1], "META-INF/container.xml");
    let rest = &names[2..];
    let mut sorted = rest.to_vec();
    sorted.sort();
    assert_eq!(rest, sorted.as_slice());
    assert_eq!(names.iter().filter(|n| n.as_str() == "mimetype").count(), 1);
}

#[test]
fn test_manifest_matches_archive() {
    let dir = tempfile::tempdir().unwrap();
    let output = build(dir.path());
    let names = entry_names(&output);

    let package = parse_descriptor(&read_entry(&output, "OEBPS/content.opf")).unwrap();
    for item in &package.manifest {
        let entry = format!("OEBPS/{}", item.href);
        assert!(names.contains(&entry), "manifest lists {entry} but the archive lacks it");
    }
    assert!(package.manifest.iter().any(|i| i.has_property("cover-image")));
    assert!(package.manifest.iter().any(|i| i.has_property("nav")));
    assert_eq!(package.spine.len(), 5);
    assert_eq!(package.metadata.title, "Layout");
    assert!(!package.metadata.identifier.is_empty());
}

#[test]
fn test_container_points_at_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let output = build(dir.path());
    let container = read_entry(&output, "META-INF/container.xml");
    assert!(container.contains(r#"full-path="OEBPS/content.opf""#));
}

#[test]
fn test_output_validates_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let validation = validate(&build(dir.path())).unwrap();
    assert!(validation.is_valid());
    assert!(validation.warnings.is_empty());
}

#[test]
fn test_images_are_flattened() {
    let dir = tempfile::tempdir().unwrap();
    let names = entry_names(&build(dir.path()));
    assert!(names.contains(&"OEBPS/images/cover.png".to_string()));
    assert!(names.contains(&"OEBPS/images/map.png".to_string()));
    assert!(!names.iter().any(|n| n.contains("Images/")));
}
