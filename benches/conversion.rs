//! Benchmarks for the restructuring pipeline.
//!
//! Run with: cargo bench

#[path = "../tests/common/mod.rs"]
mod common;

use criterion::{Criterion, criterion_group, criterion_main};

use common::{EpubFixture, document, toc_document};
use refolio::consolidate::consolidate;
use refolio::content::RawDocument;
use refolio::sanitize::{ImageMap, Sanitizer};
use refolio::{ConsolidationConfig, SanitizeConfig, process};

/// Documents shaped like a converter's output: a contents page, then
/// alternating long sections and short fragments.
fn sample_documents() -> Vec<RawDocument> {
    let mut docs = vec![RawDocument::from_markup("toc", "toc.xhtml", toc_document(40))];
    for i in 0..120 {
        let len = if i % 4 == 0 { 3000 } else { 350 };
        let title = if i % 4 == 0 { format!("Section {i}") } else { String::new() };
        docs.push(RawDocument::from_markup(
            format!("d{i}"),
            format!("d{i}.xhtml"),
            document(&title, len),
        ));
    }
    docs
}

fn publisher_markup() -> String {
    let mut markup = String::from("<html><head><title>x</title></head><body class=\"calibre\">");
    for i in 0..400 {
        markup.push_str(&format!(
            "<div class=\"calibre{i} sgc-2\" id=\"calibre_toc_{i}\"><p style=\"margin:0\">\
             Paragraph {i} of the chapter.</p><img src=\"../Images/img{i}.jpg\"/></div>"
        ));
    }
    markup.push_str("</body></html>");
    markup
}

// ============================================================================
// Consolidation Benchmarks
// ============================================================================

fn bench_load_documents(c: &mut Criterion) {
    let markup = document("Section", 3000);

    c.bench_function("load_document", |b| {
        b.iter(|| RawDocument::from_markup("d", "d.xhtml", markup.clone()));
    });
}

fn bench_consolidate(c: &mut Criterion) {
    let docs = sample_documents();
    let config = ConsolidationConfig::default();

    c.bench_function("consolidate", |b| {
        b.iter(|| consolidate(docs.clone(), &config, "Chapter"));
    });
}

// ============================================================================
// Sanitizer Benchmarks
// ============================================================================

fn bench_sanitize(c: &mut Criterion) {
    let markup = publisher_markup();
    let config = SanitizeConfig::default();
    let images = ImageMap::new();

    c.bench_function("sanitize", |b| {
        b.iter(|| Sanitizer::new(&config, &images).with_base_dir("OEBPS/Text").sanitize(&markup));
    });
}

fn bench_sanitize_fallback(c: &mut Criterion) {
    let markup = publisher_markup();
    let images = ImageMap::new();

    c.bench_function("sanitize_fallback", |b| {
        b.iter(|| refolio::sanitize::fallback_clean(&markup, &images, "OEBPS/Text"));
    });
}

// ============================================================================
// End-to-end Benchmarks
// ============================================================================

fn bench_process(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.epub");
    let mut fixture = EpubFixture::new("Benchmark").document("toc", "toc.xhtml", toc_document(40));
    for i in 0..60 {
        let len = if i % 3 == 0 { 2500 } else { 400 };
        fixture = fixture.document(&format!("d{i}"), &format!("d{i}.xhtml"), document("", len));
    }
    fixture.write(&input);
    let config = common::config(dir.path());
    let output = dir.path().join("out.epub");

    c.bench_function("process", |b| {
        b.iter(|| process(&input, &output, &config).unwrap());
    });
}

criterion_group!(
    benches,
    // Consolidation
    bench_load_documents,
    bench_consolidate,
    // Sanitizer
    bench_sanitize,
    bench_sanitize_fallback,
    // End-to-end
    bench_process,
);
criterion_main!(benches);
