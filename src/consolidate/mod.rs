//! Chapter consolidation.
//!
//! Source packages often split one logical chapter across many tiny files,
//! or pad the reading order with table-of-contents pages. Up to
//! `direct_mode_limit` documents are taken one-to-one. Above that the engine
//! drops navigation noise and folds short documents into the preceding
//! chapter until it would grow past `max_chapter_len`.

mod title;

pub use title::clean_title;

use log::{debug, info};

use crate::book::Chapter;
use crate::config::ConsolidationConfig;
use crate::content::RawDocument;

/// Turn loaded documents into chapters.
pub fn consolidate(
    documents: Vec<RawDocument>,
    config: &ConsolidationConfig,
    label: &str,
) -> Vec<Chapter> {
    if !config.enabled || documents.len() <= config.direct_mode_limit {
        debug!("direct mode: {} documents", documents.len());
        return documents
            .into_iter()
            .enumerate()
            .map(|(order, doc)| Accumulator::open(doc, order).seal(order + 1, label, config))
            .collect();
    }

    let total = documents.len();
    let mut chapters: Vec<Chapter> = Vec::new();
    let mut current: Option<Accumulator> = None;

    for (order, doc) in documents.into_iter().enumerate() {
        if is_navigation(&doc, config) {
            debug!("dropping navigation document {}", doc.href);
            continue;
        }

        match current.as_mut() {
            Some(acc)
                if doc.text_len < config.min_chapter_len
                    && acc.text_len + doc.text_len <= config.max_chapter_len =>
            {
                acc.merge(doc, config);
            }
            _ => {
                if let Some(acc) = current.take() {
                    let position = chapters.len() + 1;
                    chapters.push(acc.seal(position, label, config));
                }
                current = Some(Accumulator::open(doc, order));
            }
        }
    }

    if let Some(acc) = current {
        let position = chapters.len() + 1;
        chapters.push(acc.seal(position, label, config));
    }

    info!("consolidated {total} documents into {} chapters", chapters.len());
    chapters
}

/// A chapter under construction.
struct Accumulator {
    id: String,
    title: String,
    content: String,
    order: usize,
    sources: Vec<String>,
    text_len: usize,
}

impl Accumulator {
    fn open(doc: RawDocument, order: usize) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            content: doc.markup,
            order,
            sources: vec![doc.href],
            text_len: doc.text_len,
        }
    }

    fn merge(&mut self, doc: RawDocument, config: &ConsolidationConfig) {
        debug!("merging {} into chapter starting at {}", doc.href, self.sources[0]);
        self.content.push_str("\n\n");
        self.content.push_str(&doc.markup);
        self.text_len += doc.text_len;
        self.sources.push(doc.href);
        if is_better_title(&doc.title, &self.title, &config.generic_title_words) {
            self.title = doc.title;
        }
    }

    fn seal(self, position: usize, label: &str, config: &ConsolidationConfig) -> Chapter {
        Chapter {
            id: self.id,
            title: clean_title(&self.title, position, label, &config.title_prefixes),
            content: self.content,
            order: self.order,
            sources: self.sources,
            text_len: self.text_len,
        }
    }
}

/// Whether `candidate` describes a chapter better than `current`.
pub fn is_better_title(candidate: &str, current: &str, generic_words: &[String]) -> bool {
    let candidate = candidate.trim();
    let current = current.trim();
    let candidate_lower = candidate.to_lowercase();
    let current_lower = current.to_lowercase();

    let less_generic = generic_words.iter().any(|word| {
        let word = word.to_lowercase();
        current_lower.contains(&word) && !candidate_lower.contains(&word)
    });
    if less_generic {
        return true;
    }

    let candidate_len = candidate.chars().count();
    candidate_len > current.chars().count() && candidate_len > 10
}

/// Table-of-contents pages and other link-dense navigation noise.
pub fn is_navigation(doc: &RawDocument, config: &ConsolidationConfig) -> bool {
    let title = doc.title.to_lowercase();
    let text = doc.text.to_lowercase();

    let marked = config.nav_markers.iter().any(|marker| {
        let marker = marker.to_lowercase();
        contains_word(&title, &marker) || contains_word(&text, &marker)
    });
    if marked {
        return true;
    }

    let density = doc.link_count as f64 * 1000.0 / doc.text_len.max(1) as f64;
    doc.link_count > config.min_nav_links && density > config.max_link_density
}

/// `needle` occurs in `haystack` without letters or digits on either side.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, title: &str, text_len: usize) -> RawDocument {
        RawDocument {
            id: id.to_string(),
            href: format!("{id}.xhtml"),
            markup: format!("<p>{id}</p>"),
            title: title.to_string(),
            text: "x".repeat(text_len),
            text_len,
            link_count: 0,
        }
    }

    fn config() -> ConsolidationConfig {
        ConsolidationConfig::default()
    }

    #[test]
    fn test_direct_mode_keeps_every_document() {
        let docs: Vec<_> = (0..20).map(|i| doc(&format!("d{i}"), "Contents", 10)).collect();
        let chapters = consolidate(docs, &config(), "Chapter");
        assert_eq!(chapters.len(), 20);
        assert_eq!(chapters[3].order, 3);
    }

    #[test]
    fn test_disabled_forces_direct_mode() {
        let docs: Vec<_> = (0..30).map(|i| doc(&format!("d{i}"), "T", 10)).collect();
        let cfg = ConsolidationConfig {
            enabled: false,
            ..config()
        };
        assert_eq!(consolidate(docs, &cfg, "Chapter").len(), 30);
    }

    #[test]
    fn test_short_documents_merge() {
        let mut docs = vec![doc("a", "Chapter 1", 2000)];
        docs.extend((0..25).map(|i| doc(&format!("s{i}"), "", 100)));
        let chapters = consolidate(docs, &config(), "Chapter");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].sources.len(), 26);
        assert_eq!(chapters[0].text_len, 4500);
        assert!(chapters[0].content.contains("<p>a</p>\n\n<p>s0</p>"));
    }

    #[test]
    fn test_first_short_document_opens_chapter() {
        let docs: Vec<_> = (0..21).map(|i| doc(&format!("d{i}"), "Part", 10)).collect();
        let chapters = consolidate(docs, &config(), "Chapter");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].order, 0);
    }

    #[test]
    fn test_merge_respects_max() {
        let docs: Vec<_> = (0..30).map(|i| doc(&format!("d{i}"), "T", 700)).collect();
        let chapters = consolidate(docs, &config(), "Chapter");
        for chapter in &chapters {
            assert!(chapter.text_len <= 15_000);
        }
        // 21 documents of 700 fit in 15000
        assert_eq!(chapters[0].sources.len(), 21);
        assert_eq!(chapters.len(), 2);
    }

    #[test]
    fn test_navigation_dropped() {
        let mut docs: Vec<_> = (0..25).map(|i| doc(&format!("d{i}"), "Story", 1000)).collect();
        docs[0].title = "Table of Contents".into();
        docs[1].title = "TOC".into();
        docs[2].text = "mục lục".into();
        docs[3].link_count = 20;
        docs[3].text_len = 400;
        let chapters = consolidate(docs, &config(), "Chapter");
        assert_eq!(chapters.len(), 21);
        assert_eq!(chapters[0].order, 4);
    }

    #[test]
    fn test_marker_in_body_only_is_navigation() {
        let mut contents = doc("front", "Front", 0);
        contents.text = "Contents One 1 Two 9".into();
        contents.text_len = contents.text.len();
        assert!(is_navigation(&contents, &config()));

        let mut prose = doc("story", "Front", 0);
        prose.text = "The stock tocsin rang".into();
        assert!(!is_navigation(&prose, &config()));

        let mut docs: Vec<_> = (0..21).map(|i| doc(&format!("d{i}"), "Story", 1000)).collect();
        docs.insert(0, contents);
        let chapters = consolidate(docs, &config(), "Chapter");
        assert_eq!(chapters.len(), 21);
        assert!(chapters.iter().all(|c| c.title != "Front"));
    }

    #[test]
    fn test_all_navigation_yields_nothing() {
        let docs: Vec<_> = (0..25).map(|i| doc(&format!("d{i}"), "Contents", 1000)).collect();
        assert!(consolidate(docs, &config(), "Chapter").is_empty());
    }

    #[test]
    fn test_titles_cleaned_with_output_position() {
        let docs: Vec<_> = (0..22).map(|i| doc(&format!("d{i}"), "Untitled", 1000)).collect();
        let chapters = consolidate(docs, &config(), "Chương");
        assert_eq!(chapters[0].title, "Chương 1");
        assert_eq!(chapters[21].title, "Chương 22");
    }

    #[test]
    fn test_is_better_title() {
        let words = config().generic_title_words;
        assert!(is_better_title("The Storm", "Chapter 4", &words));
        assert!(!is_better_title("Chapter 5", "Chapter 4", &words));
        assert!(is_better_title("A Much Longer Title", "Short", &words));
        assert!(!is_better_title("Tiny", "Short one", &words));
        assert!(!is_better_title("Exactly10!", "Short", &words));
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("toc", "toc"));
        assert!(contains_word("the toc.", "toc"));
        assert!(!contains_word("stock", "toc"));
        assert!(!contains_word("tocsin", "toc"));
        assert!(contains_word("mục lục", "mục lục"));
    }
}
