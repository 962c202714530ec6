//! Run configuration.
//!
//! A [`Config`] is built once per invocation and passed by reference into
//! every component. Heuristic thresholds live here as named constants so
//! tests can check behavior exactly at the boundaries.

use std::path::PathBuf;

/// Documents at or below this count are converted one-to-one.
pub const DIRECT_MODE_LIMIT: usize = 20;
/// Plain-text length below which a document is merged into its predecessor.
pub const MIN_CHAPTER_LEN: usize = 800;
/// Plain-text length a merged chapter may not exceed.
pub const MAX_CHAPTER_LEN: usize = 15_000;
/// Links per 1000 characters above which a document is navigation noise.
pub const MAX_LINK_DENSITY: f64 = 10.0;
/// Documents with this many links or fewer are never link-dense.
pub const MIN_NAV_LINKS: usize = 5;
/// Per-entry extraction cap (100 MiB).
pub const MAX_ENTRY_SIZE: u64 = 100 * 1024 * 1024;
/// DOM size above which the sanitizer hands over to the pattern fallback.
pub const MAX_DOM_NODES: usize = 250_000;

/// Markers identifying table-of-contents pages.
pub const NAV_MARKERS: &[&str] = &["table of contents", "mục lục", "contents", "toc", "navigation"];
/// Placeholder words that make a title less descriptive.
pub const GENERIC_TITLE_WORDS: &[&str] = &["chapter", "part", "chương", "phần"];
/// Leading words stripped from chapter titles.
pub const TITLE_PREFIXES: &[&str] = &["part", "phần", "section"];

/// Chapter consolidation thresholds.
#[derive(Debug, Clone)]
pub struct ConsolidationConfig {
    /// When false every document becomes its own chapter.
    pub enabled: bool,
    pub direct_mode_limit: usize,
    pub min_chapter_len: usize,
    pub max_chapter_len: usize,
    pub max_link_density: f64,
    pub min_nav_links: usize,
    pub nav_markers: Vec<String>,
    pub generic_title_words: Vec<String>,
    pub title_prefixes: Vec<String>,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            direct_mode_limit: DIRECT_MODE_LIMIT,
            min_chapter_len: MIN_CHAPTER_LEN,
            max_chapter_len: MAX_CHAPTER_LEN,
            max_link_density: MAX_LINK_DENSITY,
            min_nav_links: MIN_NAV_LINKS,
            nav_markers: to_owned(NAV_MARKERS),
            generic_title_words: to_owned(GENERIC_TITLE_WORDS),
            title_prefixes: to_owned(TITLE_PREFIXES),
        }
    }
}

/// Markup sanitizer limits.
#[derive(Debug, Clone)]
pub struct SanitizeConfig {
    pub max_dom_nodes: usize,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            max_dom_nodes: MAX_DOM_NODES,
        }
    }
}

/// Configuration for a restructuring run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the stylesheet, font, logo and markup templates.
    pub format_dir: PathBuf,
    pub consolidation: ConsolidationConfig,
    pub sanitize: SanitizeConfig,
    /// Word used for generated chapter titles ("Chapter 3").
    pub chapter_label: String,
    /// Language written when the source declares none.
    pub default_language: String,
    /// Jacket subtitle used when the source has no description.
    pub default_subtitle: String,
    pub max_entry_size: u64,
    /// Compression level for deflated entries (0-9, default 6).
    pub compression_level: Option<i64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format_dir: PathBuf::from("format"),
            consolidation: ConsolidationConfig::default(),
            sanitize: SanitizeConfig::default(),
            chapter_label: "Chapter".to_string(),
            default_language: "en".to_string(),
            default_subtitle: "A Refolio Edition".to_string(),
            max_entry_size: MAX_ENTRY_SIZE,
            compression_level: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.format_dir = dir.into();
        self
    }

    pub fn with_consolidation(mut self, consolidation: ConsolidationConfig) -> Self {
        self.consolidation = consolidation;
        self
    }

    pub fn with_chapter_label(mut self, label: impl Into<String>) -> Self {
        self.chapter_label = label.into();
        self
    }

    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    pub fn with_max_entry_size(mut self, limit: u64) -> Self {
        self.max_entry_size = limit;
        self
    }

    pub fn with_max_dom_nodes(mut self, limit: usize) -> Self {
        self.sanitize.max_dom_nodes = limit;
        self
    }

    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = Some(level);
        self
    }
}

fn to_owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
