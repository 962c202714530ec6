//! Chapter title normalization.

use crate::util::decode_entities;

/// Normalize a chapter title.
///
/// Entities are decoded, whitespace collapsed and leading prefix words
/// ("Part", "Section", ...) stripped while something remains after them.
/// Bare numbers become `"{label} {n}"`; empty and "untitled" titles become
/// `"{label} {position}"`. Applying it twice gives the same result.
pub fn clean_title(title: &str, position: usize, label: &str, prefixes: &[String]) -> String {
    let mut decoded = title.trim().to_string();
    loop {
        let next = decode_entities(&decoded).into_owned();
        if next == decoded {
            break;
        }
        decoded = next;
    }

    let mut title = decoded.split_whitespace().collect::<Vec<_>>().join(" ");

    while let Some(rest) = strip_prefix_word(&title, prefixes) {
        title = rest.to_string();
    }

    if !title.is_empty() && title.chars().all(|c| c.is_ascii_digit()) {
        format!("{label} {title}")
    } else if title.is_empty() || title.eq_ignore_ascii_case("untitled") {
        format!("{label} {position}")
    } else {
        title
    }
}

/// Remainder after a leading prefix word, if the title starts with one and
/// has more words after it.
fn strip_prefix_word<'a>(title: &'a str, prefixes: &[String]) -> Option<&'a str> {
    let (first, rest) = title.split_once(' ')?;
    let word = first
        .trim_end_matches([':', '.', ',', '-'])
        .to_lowercase();
    if prefixes.iter().any(|p| p.to_lowercase() == word) {
        Some(rest.trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TITLE_PREFIXES;

    fn clean(title: &str, position: usize) -> String {
        let prefixes: Vec<String> = TITLE_PREFIXES.iter().map(|s| s.to_string()).collect();
        clean_title(title, position, "Chapter", &prefixes)
    }

    #[test]
    fn test_strips_prefixes() {
        assert_eq!(clean("Part One: The Road", 1), "One: The Road");
        assert_eq!(clean("Phần 2", 1), "Chapter 2");
        assert_eq!(clean("Section: Part 4", 1), "Chapter 4");
        assert_eq!(clean("Particle Physics", 1), "Particle Physics");
    }

    #[test]
    fn test_lone_prefix_kept() {
        assert_eq!(clean("Part", 3), "Part");
    }

    #[test]
    fn test_numeric_and_untitled() {
        assert_eq!(clean("12", 3), "Chapter 12");
        assert_eq!(clean("  ", 3), "Chapter 3");
        assert_eq!(clean("UNTITLED", 7), "Chapter 7");
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(clean("Tom &amp;amp; Jerry", 1), "Tom & Jerry");
        assert_eq!(clean("Part&#32;3", 1), "Chapter 3");
    }

    #[test]
    fn test_custom_label() {
        let prefixes = vec!["phần".to_string()];
        assert_eq!(clean_title("5", 1, "Chương", &prefixes), "Chương 5");
        assert_eq!(clean_title("", 2, "Chương", &prefixes), "Chương 2");
    }

    #[test]
    fn test_idempotent_examples() {
        for title in ["Part 3", "&amp;#49;", "Section Untitled", "  Chapter   9 ", "Part part"] {
            let once = clean(title, 4);
            assert_eq!(clean(&once, 4), once, "title {title:?}");
        }
    }
}
