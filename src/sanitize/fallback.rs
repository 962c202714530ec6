//! Pattern-based cleanup for markup the DOM path refuses.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{ImageMap, filter_classes, is_publisher_id};

static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*?)(?:</body\s*>|$)").unwrap());

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static EMBEDDED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>|<script\b[^>]*>.*?</script\s*>").unwrap()
});

static STYLE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\s+style\s*=\s*(?:"[^"]*"|'[^']*')"#).unwrap());

static CLASS_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\s+class\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

static ID_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\s+id\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

static IMG_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<img\b[^>]*?\ssrc\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static SVG_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<image\b[^>]*?\s(?:xlink:)?href\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static EMPTY_DIV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<div\b[^>]*>\s*</div\s*>").unwrap());

static EMPTY_SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<span\b[^>]*>\s*</span\s*>").unwrap());

/// Void elements written HTML-style (`<br>`), closed for XHTML.
static VOID_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(br|hr|img|meta|link|input|col|area|wbr)\b([^>]*?)\s*/?>").unwrap()
});

/// Clean markup with substitutions. Never fails.
pub fn fallback_clean(raw: &str, images: &ImageMap, base_dir: &str) -> String {
    // Merged chapters hold several documents; keep every body
    let bodies: Vec<&str> = BODY_RE
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();
    let body = if bodies.is_empty() { raw.to_string() } else { bodies.join("\n") };

    let text = COMMENT_RE.replace_all(&body, "");
    let text = EMBEDDED_RE.replace_all(&text, "");
    let text = STYLE_ATTR_RE.replace_all(&text, "");

    let text = CLASS_ATTR_RE.replace_all(&text, |caps: &Captures<'_>| {
        match filter_classes(quoted(caps)) {
            Some(kept) => format!(" class=\"{kept}\""),
            None => String::new(),
        }
    });

    let text = ID_ATTR_RE.replace_all(&text, |caps: &Captures<'_>| {
        if is_publisher_id(quoted(caps)) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });

    let rewrite = |caps: &Captures<'_>| match images.rewrite(quoted(caps), base_dir) {
        Some(target) => format!("{}\"{target}\"", &caps[1]),
        None => caps[0].to_string(),
    };
    let text = IMG_SRC_RE.replace_all(&text, rewrite);
    let text = SVG_IMAGE_RE.replace_all(&text, rewrite);

    let text = EMPTY_DIV_RE.replace_all(&text, "");
    let text = EMPTY_SPAN_RE.replace_all(&text, "");
    let text = VOID_TAG_RE.replace_all(&text, "<$1$2/>");

    text.trim().to_string()
}

/// The double- or single-quoted value captured by groups 1/2 or 2/3.
fn quoted<'t>(caps: &Captures<'t>) -> &'t str {
    let n = caps.len();
    caps.get(n - 2)
        .or_else(|| caps.get(n - 1))
        .map_or("", |m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_strips_publisher_markup() {
        let raw = r#"<html><head><title>x</title></head><body>
<div class="calibre3"><p class="calibre1 lead" style="margin:0" id="calibre_link-3">Hi</p></div>
<span id="toc-1"> </span><p id="keep">ok<br></p>
</body></html>"#;
        let out = fallback_clean(raw, &ImageMap::new(), "");
        assert_eq!(out, "<div><p class=\"lead\">Hi</p></div>\n<p id=\"keep\">ok<br/></p>");
    }

    #[test]
    fn test_fallback_rewrites_images() {
        let mut images = ImageMap::new();
        images.insert("OEBPS/img/a.jpg", "a.jpg");
        let raw = r#"<p><img alt="" src="../img/a.jpg"></p><img src='data:image/png;base64,AA'>"#;
        let out = fallback_clean(raw, &images, "OEBPS/text");
        assert_eq!(
            out,
            r#"<p><img alt="" src="../images/a.jpg"/></p><img src='data:image/png;base64,AA'/>"#
        );
    }

    #[test]
    fn test_fallback_keeps_every_merged_body() {
        let raw = "<html><body><p>one</p></body></html>\n\n<html><head><title>t</title></head><body><p>two</p></body></html>";
        assert_eq!(fallback_clean(raw, &ImageMap::new(), ""), "<p>one</p>\n<p>two</p>");
    }

    #[test]
    fn test_fallback_drops_style_and_script_blocks() {
        let raw = "<body><style>p{color:blue}</style><p>two</p><SCRIPT type=\"text/javascript\">\nvar x;\n</SCRIPT></body>";
        assert_eq!(fallback_clean(raw, &ImageMap::new(), ""), "<p>two</p>");
    }

    #[test]
    fn test_fallback_without_body() {
        assert_eq!(fallback_clean("  <p style='x'>a</p> ", &ImageMap::new(), ""), "<p>a</p>");
    }
}
