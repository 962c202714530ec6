//! Tolerant package-descriptor scanner.
//!
//! Used when the descriptor is not well-formed XML. Each section is located
//! by its opening and closing tag text and attributes are pulled out of every
//! tag with patterns, so unclosed elements, stray ampersands and unquoted
//! attribute values do not stop the parse.

use std::collections::HashMap;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use super::parser::set_first;
use super::{DescriptorParser, Package};
use crate::book::{GuideReference, ManifestItem, SpineItem};
use crate::error::{Error, Result};
use crate::util::decode_entities;

/// Matches `name="value"`, `name='value'` and `name=value`.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

/// Matches the opening tag of any element, capturing the local name and attributes.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:[\w.-]+:)?([\w.-]+)((?:\s[^<>]*?)?)/?>").unwrap());

/// Matches a Dublin Core element with its text.
static DC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<(?:dc:)?(title|creator|language|identifier|publisher|description|date)\b[^>]*>(.*?)</(?:dc:)?(?:title|creator|language|identifier|publisher|description|date)\s*>",
    )
    .unwrap()
});

static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Pattern-based descriptor parser that accepts malformed markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanParser;

impl DescriptorParser for ScanParser {
    fn name(&self) -> &'static str {
        "scan"
    }

    fn parse(&self, content: &str) -> Result<Package> {
        let mut package = Package::default();

        let manifest = section(content, "manifest")
            .ok_or_else(|| Error::InvalidPackage("no <manifest> section".into()))?;
        for attrs in tags(manifest, "item") {
            let (Some(id), Some(href)) = (attrs.get("id"), attrs.get("href")) else {
                continue;
            };
            let media_type = attrs.get("media-type").cloned().unwrap_or_default();
            let properties = attrs.get("properties").cloned().unwrap_or_default();
            package.add_item(
                ManifestItem::new(id.clone(), href.clone(), media_type).with_properties(properties),
            );
        }
        if package.manifest.is_empty() {
            return Err(Error::InvalidPackage("manifest declares no items".into()));
        }

        if let Some(metadata) = section(content, "metadata") {
            for caps in DC_RE.captures_iter(metadata) {
                let field = caps[1].to_ascii_lowercase();
                let text = MARKUP_RE.replace_all(&caps[2], "");
                set_first(&mut package.metadata, &field, decode_entities(text.trim()).trim());
            }
            for attrs in tags(metadata, "meta") {
                if attrs.get("name").map(String::as_str) == Some("cover")
                    && let Some(content) = attrs.get("content")
                {
                    package.cover_id = Some(content.clone());
                    break;
                }
            }
        }

        match spine_open_tag(content) {
            Some(attrs) => {
                package.toc = attrs.get("toc").cloned();
                let spine = section(content, "spine").unwrap_or_default();
                for attrs in tags(spine, "itemref") {
                    if let Some(idref) = attrs.get("idref") {
                        package.spine.push(SpineItem {
                            idref: idref.clone(),
                            linear: attrs.get("linear").is_none_or(|v| v != "no"),
                            properties: attrs.get("properties").cloned().unwrap_or_default(),
                        });
                    }
                }
            }
            None => {
                debug!("descriptor has no spine; using manifest order of content documents");
                package.spine = package
                    .manifest
                    .iter()
                    .filter(|item| item.media_type.contains("html"))
                    .map(|item| SpineItem::new(item.id.clone()))
                    .collect();
            }
        }

        if let Some(guide) = section(content, "guide") {
            for attrs in tags(guide, "reference") {
                if let Some(href) = attrs.get("href") {
                    package.guide.push(GuideReference {
                        kind: attrs.get("type").cloned().unwrap_or_default(),
                        href: href.clone(),
                        title: attrs.get("title").cloned().unwrap_or_default(),
                    });
                }
            }
        }

        Ok(package)
    }
}

/// Text between `<name ...>` and `</name>` (or end of input when unclosed).
fn section<'a>(content: &'a str, name: &str) -> Option<&'a str> {
    let open = TAG_RE
        .captures_iter(content)
        .find(|caps| caps[1].eq_ignore_ascii_case(name))?;
    let whole = open.get(0)?;
    if whole.as_str().ends_with("/>") {
        return Some("");
    }

    let rest = &content[whole.end()..];
    let close = Regex::new(&format!(r"(?i)</(?:[\w.-]+:)?{}\s*>", regex::escape(name))).ok()?;
    let end = close.find(rest).map(|m| m.start()).unwrap_or(rest.len());
    Some(&rest[..end])
}

fn spine_open_tag(content: &str) -> Option<HashMap<String, String>> {
    TAG_RE
        .captures_iter(content)
        .find(|caps| caps[1].eq_ignore_ascii_case("spine"))
        .map(|caps| parse_attrs(caps.get(2).map_or("", |m| m.as_str())))
}

/// Attribute maps of every `<name ...>` tag in `text`.
fn tags(text: &str, name: &str) -> Vec<HashMap<String, String>> {
    TAG_RE
        .captures_iter(text)
        .filter(|caps| caps[1].eq_ignore_ascii_case(name))
        .map(|caps| parse_attrs(caps.get(2).map_or("", |m| m.as_str())))
        .collect()
}

/// Parse an attribute string. Keys are lowercased local names; first wins.
fn parse_attrs(text: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for caps in ATTR_RE.captures_iter(text) {
        let key = caps[1].rsplit(':').next().unwrap_or(&caps[1]).to_ascii_lowercase();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        attrs
            .entry(key)
            .or_insert_with(|| decode_entities(value).into_owned());
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attrs_quote_styles() {
        let attrs = parse_attrs(r#" id="a" href='b c.xhtml' media-type=image/png opf:role="aut""#);
        assert_eq!(attrs["id"], "a");
        assert_eq!(attrs["href"], "b c.xhtml");
        assert_eq!(attrs["media-type"], "image/png");
        assert_eq!(attrs["role"], "aut");
    }

    #[test]
    fn test_scan_malformed_descriptor() {
        // Unclosed <item> tags, a bare ampersand and an unclosed manifest
        let opf = r#"<?xml version="1.0"?>
<package version="2.0">
<metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
  <dc:title>Tom & Jerry</dc:title>
  <dc:creator opf:role="aut">Someone</dc:creator>
  <meta name="cover" content="img1">
</metadata>
<manifest>
  <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml">
  <item id="ch2" href="ch2.xhtml" media-type="application/xhtml+xml">
  <item id="img1" href="images/c.jpg" media-type="image/jpeg">
<spine toc="ncx">
  <itemref idref="ch1"><itemref idref="ch2" linear="no">
</spine>
</package>"#;

        let package = ScanParser.parse(opf).unwrap();
        assert_eq!(package.metadata.title, "Tom & Jerry");
        assert_eq!(package.metadata.creator, "Someone");
        assert_eq!(package.cover_id.as_deref(), Some("img1"));
        assert_eq!(package.manifest.len(), 3);
        assert_eq!(package.toc.as_deref(), Some("ncx"));
        let idrefs: Vec<_> = package.spine.iter().map(|s| s.idref.as_str()).collect();
        assert_eq!(idrefs, vec!["ch1", "ch2"]);
        assert!(!package.spine[1].linear);
    }

    #[test]
    fn test_scan_without_spine_uses_manifest_order() {
        let opf = r#"<package><manifest>
<item id="b" href="b.xhtml" media-type="application/xhtml+xml"/>
<item id="css" href="s.css" media-type="text/css"/>
<item id="a" href="a.xhtml" media-type="application/xhtml+xml"/>
</manifest></package>"#;

        let package = ScanParser.parse(opf).unwrap();
        let idrefs: Vec<_> = package.spine.iter().map(|s| s.idref.as_str()).collect();
        assert_eq!(idrefs, vec!["b", "a"]);
    }

    #[test]
    fn test_scan_rejects_missing_manifest() {
        assert!(ScanParser.parse("<package><spine/></package>").is_err());
    }
}
