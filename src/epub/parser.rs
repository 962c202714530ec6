//! Structured parsing of container.xml and the package descriptor.

use quick_xml::Reader;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};

use super::{DescriptorParser, Package};
use crate::book::{GuideReference, ManifestItem, Metadata, SpineItem};
use crate::error::{Error, Result};
use crate::util::{decode_entities, resolve_entity, strip_bom};

/// Parse `META-INF/container.xml` and return the first rootfile path.
pub fn parse_container_xml(bytes: &[u8]) -> Result<String> {
    let content = String::from_utf8_lossy(strip_bom(bytes));

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                if let Some(path) = attr(&e, b"full-path")
                    && !path.is_empty()
                {
                    return Ok(path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::MissingRootFile(format!("unparsable container.xml: {e}")));
            }
            _ => {}
        }
    }

    Err(Error::MissingRootFile("no rootfile in container.xml".into()))
}

/// Event-driven descriptor parser. Rejects ill-formed XML and packages
/// without a `<manifest>` or `<spine>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictParser;

impl DescriptorParser for StrictParser {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn parse(&self, content: &str) -> Result<Package> {
        parse_opf(content)
    }
}

fn parse_opf(content: &str) -> Result<Package> {
    // No trimming: entity references split text events mid-value
    let mut reader = Reader::from_str(content);

    let mut package = Package::default();
    let mut seen_manifest = false;
    let mut seen_spine = false;

    let mut in_metadata = false;
    let mut in_manifest = false;
    let mut in_spine = false;
    let mut in_guide = false;
    let mut current_element: Option<String> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                match local {
                    b"metadata" => in_metadata = true,
                    b"manifest" => {
                        in_manifest = true;
                        seen_manifest = true;
                    }
                    b"spine" => {
                        in_spine = true;
                        seen_spine = true;
                        package.toc = attr(&e, b"toc");
                    }
                    b"guide" => in_guide = true,
                    b"title" | b"creator" | b"language" | b"identifier" | b"publisher"
                    | b"description" | b"date"
                        if in_metadata =>
                    {
                        current_element = Some(String::from_utf8_lossy(local).into_owned());
                        buf_text.clear();
                    }
                    _ => handle_leaf(
                        &mut package,
                        &e,
                        in_metadata,
                        in_manifest,
                        in_spine,
                        in_guide,
                    ),
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"manifest" => seen_manifest = true,
                    b"spine" => {
                        seen_spine = true;
                        package.toc = attr(&e, b"toc");
                    }
                    _ => handle_leaf(
                        &mut package,
                        &e,
                        in_metadata,
                        in_manifest,
                        in_spine,
                        in_guide,
                    ),
                }
            }
            Event::Text(e) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::CData(e) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::GeneralRef(e) => {
                if current_element.is_some() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        buf_text.push_str(&resolved);
                    }
                }
            }
            Event::End(e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"metadata" => in_metadata = false,
                    b"manifest" => in_manifest = false,
                    b"spine" => in_spine = false,
                    b"guide" => in_guide = false,
                    _ => {}
                }

                if let Some(elem) = current_element.take() {
                    set_first(&mut package.metadata, &elem, buf_text.trim());
                    buf_text.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_manifest {
        return Err(Error::InvalidPackage("missing <manifest>".into()));
    }
    if !seen_spine {
        return Err(Error::InvalidPackage("missing <spine>".into()));
    }

    Ok(package)
}

/// Handle an attribute-only element (`item`, `itemref`, `meta`, `reference`).
fn handle_leaf(
    package: &mut Package,
    e: &BytesStart<'_>,
    in_metadata: bool,
    in_manifest: bool,
    in_spine: bool,
    in_guide: bool,
) {
    let name = e.name();
    match local_name(name.as_ref()) {
        b"item" if in_manifest => {
            let id = attr(e, b"id").unwrap_or_default();
            let href = attr(e, b"href").unwrap_or_default();
            if id.is_empty() || href.is_empty() {
                return;
            }
            let media_type = attr(e, b"media-type").unwrap_or_default();
            let properties = attr(e, b"properties").unwrap_or_default();
            package.add_item(ManifestItem::new(id, href, media_type).with_properties(properties));
        }
        b"itemref" if in_spine => {
            if let Some(idref) = attr(e, b"idref") {
                package.spine.push(SpineItem {
                    idref,
                    linear: attr(e, b"linear").is_none_or(|v| v != "no"),
                    properties: attr(e, b"properties").unwrap_or_default(),
                });
            }
        }
        b"meta" if in_metadata => {
            if attr(e, b"name").as_deref() == Some("cover")
                && let Some(content) = attr(e, b"content")
                && package.cover_id.is_none()
            {
                package.cover_id = Some(content);
            }
        }
        b"reference" if in_guide => {
            if let Some(href) = attr(e, b"href") {
                package.guide.push(GuideReference {
                    kind: attr(e, b"type").unwrap_or_default(),
                    href,
                    title: attr(e, b"title").unwrap_or_default(),
                });
            }
        }
        _ => {}
    }
}

/// Set a metadata field unless an earlier element already filled it.
pub(super) fn set_first(metadata: &mut Metadata, field: &str, value: &str) {
    let slot = match field {
        "title" => &mut metadata.title,
        "creator" => &mut metadata.creator,
        "language" => &mut metadata.language,
        "identifier" => &mut metadata.identifier,
        "publisher" => &mut metadata.publisher,
        "description" => &mut metadata.description,
        "date" => &mut metadata.date,
        _ => return,
    };
    if slot.is_empty() && !value.is_empty() {
        *slot = value.to_string();
    }
}

/// Attribute value by local name, entity-decoded.
fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| local_name(a.key.as_ref()) == key)
        .map(|a| attr_value(&a))
}

fn attr_value(attr: &Attribute<'_>) -> String {
    let raw = String::from_utf8_lossy(&attr.value);
    decode_entities(&raw).into_owned()
}

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
pub(super) fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}
