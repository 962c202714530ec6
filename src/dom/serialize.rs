//! XHTML serialization of arena DOM subtrees.

use html5ever::ns;

use super::arena::{Dom, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";

/// Serialize the children of `node` as well-formed XHTML.
pub fn serialize_children(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    for child in dom.children(node) {
        write_node(dom, child, &mut out);
    }
    out
}

/// Serialize `node` and its subtree.
pub fn serialize_node(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, node, &mut out);
    out
}

fn write_node(dom: &Dom, id: NodeId, out: &mut String) {
    let Some(node) = dom.get(id) else {
        return;
    };

    match &node.data {
        NodeData::Text(text) => escape_into(text, false, out),
        NodeData::Element { name, attrs } => {
            let tag = name.local.as_ref();
            out.push('<');
            out.push_str(tag);

            for attr in attrs {
                out.push(' ');
                if let Some(prefix) = &attr.name.prefix {
                    out.push_str(prefix.as_ref());
                    out.push(':');
                }
                out.push_str(attr.name.local.as_ref());
                out.push_str("=\"");
                escape_into(&attr.value, true, out);
                out.push('"');
            }

            // Foreign roots need their namespace declared in XHTML
            let has_attr = |n: &str| attrs.iter().any(|a| a.name.local.as_ref() == n);
            if name.ns == ns!(svg) && tag == "svg" {
                if !has_attr("xmlns") {
                    out.push_str(&format!(" xmlns=\"{SVG_NS}\""));
                }
                if !has_attr("xlink") {
                    out.push_str(&format!(" xmlns:xlink=\"{XLINK_NS}\""));
                }
            } else if name.ns == ns!(mathml) && tag == "math" && !has_attr("xmlns") {
                out.push_str(&format!(" xmlns=\"{MATHML_NS}\""));
            }

            let foreign = name.ns != ns!(html);
            if node.first_child.is_none() && (foreign || VOID_ELEMENTS.contains(&tag)) {
                out.push_str("/>");
                return;
            }

            out.push('>');
            if !VOID_ELEMENTS.contains(&tag) {
                for child in dom.children(id) {
                    write_node(dom, child, out);
                }
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        NodeData::Document => {
            for child in dom.children(id) {
                write_node(dom, child, out);
            }
        }
        NodeData::Comment(_) | NodeData::Doctype => {}
    }
}

fn escape_into(text: &str, attr: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&#160;"),
            _ => out.push(c),
        }
    }
}
