//! Minimal element tree used by the zapit and scanfile codecs.
//!
//! Documents in this domain are small attribute-only trees, so they are read
//! into an owned [`XmlNode`] with quick-xml and written back with plain
//! string building.

use std::io::BufRead;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::FormatError;

/// An element with ordered attributes and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    pub text: Option<String>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Insert or replace an attribute, keeping first-insertion order.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value, treating empty strings as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn push(&mut self, child: XmlNode) -> &mut XmlNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Count descendant elements with the given name, at any depth.
    pub fn count_descendants(&self, name: &str) -> usize {
        self.children
            .iter()
            .map(|c| usize::from(c.name == name) + c.count_descendants(name))
            .sum()
    }

    /// Render as a complete document with an XML declaration and two-space
    /// indentation.
    pub fn to_document(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self.write_into(&mut out, 0);
        out
    }

    fn write_into(&self, out: &mut String, level: usize) {
        let indent = "  ".repeat(level);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape_xml(v));
            out.push('"');
        }
        if self.children.is_empty() {
            match &self.text {
                Some(text) => {
                    out.push('>');
                    out.push_str(&escape_xml(text));
                    out.push_str(&format!("</{}>\n", self.name));
                }
                None => out.push_str(" />\n"),
            }
            return;
        }
        out.push_str(">\n");
        for child in &self.children {
            child.write_into(out, level + 1);
        }
        out.push_str(&indent);
        out.push_str(&format!("</{}>\n", self.name));
    }
}

/// Escape text for use in attribute values and character data.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
        .replace('\n', "&#10;")
}

/// Parse a document and return its root element.
pub fn parse_xml<R: BufRead>(reader: R) -> Result<XmlNode, FormatError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => stack.push(node_from_start(e)?),
            Event::Empty(ref e) => {
                let node = node_from_start(e)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(ref e) => {
                if let Some(top) = stack.last_mut() {
                    let text = e.unescape()?.to_string();
                    if !text.is_empty() {
                        top.text = Some(text);
                    }
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| FormatError::invalid_xml("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(FormatError::invalid_xml("unexpected end of document"));
    }
    root.ok_or_else(|| FormatError::invalid_xml("document has no root element"))
}

/// Parse an XML file from disk.
pub fn parse_xml_file(path: &Path) -> Result<XmlNode, FormatError> {
    let file = std::fs::File::open(path)?;
    parse_xml(std::io::BufReader::new(file))
}

fn node_from_start(e: &BytesStart<'_>) -> Result<XmlNode, FormatError> {
    let mut node = XmlNode::new(String::from_utf8_lossy(e.name().as_ref()).to_string());
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value()?.to_string();
        node.attrs.push((key, value));
    }
    Ok(node)
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), FormatError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(node);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(node);
            Ok(())
        }
        None => Err(FormatError::invalid_xml("multiple root elements")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("Tom & Jerry"), "Tom &amp; Jerry");
        assert_eq!(escape_xml("a < b"), "a &lt; b");
        assert_eq!(escape_xml("\"x\""), "&quot;x&quot;");
    }

    #[test]
    fn test_render_then_parse_tree() {
        let mut root = XmlNode::new("zapit").attr("api", "4");
        let group = root.push(XmlNode::new("cables"));
        group.push(XmlNode::new("cable").attr("name", "Kabel & Co"));
        let doc = root.to_document();
        assert!(doc.contains("  <cables>\n    <cable name=\"Kabel &amp; Co\" />\n"));

        let parsed = parse_xml(doc.as_bytes()).unwrap();
        assert_eq!(parsed.name, "zapit");
        assert_eq!(parsed.get("api"), Some("4"));
        let cable = &parsed.children[0].children[0];
        assert_eq!(cable.get("name"), Some("Kabel & Co"));
        assert_eq!(parsed.count_descendants("cable"), 1);
    }

    #[test]
    fn test_parse_rejects_empty_document() {
        assert!(parse_xml("<?xml version=\"1.0\"?>".as_bytes()).is_err());
    }
}
