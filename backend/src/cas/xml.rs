//! Minimal XML element tree used to read CAS service responses.
//!
//! Tag names are kept exactly as they appear on the wire (`cas:user` stays
//! `cas:user`) and every value is kept as a string, so identifiers such as
//! `00123` survive untouched.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use thiserror::Error;

/// Errors raised while turning a response body into an element tree.
#[derive(Debug, Error)]
pub enum XmlParseError {
    #[error("XML syntax error at position {position}: {message}")]
    Syntax { position: u64, message: String },
    #[error("document has no root element")]
    Empty,
    #[error("element <{0}> is never closed")]
    Unclosed(String),
    #[error("unexpected element <{0}> after the root element")]
    TrailingElement(String),
}

/// A parsed XML element with its qualified name, attributes, text and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Tag name without any namespace prefix.
    pub fn local_name(&self) -> &str {
        strip_prefix(&self.name)
    }

    /// Looks up an XML attribute by exact name, then by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|(key, _)| strip_prefix(key) == name)
            })
            .map(|(_, value)| value.as_str())
    }

    /// Finds the first child named `cas:<local>`, falling back to any child
    /// whose local name is `local` (bare or under another prefix).
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        let namespaced = format!("cas:{}", local);
        self.children
            .iter()
            .find(|child| child.name == namespaced)
            .or_else(|| self.children.iter().find(|child| child.local_name() == local))
    }

    /// Trimmed text content of this element.
    pub fn text(&self) -> &str {
        self.text.trim()
    }
}

/// Removes a `prefix:` from a qualified name.
pub fn strip_prefix(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, local)| local)
}

/// Parses a complete XML document and returns its root element.
pub fn parse_document(xml: &str) -> Result<XmlElement, XmlParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event().map_err(|e| XmlParseError::Syntax {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(e) => {
                stack.push(open_element(&e, reader.buffer_position() as u64)?)
            }
            Event::Empty(e) => {
                let element = open_element(&e, reader.buffer_position() as u64)?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(element, &mut stack, &mut root)?;
                }
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    let text = e.unescape().map_err(|e| XmlParseError::Syntax {
                        position: reader.buffer_position() as u64,
                        message: e.to_string(),
                    })?;
                    current.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlParseError::Unclosed(open.name));
    }

    root.ok_or(XmlParseError::Empty)
}

/// `position` is the reader offset just past the start tag.
fn open_element(start: &BytesStart<'_>, position: u64) -> Result<XmlElement, XmlParseError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let mut attributes = Vec::new();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlParseError::Syntax {
            position,
            message: format!("invalid attribute on <{}>: {}", name, e),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlParseError::Syntax {
                position,
                message: format!("invalid value for attribute '{}': {}", key, e),
            })?
            .to_string();
        attributes.push((key, value));
    }

    Ok(XmlElement {
        name,
        attributes,
        ..Default::default()
    })
}

fn attach(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<(), XmlParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => return Err(XmlParseError::TrailingElement(element.name)),
        None => *root = Some(element),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_prefixes_and_nesting() {
        let xml = r#"<?xml version="1.0"?>
        <cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
            <cas:authenticationSuccess>
                <cas:user>jdoe</cas:user>
            </cas:authenticationSuccess>
        </cas:serviceResponse>"#;

        let root = parse_document(xml).unwrap();
        assert_eq!(root.name, "cas:serviceResponse");
        assert_eq!(root.local_name(), "serviceResponse");
        assert_eq!(
            root.attribute("xmlns:cas"),
            Some("http://www.yale.edu/tp/cas")
        );

        let success = root.child("authenticationSuccess").unwrap();
        assert_eq!(success.child("user").unwrap().text(), "jdoe");
    }

    #[test]
    fn test_numeric_looking_text_stays_a_string() {
        let root = parse_document("<id>000123</id>").unwrap();
        assert_eq!(root.text(), "000123");
    }

    #[test]
    fn test_child_prefers_namespaced_name() {
        let root = parse_document("<r><user>bare</user><cas:user>ns</cas:user></r>").unwrap();
        assert_eq!(root.child("user").unwrap().text(), "ns");

        let root = parse_document("<r><user>bare</user></r>").unwrap();
        assert_eq!(root.child("user").unwrap().text(), "bare");

        let root = parse_document("<r><sso:user>other</sso:user></r>").unwrap();
        assert_eq!(root.child("user").unwrap().text(), "other");
    }

    #[test]
    fn test_attribute_errors_report_their_position() {
        let xml = r#"<r><a x="1" x="2"/></r>"#;
        match parse_document(xml) {
            Err(XmlParseError::Syntax { position, message }) => {
                assert!(position > "<r>".len() as u64);
                assert!(message.contains("<a>"));
            }
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_entities_cdata_and_attributes() {
        let root = parse_document(
            r#"<f code="INVALID_TICKET">Ticket &amp; service<![CDATA[<mismatch>]]></f>"#,
        )
        .unwrap();
        assert_eq!(root.attribute("code"), Some("INVALID_TICKET"));
        assert_eq!(root.text(), "Ticket & service<mismatch>");
    }

    #[test]
    fn test_empty_elements_become_children() {
        let root = parse_document("<r><a/><b x=\"1\"/></r>").unwrap();
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[1].attribute("x"), Some("1"));
    }

    #[test]
    fn test_rejects_broken_documents() {
        assert!(matches!(parse_document(""), Err(XmlParseError::Empty)));
        assert!(matches!(
            parse_document("not xml at all"),
            Err(XmlParseError::Empty)
        ));
        assert!(parse_document("<a><b></a>").is_err());
        assert!(parse_document("<a><b>").is_err());
        assert!(matches!(
            parse_document("<a/><b/>"),
            Err(XmlParseError::TrailingElement(name)) if name == "b"
        ));
    }
}
