//! Minimal XML element tree over quick-xml
//!
//! Alma responses are small, so documents are read into memory once and
//! queried with descendant searches (`find`, `find_all`).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("XML parse error at byte {position}: {message}")]
    Parse { position: u64, message: String },

    #[error("Unbalanced XML document")]
    Unbalanced,
}

/// An XML element with its attributes, direct text and children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// Parse a document. The returned element is a nameless root holding
    /// the top-level elements as children.
    pub fn parse(content: &[u8]) -> Result<Element, XmlError> {
        let mut reader = Reader::from_reader(content);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = vec![Element::default()];
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let element = Self::open(&e).map_err(|m| parse_error(&reader, m))?;
                    stack.push(element);
                }
                Ok(Event::Empty(e)) => {
                    let element = Self::open(&e).map_err(|m| parse_error(&reader, m))?;
                    stack.last_mut().ok_or(XmlError::Unbalanced)?.children.push(element);
                }
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or(XmlError::Unbalanced)?;
                    stack.last_mut().ok_or(XmlError::Unbalanced)?.children.push(element);
                }
                Ok(Event::Text(t)) => {
                    let text = t.unescape().map_err(|e| parse_error(&reader, e))?;
                    stack.last_mut().ok_or(XmlError::Unbalanced)?.text.push_str(&text);
                }
                Ok(Event::CData(c)) => {
                    let text = String::from_utf8_lossy(&c).into_owned();
                    stack.last_mut().ok_or(XmlError::Unbalanced)?.text.push_str(&text);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(parse_error(&reader, e)),
                _ => {}
            }
            buf.clear();
        }

        if stack.len() != 1 {
            return Err(XmlError::Unbalanced);
        }
        stack.pop().ok_or(XmlError::Unbalanced)
    }

    fn open(start: &BytesStart<'_>) -> Result<Element, String> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
            attributes.push((key, value));
        }
        Ok(Element {
            name,
            attributes,
            ..Default::default()
        })
    }

    /// Attribute value by local name
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Text content of this element and all its descendants
    pub fn text(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.text());
        }
        out
    }

    /// First descendant with the given name, depth-first
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given name, in document order
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect(&|e| e.name == name, &mut found);
        found
    }

    /// First descendant with the given name and attribute value
    pub fn find_with_attr(&self, name: &str, key: &str, value: &str) -> Option<&Element> {
        self.find_all_with_attr(name, key, value).into_iter().next()
    }

    /// All descendants with the given name and attribute value
    pub fn find_all_with_attr(&self, name: &str, key: &str, value: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect(&|e| e.name == name && e.attr(key) == Some(value), &mut found);
        found
    }

    fn collect<'a>(&'a self, matches: &dyn Fn(&Element) -> bool, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if matches(child) {
                found.push(child);
            }
            child.collect(matches, found);
        }
    }
}

fn parse_error(reader: &Reader<&[u8]>, message: impl ToString) -> XmlError {
    XmlError::Parse {
        position: reader.buffer_position() as u64,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <bibs total_record_count="1">
          <bib>
            <mms_id>991</mms_id>
            <title>Romeo &amp; Juliet /</title>
            <holdings link="https://example.com/bibs/991/holdings"/>
            <record>
              <datafield tag="AVA" ind1=" " ind2=" ">
                <subfield code="0">991</subfield>
                <subfield code="e">available</subfield>
              </datafield>
            </record>
          </bib>
        </bibs>"#;

    #[test]
    fn test_parse_tree() {
        let root = Element::parse(DOC.as_bytes()).unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "bibs");
        assert_eq!(root.children[0].attr("total_record_count"), Some("1"));
    }

    #[test]
    fn test_find_descendants() {
        let root = Element::parse(DOC.as_bytes()).unwrap();
        let bib = root.find("bib").unwrap();
        assert_eq!(bib.find("title").unwrap().text(), "Romeo & Juliet /");
        assert_eq!(
            bib.find("holdings").and_then(|h| h.attr("link")),
            Some("https://example.com/bibs/991/holdings")
        );
        assert_eq!(bib.find_all("subfield").len(), 2);
        assert!(bib.find("missing").is_none());
    }

    #[test]
    fn test_find_with_attr() {
        let root = Element::parse(DOC.as_bytes()).unwrap();
        let ava = root.find_with_attr("datafield", "tag", "AVA").unwrap();
        let status = ava.find_with_attr("subfield", "code", "e").unwrap();
        assert_eq!(status.text(), "available");
        assert!(ava.find_with_attr("subfield", "code", "j").is_none());
    }

    #[test]
    fn test_namespaced_document() {
        let doc = r#"<web_service_result xmlns="http://com/exlibris/urm/general/xmlbeans">
            <errorList><error><errorCode>402204</errorCode></error></errorList>
        </web_service_result>"#;
        let root = Element::parse(doc.as_bytes()).unwrap();
        assert_eq!(root.find("errorCode").unwrap().text(), "402204");
    }

    #[test]
    fn test_malformed_document() {
        assert!(Element::parse(b"<bibs><bib></bibs>").is_err());
    }

    #[test]
    fn test_empty_document() {
        let root = Element::parse(b"").unwrap();
        assert!(root.children.is_empty());
    }
}
