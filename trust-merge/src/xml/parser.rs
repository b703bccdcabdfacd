//! XML parser that builds document trees.
//!
//! This parser uses quick-xml's streaming API. Text is kept verbatim except
//! that whitespace-only runs between tags are dropped.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::node::{
    new_node, Document, NodeInner, NodeRef, XmlComment, XmlContent, XmlElement, XmlText,
};

/// XML parser that builds document trees.
#[derive(Debug, Clone)]
pub struct XmlParser {
    keep_comments: bool,
}

impl Default for XmlParser {
    fn default() -> Self {
        XmlParser::new()
    }
}

impl XmlParser {
    /// Creates a new parser that keeps comments.
    pub fn new() -> Self {
        XmlParser {
            keep_comments: true,
        }
    }

    /// Sets whether comments become nodes in the tree.
    pub fn keep_comments(mut self, keep: bool) -> Self {
        self.keep_comments = keep;
        self
    }

    /// Parses XML from a string.
    pub fn parse_str(&self, xml: &str) -> Result<Document> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);
        self.parse_reader(&mut reader)
    }

    /// Parses XML from a file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let file = File::open(path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        reader.config_mut().trim_text(false);
        self.parse_reader(&mut reader)
    }

    /// Parses XML from a quick-xml Reader.
    fn parse_reader<R: BufRead>(&self, reader: &mut Reader<R>) -> Result<Document> {
        let document = Document::new();
        let mut node_stack: Vec<NodeRef> = vec![document.node().clone()];
        let mut current_text: Option<String> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    flush_text(&mut current_text, &node_stack);
                    let element = parse_element(e, reader)?;
                    let node = new_node(Some(XmlContent::Element(element)));
                    if let Some(parent) = node_stack.last() {
                        NodeInner::add_child_to_ref(parent, node.clone());
                    }
                    node_stack.push(node);
                }
                Ok(Event::End(_)) => {
                    flush_text(&mut current_text, &node_stack);
                    if node_stack.len() <= 1 {
                        return Err(Error::Parse("unbalanced end tag".to_string()));
                    }
                    node_stack.pop();
                }
                Ok(Event::Empty(ref e)) => {
                    // Self-closing tag - handle like Start + End
                    flush_text(&mut current_text, &node_stack);
                    let element = parse_element(e, reader)?;
                    if let Some(parent) = node_stack.last() {
                        NodeInner::add_child_to_ref(
                            parent,
                            new_node(Some(XmlContent::Element(element))),
                        );
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(|e| Error::Parse(e.to_string()))?;
                    current_text.get_or_insert_with(String::new).push_str(&text);
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(e.as_ref());
                    current_text.get_or_insert_with(String::new).push_str(&text);
                }
                Ok(Event::Comment(e)) => {
                    flush_text(&mut current_text, &node_stack);
                    if self.keep_comments {
                        let comment_text = String::from_utf8_lossy(e.as_ref()).to_string();
                        if let Some(parent) = node_stack.last() {
                            NodeInner::add_child_to_ref(
                                parent,
                                new_node(Some(XmlContent::Comment(XmlComment::new(comment_text)))),
                            );
                        }
                    }
                }
                Ok(Event::Eof) => break,
                // Declarations, processing instructions and DOCTYPE are ignored
                Ok(_) => {}
                Err(e) => return Err(Error::Parse(format!("XML parse error: {}", e))),
            }
            buf.clear();
        }

        if node_stack.len() > 1 {
            return Err(Error::Parse("unexpected end of input".to_string()));
        }
        if !document.has_root_element() {
            return Err(Error::Parse("document has no root element".to_string()));
        }
        Ok(document)
    }
}

/// Appends accumulated text to the current element unless it is only whitespace.
fn flush_text(current_text: &mut Option<String>, node_stack: &[NodeRef]) {
    let Some(text) = current_text.take() else {
        return;
    };
    if text.trim().is_empty() {
        return;
    }
    // Text outside the root element is not part of the tree
    if node_stack.len() <= 1 {
        return;
    }
    if let Some(parent) = node_stack.last() {
        NodeInner::add_child_to_ref(parent, new_node(Some(XmlContent::Text(XmlText::new(text)))));
    }
}

/// Parses an element's name and attributes.
fn parse_element<R>(e: &BytesStart, reader: &Reader<R>) -> Result<XmlElement> {
    let name = reader
        .decoder()
        .decode(e.name().as_ref())
        .map_err(|e| Error::Parse(e.to_string()))?
        .to_string();

    let mut attributes = HashMap::new();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| Error::Parse(format!("Attribute error: {}", e)))?;
        let key = reader
            .decoder()
            .decode(attr.key.as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();
        attributes.insert(key, value);
    }

    Ok(XmlElement::new(name, attributes))
}

/// Parses XML from a file with the default parser.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    XmlParser::new().parse_file(path)
}

/// Parses XML from a string with the default parser.
pub fn parse_str(xml: &str) -> Result<Document> {
    XmlParser::new().parse_str(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_of(xml: &str) -> NodeRef {
        parse_str(xml).unwrap().root_element().unwrap()
    }

    #[test]
    fn test_parse_simple_xml() {
        let doc = parse_str(r#"<root><child>text</child></root>"#).unwrap();

        // The document node holds exactly the root element
        assert_eq!(doc.node().borrow().child_count(), 1);
        let root = doc.root_element().unwrap();
        assert_eq!(root.borrow().name(), "root");

        let child = root.borrow().children()[0].clone();
        assert_eq!(child.borrow().name(), "child");
        assert_eq!(child.borrow().text_content(), "text");
    }

    #[test]
    fn test_parse_with_attributes() {
        let root = root_of(r#"<root id="foo" class="bar">content</root>"#);
        let borrowed = root.borrow();
        let e = borrowed.element().unwrap();

        assert_eq!(e.attribute("id"), Some("foo"));
        assert_eq!(e.attribute("class"), Some("bar"));
    }

    #[test]
    fn test_whitespace_between_tags_dropped() {
        let root = root_of("<root>\n  <a> x  y </a>\n  <b/>\n</root>");
        let borrowed = root.borrow();

        assert_eq!(borrowed.child_count(), 2);
        // Significant text is kept verbatim
        assert_eq!(borrowed.children()[0].borrow().text_content(), " x  y ");
    }

    #[test]
    fn test_entities_and_cdata() {
        let root = root_of(r#"<root a="&lt;&amp;">x &amp; <![CDATA[<y>]]></root>"#);
        let borrowed = root.borrow();

        assert_eq!(borrowed.element().unwrap().attribute("a"), Some("<&"));
        assert_eq!(borrowed.child_count(), 1);
        assert_eq!(borrowed.text_content(), "x & <y>");
    }

    #[test]
    fn test_comments() {
        let with = root_of("<root><!--note--><a/></root>");
        assert_eq!(with.borrow().children()[0].borrow().name(), "#comment");

        let doc = XmlParser::new()
            .keep_comments(false)
            .parse_str("<root><!--note--><a/></root>")
            .unwrap();
        assert_eq!(doc.root_element().unwrap().borrow().child_count(), 1);
    }

    #[test]
    fn test_declaration_ignored() {
        let root = root_of(r#"<?xml version="1.0" encoding="UTF-8"?><a><b/></a>"#);
        assert_eq!(root.borrow().name(), "a");
    }

    #[test]
    fn test_malformed_input() {
        assert!(parse_str("<a><b></a>").is_err());
        assert!(parse_str("<a>").is_err());
        assert!(parse_str("").is_err());
    }
}
