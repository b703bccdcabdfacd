//! XML printer that outputs document trees.
//!
//! Attributes are written in sorted order so that the same tree always
//! produces the same bytes.

use std::io::Write;

use crate::node::{Document, NodeRef, XmlContent, XmlElement};

/// Options for XML printing.
#[derive(Debug, Clone, Default)]
pub struct XmlPrinterOptions {
    /// Whether to pretty-print with indentation.
    pub pretty_print: bool,
    /// Whether to omit the XML declaration.
    pub omit_declaration: bool,
}

/// XML printer that outputs node trees.
pub struct XmlPrinter<W: Write> {
    writer: W,
    options: XmlPrinterOptions,
}

impl<W: Write> XmlPrinter<W> {
    /// Creates a new XML printer.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, XmlPrinterOptions::default())
    }

    /// Creates a new XML printer with the given options.
    pub fn with_options(writer: W, options: XmlPrinterOptions) -> Self {
        XmlPrinter { writer, options }
    }

    /// Prints a whole document, including the XML declaration unless omitted.
    pub fn print(&mut self, document: &Document) -> std::io::Result<()> {
        if !self.options.omit_declaration {
            write!(self.writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
            writeln!(self.writer)?;
        }
        let children: Vec<NodeRef> = document.node().borrow().children().to_vec();
        for child in &children {
            self.print_node(child, 0)?;
            if !self.options.pretty_print {
                writeln!(self.writer)?;
            }
        }
        self.writer.flush()
    }

    /// Prints a single subtree with no declaration.
    pub fn print_fragment(&mut self, node: &NodeRef) -> std::io::Result<()> {
        self.print_node(node, 0)?;
        self.writer.flush()
    }

    fn print_node(&mut self, node: &NodeRef, indent: usize) -> std::io::Result<()> {
        let borrowed = node.borrow();
        let pretty = self.options.pretty_print;

        match borrowed.content() {
            Some(XmlContent::Text(text)) => {
                write!(self.writer, "{}", to_entities(text.text(), false))?;
            }
            Some(XmlContent::Comment(comment)) => {
                if pretty {
                    write!(self.writer, "{}", indent_str(indent))?;
                }
                write!(self.writer, "<!--{}-->", comment.text())?;
                if pretty {
                    writeln!(self.writer)?;
                }
            }
            Some(XmlContent::Element(element)) => {
                if pretty {
                    write!(self.writer, "{}", indent_str(indent))?;
                }
                self.start_tag(element)?;

                if borrowed.child_count() == 0 {
                    write!(self.writer, " />")?;
                } else if pretty && !has_text_child(node) {
                    writeln!(self.writer, ">")?;
                    for child in borrowed.children() {
                        self.print_node(child, indent + 1)?;
                    }
                    write!(self.writer, "{}</{}>", indent_str(indent), element.qname())?;
                } else {
                    // Mixed or text content is written inline so text stays intact
                    write!(self.writer, ">")?;
                    let saved = self.options.pretty_print;
                    self.options.pretty_print = false;
                    for child in borrowed.children() {
                        self.print_node(child, 0)?;
                    }
                    self.options.pretty_print = saved;
                    write!(self.writer, "</{}>", element.qname())?;
                }

                if pretty {
                    writeln!(self.writer)?;
                }
            }
            None => {
                for child in borrowed.children() {
                    self.print_node(child, indent)?;
                }
            }
        }

        Ok(())
    }

    fn start_tag(&mut self, element: &XmlElement) -> std::io::Result<()> {
        let mut tag = String::new();
        tag.push('<');
        tag.push_str(element.qname());
        for name in element.sorted_attribute_names() {
            tag.push(' ');
            tag.push_str(name);
            tag.push_str("=\"");
            tag.push_str(&to_entities(&element.attributes()[name], true));
            tag.push('"');
        }
        write!(self.writer, "{}", tag)
    }
}

fn has_text_child(node: &NodeRef) -> bool {
    node.borrow()
        .children()
        .iter()
        .any(|c| matches!(c.borrow().content(), Some(XmlContent::Text(_))))
}

fn indent_str(level: usize) -> String {
    "  ".repeat(level)
}

/// Converts special characters to XML entities.
fn to_entities(s: &str, in_attribute: bool) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if in_attribute => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

/// Prints a document to a string.
pub fn print_to_string(document: &Document) -> std::io::Result<String> {
    let mut output = Vec::new();
    XmlPrinter::new(&mut output).print(document)?;
    Ok(String::from_utf8_lossy(&output).to_string())
}

/// Prints a document to a string with pretty printing.
pub fn print_to_string_pretty(document: &Document) -> std::io::Result<String> {
    let mut output = Vec::new();
    let options = XmlPrinterOptions {
        pretty_print: true,
        ..Default::default()
    };
    XmlPrinter::with_options(&mut output, options).print(document)?;
    Ok(String::from_utf8_lossy(&output).to_string())
}

/// Prints a subtree compactly, without declaration.
pub fn fragment_to_string(node: &NodeRef) -> String {
    let mut output = Vec::new();
    // Writing to a Vec cannot fail
    let _ = XmlPrinter::new(&mut output).print_fragment(node);
    String::from_utf8_lossy(&output).to_string()
}
