//! XML parsing and output.
//!
//! Documents are read with quick-xml's streaming reader into [`Document`]
//! trees and written back out with a small printer that sorts attributes so
//! output is deterministic.
//!
//! [`Document`]: crate::node::Document

mod parser;
mod printer;

pub use parser::{parse_file, parse_str, XmlParser};
pub use printer::{
    fragment_to_string, print_to_string, print_to_string_pretty, XmlPrinter, XmlPrinterOptions,
};
