//! xml-trust-merge - trust-weighted reconciliation of XML documents
//!
//! This library combines several independently sourced XML documents that
//! describe the same entity into one "trusted" document. A declarative rule
//! tree decides, for each region of the document, which sources may
//! contribute, in what order of trust, and how their content is combined.
//!
//! # Overview
//!
//! - The most trusted available source forms the base of each region; less
//!   trusted sources only fill gaps.
//! - A *stop* rule takes one source's subtree wholesale.
//! - A *coalescing* rule matches repeated elements by an identity key built
//!   from sub-paths instead of by position.
//! - Rules without a weighting inherit the nearest ancestor's sources.
//!
//! # Example
//!
//! Rules for a `country` document where `sourceA` is preferred, except for
//! the `names/name` elements which come from `sourceB` first and are matched
//! by their `type` attribute:
//!
//! ```xml
//! <tm:rules tm:context="/" xmlns:tm="http://accuity.com/apo/trust-matrix">
//!   <tm:rule tm:context="country">
//!     <tm:weightings>
//!       <tm:source tm:name="sourceA" tm:trust="1.0"/>
//!       <tm:source tm:name="sourceB" tm:trust="0.5"/>
//!     </tm:weightings>
//!     <tm:rule tm:context="names/name">
//!       <tm:field tm:coalesce="true"><tm:id tm:path="@type"/></tm:field>
//!       <tm:weightings>
//!         <tm:source tm:name="sourceB" tm:trust="1.0"/>
//!         <tm:source tm:name="sourceA" tm:trust="0.5"/>
//!       </tm:weightings>
//!     </tm:rule>
//!   </tm:rule>
//! </tm:rules>
//! ```

pub mod constants;
pub mod error;
pub mod merge;
pub mod merger;
pub mod node;
pub mod processor;
pub mod query;
pub mod rules;
pub mod xml;

// Re-export commonly used types
pub use constants::*;
pub use error::{Error, Result};
pub use merge::{merge_children, LogEntry, LogKind, MergeLog, Severity};
pub use merger::{merge_documents, MergeOptions, XmlDocumentMerger};
pub use node::{
    deep_copy, new_element, new_node, trees_equal, Document, NodeInner, NodeRef, WeakNodeRef,
    XmlComment, XmlContent, XmlElement, XmlText,
};
pub use processor::{RuleProcessor, SourceDocuments};
pub use query::{Hit, PathExpr};
pub use rules::{
    load_rules_file, parse_rules_file, parse_rules_str, Field, IdPath, Rule, RuleId, RuleNode,
    RuleTree, Rules, Source, Weighting,
};
pub use xml::{
    fragment_to_string, parse_file, parse_str, print_to_string, print_to_string_pretty, XmlParser,
    XmlPrinter, XmlPrinterOptions,
};
