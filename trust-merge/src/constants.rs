//! Constants used throughout xml-trust-merge.

/// Appended after every value of a compound identity key.
pub const KEY_SEPARATOR: &str = ";";

/// Default bound on rule-tree nesting, checked when a tree is compiled.
pub const MAX_RULE_DEPTH: usize = 64;

/// Attribute stamped on the root of a trusted document when marking is enabled.
pub const TRUSTED_ATTR_NAME: &str = "source";

/// Value of [`TRUSTED_ATTR_NAME`] on a marked trusted document.
pub const TRUSTED_ATTR_VALUE: &str = "trusted";

/// Node name reported for text nodes.
pub const TEXT_NODE_NAME: &str = "#text";

/// Node name reported for comment nodes.
pub const COMMENT_NODE_NAME: &str = "#comment";

/// Node name reported for the synthetic document node.
pub const DOCUMENT_NODE_NAME: &str = "#document";
