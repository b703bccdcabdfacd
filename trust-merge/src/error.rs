//! Error types for xml-trust-merge.

use thiserror::Error;

/// Result type alias for xml-trust-merge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading inputs or reconciling documents.
#[derive(Error, Debug)]
pub enum Error {
    /// XML document parse error.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// Malformed rule definition.
    #[error("Rule definition error: {0}")]
    Rules(String),

    /// A path expression could not be compiled.
    #[error("Invalid path expression `{expr}`: {message}")]
    Query {
        /// The offending expression.
        expr: String,
        /// What went wrong.
        message: String,
    },

    /// The rule tree nests deeper than the configured maximum.
    #[error("Rule tree exceeds maximum depth of {0}")]
    RuleDepth(usize),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// JSON error from serde_json.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
