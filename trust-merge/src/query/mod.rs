//! Path expressions used by rule contexts, filters and identity paths.
//!
//! Supports the XPath 1.0 subset that rule files use: absolute and relative
//! location paths, `//`, `.`, `..`, `@name`, `*`, `text()`, `node()`,
//! predicates with comparisons, `and`/`or`, positional predicates and a
//! handful of core functions (`not`, `position`, `last`, `count`,
//! `contains`, `starts-with`, `normalize-space`, `string`, `name`,
//! `local-name`, `true`, `false`).

mod eval;
mod lexer;
mod parser;

use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::node::NodeRef;

/// One item selected by a path expression.
#[derive(Debug, Clone)]
pub enum Hit {
    /// An element, text, comment or document node.
    Node(NodeRef),
    /// An attribute of `owner`.
    Attribute {
        owner: NodeRef,
        name: String,
        value: String,
    },
}

impl Hit {
    /// Returns the node itself, or the owning element for attributes.
    pub fn node(&self) -> &NodeRef {
        match self {
            Hit::Node(node) => node,
            Hit::Attribute { owner, .. } => owner,
        }
    }

    /// Returns the node if this hit is not an attribute.
    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Hit::Node(node) => Some(node),
            Hit::Attribute { .. } => None,
        }
    }

    /// Returns the string-value: attribute value or concatenated text content.
    pub fn string_value(&self) -> String {
        eval::string_value(self)
    }
}

impl PartialEq for Hit {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Hit::Node(a), Hit::Node(b)) => Rc::ptr_eq(a, b),
            (
                Hit::Attribute {
                    owner: a, name: n, ..
                },
                Hit::Attribute {
                    owner: b, name: m, ..
                },
            ) => Rc::ptr_eq(a, b) && n == m,
            _ => false,
        }
    }
}

/// A compiled path expression.
#[derive(Debug, Clone)]
pub struct PathExpr {
    source: String,
    path: parser::LocationPath,
}

impl PathExpr {
    /// Compiles an expression, failing with [`Error::Query`] when it is
    /// malformed or does not select nodes.
    pub fn compile(expr: &str) -> Result<PathExpr> {
        let fail = |message: String| Error::Query {
            expr: expr.to_string(),
            message,
        };
        let tokens = lexer::tokenize(expr).map_err(fail)?;
        match parser::parse(&tokens).map_err(fail)? {
            parser::Expr::Path(path) => Ok(PathExpr {
                source: expr.to_string(),
                path,
            }),
            _ => Err(fail("expression does not select nodes".to_string())),
        }
    }

    /// Returns the source text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluates against `context`, returning hits in document order.
    ///
    /// Absolute paths start at the top of the tree containing `context`.
    pub fn select(&self, context: &NodeRef) -> Vec<Hit> {
        eval::select(&self.path, &Hit::Node(context.clone()))
    }

    /// Like [`select`](Self::select), keeping only non-attribute hits.
    pub fn select_nodes(&self, context: &NodeRef) -> Vec<NodeRef> {
        self.select(context)
            .into_iter()
            .filter_map(|hit| match hit {
                Hit::Node(node) => Some(node),
                Hit::Attribute { .. } => None,
            })
            .collect()
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
