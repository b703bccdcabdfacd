//! The authored rule model.

use serde::{Deserialize, Serialize};

use super::source::Weighting;

/// Top-level rule set: a document context and the docroot rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    #[serde(default = "default_context")]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<Rule>,
}

fn default_context() -> String {
    "/".to_string()
}

impl Rules {
    pub fn new(rule: Rule) -> Self {
        Rules {
            context: default_context(),
            rule: Some(rule),
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            context: default_context(),
            rule: None,
        }
    }
}

/// One node of the rule tree.
///
/// `context` is a relative path from the parent rule's location; `filter`
/// is a predicate suffix such as `[@type = 'B']` appended to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    /// `None` inherits from the nearest ancestor; `Some` with no sources
    /// stops inheritance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighting: Option<Weighting>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

impl Rule {
    pub fn new(context: impl Into<String>) -> Self {
        Rule {
            context: context.into(),
            ..Rule::default()
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.field = Some(field);
        self
    }

    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = Some(weighting);
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns the filter unless it is absent or blank.
    pub fn effective_filter(&self) -> Option<&str> {
        self.filter.as_deref().filter(|f| !f.trim().is_empty())
    }
}

/// Reconciliation policy of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Replace wholesale: the first source to supply a node wins.
    #[serde(default)]
    pub stop: bool,
    /// Match repeated elements by identity instead of position.
    #[serde(default)]
    pub coalesce: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<IdPath>,
}

impl Field {
    pub fn stop() -> Self {
        Field {
            stop: true,
            ..Field::default()
        }
    }

    /// A coalescing policy keyed on the given id paths.
    pub fn coalesce<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Field {
            coalesce: true,
            ids: ids.into_iter().map(IdPath::new).collect(),
            ..Field::default()
        }
    }

    pub fn with_stop(mut self, stop: bool) -> Self {
        self.stop = stop;
        self
    }

    /// True when identity keys are computed for matched nodes.
    pub fn uses_keys(&self) -> bool {
        self.coalesce && !self.ids.is_empty()
    }
}

/// A path evaluated relative to a matched node to build its identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdPath {
    pub path: String,
}

impl IdPath {
    pub fn new(path: impl Into<String>) -> Self {
        IdPath { path: path.into() }
    }
}
