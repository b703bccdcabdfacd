//! Reads rule definitions from namespaced XML markup.
//!
//! ```xml
//! <tm:rules tm:context="/" xmlns:tm="http://accuity.com/apo/trust-matrix">
//!   <tm:rule tm:context="rootElement">
//!     <tm:weightings>
//!       <tm:source tm:name="sourceA" tm:trust="1.0"/>
//!     </tm:weightings>
//!     <tm:rule tm:context="collection/item" tm:filter="[type = 'A']">
//!       <tm:field tm:coalesce="true" tm:stop="true"><tm:id tm:path="type"/></tm:field>
//!     </tm:rule>
//!   </tm:rule>
//! </tm:rules>
//! ```
//!
//! Element and attribute prefixes are ignored; unknown elements are skipped.

use std::path::Path;

use super::rule::{Field, IdPath, Rule, Rules};
use super::source::{Source, Weighting};
use crate::error::{Error, Result};
use crate::node::{local_part, NodeRef, XmlElement};
use crate::xml;

/// Parses a rule definition from an XML string.
pub fn parse_rules_str(markup: &str) -> Result<Rules> {
    let document = xml::parse_str(markup)?;
    let root = document
        .root_element()
        .ok_or_else(|| Error::Rules("empty rule definition".to_string()))?;
    read_rules(&root)
}

/// Parses a rule definition from an XML file.
pub fn parse_rules_file<P: AsRef<Path>>(path: P) -> Result<Rules> {
    let document = xml::parse_file(path)?;
    let root = document
        .root_element()
        .ok_or_else(|| Error::Rules("empty rule definition".to_string()))?;
    read_rules(&root)
}

fn read_rules(node: &NodeRef) -> Result<Rules> {
    let name = element_local_name(node);
    if name.as_deref() != Some("rules") {
        return Err(Error::Rules(format!(
            "expected <rules> root element, found <{}>",
            name.unwrap_or_default()
        )));
    }

    let mut rules = Rules {
        context: attribute(node, "context").unwrap_or_else(|| "/".to_string()),
        rule: None,
    };

    for child in element_children(node) {
        match element_local_name(&child).as_deref() {
            Some("rule") => {
                if rules.rule.is_some() {
                    return Err(Error::Rules("more than one docroot rule".to_string()));
                }
                rules.rule = Some(read_rule(&child)?);
            }
            other => skip_unknown(other),
        }
    }

    Ok(rules)
}

fn read_rule(node: &NodeRef) -> Result<Rule> {
    let context = attribute(node, "context")
        .ok_or_else(|| Error::Rules("rule without a context attribute".to_string()))?;
    let mut rule = Rule::new(context);
    rule.filter = attribute(node, "filter");

    for child in element_children(node) {
        match element_local_name(&child).as_deref() {
            Some("field") => rule.field = Some(read_field(&child)?),
            Some("weightings") => rule.weighting = Some(read_weighting(&child)?),
            Some("rule") => rule.rules.push(read_rule(&child)?),
            other => skip_unknown(other),
        }
    }

    Ok(rule)
}

fn read_field(node: &NodeRef) -> Result<Field> {
    let mut field = Field {
        stop: read_flag(node, "stop")?,
        coalesce: read_flag(node, "coalesce")?,
        ids: Vec::new(),
    };

    for child in element_children(node) {
        match element_local_name(&child).as_deref() {
            Some("id") => {
                let path = attribute(&child, "path")
                    .ok_or_else(|| Error::Rules("id without a path attribute".to_string()))?;
                field.ids.push(IdPath::new(path));
            }
            other => skip_unknown(other),
        }
    }

    Ok(field)
}

fn read_weighting(node: &NodeRef) -> Result<Weighting> {
    let mut sources = Vec::new();

    for child in element_children(node) {
        match element_local_name(&child).as_deref() {
            Some("source") => {
                let name = attribute(&child, "name")
                    .ok_or_else(|| Error::Rules("source without a name attribute".to_string()))?;
                let trust = attribute(&child, "trust").ok_or_else(|| {
                    Error::Rules(format!("source '{}' has no trust attribute", name))
                })?;
                let trust: f32 = trust.trim().parse().map_err(|_| {
                    Error::Rules(format!("source '{}' has invalid trust '{}'", name, trust))
                })?;
                sources.push(Source::new(name, trust));
            }
            other => skip_unknown(other),
        }
    }

    Ok(Weighting::new(sources))
}

/// Reads an xsd:boolean attribute; absent reads as false.
fn read_flag(node: &NodeRef, name: &str) -> Result<bool> {
    match attribute(node, name).as_deref().map(str::trim) {
        None => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(Error::Rules(format!(
            "attribute '{}' must be a boolean, found '{}'",
            name, other
        ))),
    }
}

fn skip_unknown(name: Option<&str>) {
    if let Some(name) = name {
        tracing::debug!(element = name, "ignoring unknown element in rule definition");
    }
}

fn element_children(node: &NodeRef) -> Vec<NodeRef> {
    node.borrow()
        .children()
        .iter()
        .filter(|c| c.borrow().is_element())
        .cloned()
        .collect()
}

fn element_local_name(node: &NodeRef) -> Option<String> {
    node.borrow()
        .element()
        .map(|e| e.local_name().to_string())
}

/// Looks up an attribute by local name, ignoring namespace declarations.
fn attribute(node: &NodeRef, local: &str) -> Option<String> {
    let node = node.borrow();
    node.element().and_then(|e| find_attribute(e, local))
}

fn find_attribute(element: &XmlElement, local: &str) -> Option<String> {
    element
        .sorted_attribute_names()
        .into_iter()
        .filter(|key| !key.starts_with("xmlns"))
        .find(|key| local_part(key) == local)
        .and_then(|key| element.attribute(key))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"<tm:rules tm:context="/" xmlns:tm="http://accuity.com/apo/trust-matrix">
  <tm:rule tm:context="rootElement">
    <tm:weightings>
      <tm:source tm:name="sourceC" tm:trust="1.0"></tm:source>
      <tm:source tm:name="sourceB" tm:trust="0.9"></tm:source>
    </tm:weightings>
    <tm:rule tm:context="subElement/collection/collectionElement" tm:filter="[not(type = 'typeA')]">
      <tm:field tm:coalesce="true" tm:stop="true"><tm:id tm:path="type"></tm:id></tm:field>
      <tm:weightings>
        <tm:source tm:name="sourceA" tm:trust="1.0"></tm:source>
        <tm:source tm:name="sourceB" tm:trust="0.5"></tm:source>
      </tm:weightings>
    </tm:rule>
    <tm:rule tm:context="subElement/collection/collectionElement" tm:filter="[type = 'typeA']">
      <tm:field tm:coalesce="true" tm:stop="true"><tm:id tm:path="type"></tm:id></tm:field>
      <tm:weightings>
        <tm:source tm:name="sourceB" tm:trust="1.0"></tm:source>
      </tm:weightings>
    </tm:rule>
  </tm:rule>
</tm:rules>"#;

    #[test]
    fn test_parse_namespaced_rules() {
        let rules = parse_rules_str(RULES).unwrap();
        assert_eq!(rules.context, "/");

        let docroot = rules.rule.unwrap();
        assert_eq!(docroot.context, "rootElement");
        assert!(docroot.field.is_none());
        let sources = &docroot.weighting.unwrap().sources;
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[1].name, "sourceB");
        assert_eq!(sources[1].trust, 0.9);

        assert_eq!(docroot.rules.len(), 2);
        let first = &docroot.rules[0];
        assert_eq!(first.filter.as_deref(), Some("[not(type = 'typeA')]"));
        let field = first.field.as_ref().unwrap();
        assert!(field.stop && field.coalesce);
        assert_eq!(field.ids, vec![IdPath::new("type")]);
    }

    #[test]
    fn test_unprefixed_markup() {
        let rules = parse_rules_str(
            r#"<rules><rule context="a"><field stop="1"/><note>x</note></rule></rules>"#,
        )
        .unwrap();
        assert_eq!(rules.context, "/");
        let rule = rules.rule.unwrap();
        assert!(rule.field.unwrap().stop);
        assert!(rule.weighting.is_none());
    }

    #[test]
    fn test_empty_weightings_element_is_kept() {
        let rules =
            parse_rules_str(r#"<rules><rule context="a"><weightings/></rule></rules>"#).unwrap();
        assert_eq!(rules.rule.unwrap().weighting, Some(Weighting::default()));
    }

    #[test]
    fn test_missing_docroot_rule() {
        let rules = parse_rules_str(r#"<rules context="/"/>"#).unwrap();
        assert!(rules.rule.is_none());
    }

    #[test]
    fn test_malformed_definitions() {
        assert!(matches!(
            parse_rules_str("<other/>"),
            Err(Error::Rules(_))
        ));
        assert!(parse_rules_str(r#"<rules><rule/></rules>"#).is_err());
        assert!(parse_rules_str(
            r#"<rules><rule context="a"><weightings><source name="x" trust="high"/></weightings></rule></rules>"#
        )
        .is_err());
        assert!(parse_rules_str(r#"<rules><rule context="a"><field stop="yes"/></rule></rules>"#)
            .is_err());
        assert!(
            parse_rules_str(r#"<rules><rule context="a"/><rule context="b"/></rules>"#).is_err()
        );
        assert!(matches!(parse_rules_str("<rules>"), Err(Error::Parse(_))));
    }
}
