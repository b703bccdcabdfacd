//! Rule model: what to keep at each document location, and from whom.
//!
//! [`Rules`] and [`Rule`] are the authored form, loaded from XML markup or
//! JSON. [`RuleTree`] is the compiled form the processor walks.

mod parser;
mod rule;
mod source;
mod tree;

pub use parser::{parse_rules_file, parse_rules_str};
pub use rule::{Field, IdPath, Rule, Rules};
pub use source::{Source, Weighting};
pub use tree::{RuleId, RuleNode, RuleTree};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::Result;

/// Loads rules from a file, reading JSON for a `.json` extension and XML
/// markup otherwise.
pub fn load_rules_file<P: AsRef<Path>>(path: P) -> Result<Rules> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    } else {
        parse_rules_file(path)
    }
}

/// Parses rules from a JSON string.
pub fn rules_from_json(json: &str) -> Result<Rules> {
    Ok(serde_json::from_str(json)?)
}

/// Serializes rules as pretty-printed JSON.
pub fn rules_to_json(rules: &Rules) -> Result<String> {
    Ok(serde_json::to_string_pretty(rules)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_defaults() {
        let rules = rules_from_json(r#"{"rule": {"context": "a", "rules": [{"context": "b"}]}}"#)
            .unwrap();
        assert_eq!(rules.context, "/");
        let docroot = rules.rule.as_ref().unwrap();
        assert_eq!(docroot.rules[0].context, "b");
        assert!(docroot.weighting.is_none());

        let json = rules_to_json(&rules).unwrap();
        assert_eq!(rules_from_json(&json).unwrap(), rules);
    }

    #[test]
    fn test_load_by_extension() {
        let dir = std::env::temp_dir().join(format!("tm-rules-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let json_path = dir.join("rules.json");
        std::fs::write(&json_path, r#"{"context": "/", "rule": {"context": "a"}}"#).unwrap();
        let xml_path = dir.join("rules.xml");
        std::fs::write(&xml_path, r#"<rules context="/"><rule context="a"/></rules>"#).unwrap();

        let from_json = load_rules_file(&json_path).unwrap();
        let from_xml = load_rules_file(&xml_path).unwrap();
        assert_eq!(from_json, from_xml);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_rules_file("/nonexistent/rules.json"),
            Err(crate::Error::Io(_))
        ));
    }
}
