//! Top-level entry point: rules plus source documents in, trusted document out.

use crate::constants::{MAX_RULE_DEPTH, TRUSTED_ATTR_NAME, TRUSTED_ATTR_VALUE};
use crate::error::Result;
use crate::merge::{LogKind, MergeLog};
use crate::node::Document;
use crate::processor::{RuleProcessor, SourceDocuments};
use crate::rules::{RuleTree, Rules};

/// Options controlling a merge.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Stamp `source="trusted"` on the root of a non-empty result.
    pub mark_trusted: bool,
    /// Fail on malformed path expressions instead of skipping the rule.
    pub strict_queries: bool,
    /// Deepest rule nesting accepted when compiling the rule tree.
    pub max_rule_depth: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            mark_trusted: false,
            strict_queries: false,
            max_rule_depth: MAX_RULE_DEPTH,
        }
    }
}

/// Reconciles source documents into one trusted document.
///
/// ```
/// use std::collections::HashMap;
/// use xml_trust_merge::{parse_str, Rule, Rules, Source, XmlDocumentMerger};
///
/// let rules = Rules::new(
///     Rule::new("doc").with_weighting(
///         [Source::new("a", 1.0), Source::new("b", 0.5)].into_iter().collect(),
///     ),
/// );
/// let mut sources = HashMap::new();
/// sources.insert("a".to_string(), parse_str("<doc><x>a</x></doc>").unwrap());
/// sources.insert("b".to_string(), parse_str("<doc><x>b</x><y>b</y></doc>").unwrap());
///
/// let trusted = XmlDocumentMerger::new().merge(&rules, &sources).unwrap().unwrap();
/// let root = trusted.root_element().unwrap();
/// assert_eq!(root.borrow().text_content(), "ab");
/// ```
#[derive(Debug, Default)]
pub struct XmlDocumentMerger {
    processor: RuleProcessor,
}

impl XmlDocumentMerger {
    pub fn new() -> Self {
        XmlDocumentMerger::default()
    }

    pub fn with_options(options: MergeOptions) -> Self {
        XmlDocumentMerger {
            processor: RuleProcessor::new(options),
        }
    }

    pub fn options(&self) -> &MergeOptions {
        self.processor.options()
    }

    /// Diagnostics from the most recent [`merge`](Self::merge).
    pub fn log(&self) -> &MergeLog {
        self.processor.log()
    }

    /// Runs the rule tree over `sources`.
    ///
    /// Returns `Ok(None)` when there is no docroot rule or the result has no
    /// root element, which happens when no trusted source is available for
    /// the docroot rule.
    pub fn merge(&mut self, rules: &Rules, sources: &SourceDocuments) -> Result<Option<Document>> {
        self.processor.take_log();

        let Some(docroot) = &rules.rule else {
            self.processor
                .log_mut()
                .add(LogKind::MissingDocroot, "missing docroot rule", None);
            return Ok(None);
        };

        let tree = RuleTree::build(docroot, self.options().max_rule_depth)?;
        tracing::debug!(rules = tree.len(), sources = sources.len(), "starting merge");

        let trusted = Document::new();
        self.processor
            .process_rule(&tree, tree.root(), &trusted, sources)?;

        let Some(root) = trusted.root_element() else {
            self.processor.log_mut().add(
                LogKind::EmptyResult,
                "merge generated an empty document",
                None,
            );
            return Ok(None);
        };

        if self.options().mark_trusted {
            if let Some(element) = root.borrow_mut().element_mut() {
                element.set_attribute(TRUSTED_ATTR_NAME, TRUSTED_ATTR_VALUE);
            }
        }

        Ok(Some(trusted))
    }
}

/// Merges with default options, discarding the log.
pub fn merge_documents(rules: &Rules, sources: &SourceDocuments) -> Result<Option<Document>> {
    XmlDocumentMerger::new().merge(rules, sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Rule, Source, Weighting};
    use crate::xml::{fragment_to_string, parse_str};

    fn weighting() -> Weighting {
        [Source::new("sourceB", 0.9), Source::new("sourceA", 1.0)]
            .into_iter()
            .collect()
    }

    fn sources() -> SourceDocuments {
        [
            ("sourceB", "<country source=\"sourceB\"></country>"),
            ("sourceA", "<country source=\"sourceA\"></country>"),
        ]
        .into_iter()
        .map(|(n, x)| (n.to_string(), parse_str(x).unwrap()))
        .collect()
    }

    #[test]
    fn test_marks_trusted_root() {
        let rules = Rules::new(Rule::new("country").with_weighting(weighting()));
        let mut merger = XmlDocumentMerger::with_options(MergeOptions {
            mark_trusted: true,
            ..MergeOptions::default()
        });
        let trusted = merger.merge(&rules, &sources()).unwrap().unwrap();
        assert_eq!(
            fragment_to_string(&trusted.root_element().unwrap()),
            "<country source=\"trusted\" />"
        );
        assert!(merger.log().is_empty());
    }

    #[test]
    fn test_unmarked_root_keeps_source_attribute() {
        let rules = Rules::new(Rule::new("country").with_weighting(weighting()));
        let trusted = merge_documents(&rules, &sources()).unwrap().unwrap();
        assert_eq!(
            fragment_to_string(&trusted.root_element().unwrap()),
            "<country source=\"sourceA\" />"
        );
    }

    #[test]
    fn test_missing_docroot_rule() {
        let mut merger = XmlDocumentMerger::new();
        assert!(merger.merge(&Rules::default(), &sources()).unwrap().is_none());
        assert_eq!(merger.log().entries_of(LogKind::MissingDocroot).count(), 1);
    }

    #[test]
    fn test_empty_result_is_none() {
        let mut merger = XmlDocumentMerger::new();
        let rules = Rules::new(Rule::new("country"));
        assert!(merger.merge(&rules, &SourceDocuments::new()).unwrap().is_none());
        assert_eq!(merger.log().entries_of(LogKind::EmptyResult).count(), 1);

        // The log only covers the latest run
        let rules = Rules::new(Rule::new("country").with_weighting(weighting()));
        assert!(merger.merge(&rules, &sources()).unwrap().is_some());
        assert!(merger.log().is_empty());
    }

    #[test]
    fn test_rule_depth_is_enforced() {
        let mut rule = Rule::new("leaf");
        for _ in 0..3 {
            rule = Rule::new("level").with_rule(rule);
        }
        let mut merger = XmlDocumentMerger::with_options(MergeOptions {
            max_rule_depth: 2,
            ..MergeOptions::default()
        });
        assert!(matches!(
            merger.merge(&Rules::new(rule), &sources()),
            Err(crate::Error::RuleDepth(2))
        ));
    }
}
