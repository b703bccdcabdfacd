//! The rule-tree walk.
//!
//! Each rule finds its location in the trusted document, clears it, and
//! rebuilds it from the effective sources in trust order. Matching between
//! a source node and the node already rebuilt is positional unless the rule
//! coalesces on identity paths. All queries against the trusted document are
//! re-run after every mutation they depend on.

use std::collections::HashMap;
use std::rc::Rc;

use crate::constants::KEY_SEPARATOR;
use crate::error::Result;
use crate::merge::{merge_children, LogKind, MergeLog};
use crate::merger::MergeOptions;
use crate::node::{deep_copy, Document, NodeInner, NodeRef};
use crate::query::PathExpr;
use crate::rules::{RuleId, RuleNode, RuleTree, Source};

/// Source documents keyed by source name.
pub type SourceDocuments = HashMap<String, Document>;

/// Compiled queries for one rule application.
struct RuleQueries {
    path: PathExpr,
    /// The rule path without this rule's own filter.
    filterless: Option<PathExpr>,
    ids: Vec<PathExpr>,
}

/// Applies rules to a trusted document, recording diagnostics as it goes.
#[derive(Debug, Default)]
pub struct RuleProcessor {
    options: MergeOptions,
    log: MergeLog,
}

impl RuleProcessor {
    pub fn new(options: MergeOptions) -> Self {
        RuleProcessor {
            options,
            log: MergeLog::new(),
        }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    pub fn log(&self) -> &MergeLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut MergeLog {
        &mut self.log
    }

    /// Takes the collected log, leaving an empty one behind.
    pub fn take_log(&mut self) -> MergeLog {
        std::mem::take(&mut self.log)
    }

    /// Applies rule `id` and, where allowed, its descendants to `trusted`.
    ///
    /// Only fails on a malformed path when `strict_queries` is set; otherwise
    /// the failure is logged and the rule's body is skipped.
    pub fn process_rule(
        &mut self,
        tree: &RuleTree,
        id: RuleId,
        trusted: &Document,
        sources: &SourceDocuments,
    ) -> Result<()> {
        let rule = tree.get(id);
        let effective = tree.effective_sources(id);
        tracing::debug!(
            rule = rule.path(),
            sources = effective.len(),
            "processing rule"
        );

        if rule.is_docroot() {
            apply_docroot(rule, &effective, trusted, sources);
        } else {
            self.apply_rule(tree, id, &effective, trusted, sources)?;
        }

        if !rule.has_children() {
            return Ok(());
        }
        // No data can arrive from any source, so descendants cannot change anything
        if !effective.iter().any(|s| sources.contains_key(&s.name)) {
            return Ok(());
        }
        if rule.field().stop {
            self.log.add(
                LogKind::StopRuleChildren,
                format!("stop rule at {} has children; ignoring them", rule.path()),
                Some(rule.path()),
            );
            return Ok(());
        }

        for &child in rule.children() {
            self.process_rule(tree, child, trusted, sources)?;
        }
        Ok(())
    }

    fn apply_rule(
        &mut self,
        tree: &RuleTree,
        id: RuleId,
        effective: &[Source],
        trusted: &Document,
        sources: &SourceDocuments,
    ) -> Result<()> {
        let rule = tree.get(id);
        let Some(queries) = self.compile_queries(tree, id)? else {
            return Ok(());
        };
        let field = rule.field();

        let existing = queries.path.select_nodes(trusted.node());
        tracing::debug!(
            rule = rule.path(),
            count = existing.len(),
            "existing matches in trusted document"
        );

        // Matches are assumed to share one parent; the last one wins
        let mut target_parent: Option<NodeRef> = None;
        let mut split_parents = false;
        for node in &existing {
            let parent = NodeInner::detach(node);
            if let (Some(previous), Some(current)) = (&target_parent, &parent) {
                split_parents |= !Rc::ptr_eq(previous, current);
            }
            target_parent = parent;
        }
        if split_parents {
            self.log.add(
                LogKind::SplitParents,
                format!(
                    "matches for {} have different parents; using the last one",
                    rule.path()
                ),
                Some(rule.path()),
            );
        }

        if target_parent.is_none() {
            if let Some(filterless) = &queries.filterless {
                let unfiltered = filterless.select_nodes(trusted.node());
                tracing::debug!(
                    rule = rule.path(),
                    count = unfiltered.len(),
                    "looking for parent without filter"
                );
                target_parent = unfiltered.first().and_then(NodeInner::parent_of_ref);
            }
        }

        let Some(target_parent) = target_parent else {
            self.log.add(
                LogKind::StructuralAbsence,
                format!(
                    "no parent node found in trusted document for {}; skipping rule",
                    rule.path()
                ),
                Some(rule.path()),
            );
            return Ok(());
        };

        let mut identities: HashMap<String, NodeRef> = HashMap::new();
        if field.uses_keys() {
            for node in &existing {
                identities.insert(build_key(node, &queries.ids), node.clone());
            }
        }

        for source in effective {
            let starting_count = queries.path.select_nodes(trusted.node()).len();
            let Some(document) = sources.get(&source.name) else {
                continue;
            };

            let source_nodes = queries.path.select_nodes(document.node());
            tracing::debug!(
                rule = rule.path(),
                source = source.name.as_str(),
                count = source_nodes.len(),
                "matching nodes in source"
            );

            for (i, source_node) in source_nodes.iter().enumerate() {
                let mut key = None;
                let matched = if field.coalesce {
                    if field.uses_keys() {
                        let k = build_key(source_node, &queries.ids);
                        // Seeds from removed nodes only pair once rebuilt from a source
                        let found = identities
                            .get(&k)
                            .filter(|node| NodeInner::parent_of_ref(node).is_some())
                            .cloned();
                        key = Some(k);
                        found
                    } else {
                        None
                    }
                } else if starting_count > 0 && starting_count < i + 1 {
                    // A more trusted source already fixed how many instances exist
                    continue;
                } else {
                    queries.path.select_nodes(trusted.node()).into_iter().nth(i)
                };

                match matched {
                    None => {
                        tracing::debug!(
                            rule = rule.path(),
                            source = source.name.as_str(),
                            "importing node"
                        );
                        let copy = deep_copy(source_node);
                        NodeInner::add_child_to_ref(&target_parent, copy.clone());
                        if let Some(k) = key {
                            identities.insert(k, copy);
                        }
                    }
                    Some(existing) => {
                        if !field.stop {
                            tracing::debug!(
                                rule = rule.path(),
                                source = source.name.as_str(),
                                "merging node"
                            );
                            merge_children(&existing, source_node);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Compiles every query the rule needs before anything is mutated.
    ///
    /// Returns `Ok(None)` when a query is malformed and strict mode is off.
    fn compile_queries(&mut self, tree: &RuleTree, id: RuleId) -> Result<Option<RuleQueries>> {
        let rule = tree.get(id);
        let filterless = tree.unfiltered_path(id);

        let compiled = (|| -> Result<RuleQueries> {
            Ok(RuleQueries {
                path: PathExpr::compile(rule.path())?,
                filterless: filterless.as_deref().map(PathExpr::compile).transpose()?,
                ids: rule
                    .field()
                    .ids
                    .iter()
                    .map(|id| PathExpr::compile(&id.path))
                    .collect::<Result<Vec<_>>>()?,
            })
        })();

        match compiled {
            Ok(queries) => Ok(Some(queries)),
            Err(err) if self.options.strict_queries => Err(err),
            Err(err) => {
                self.log.add(
                    LogKind::InvalidQuery,
                    format!("{}; rule treated as matching nothing", err),
                    Some(rule.path()),
                );
                Ok(None)
            }
        }
    }
}

/// The docroot rule: the most trusted source forms the root, the others fill
/// gaps unless the rule stops.
fn apply_docroot(
    rule: &RuleNode,
    effective: &[Source],
    trusted: &Document,
    sources: &SourceDocuments,
) {
    for source in effective {
        let Some(document) = sources.get(&source.name) else {
            continue;
        };
        let Some(source_root) = document.root_element() else {
            tracing::debug!(source = source.name.as_str(), "source document is empty");
            continue;
        };

        match trusted.root_element() {
            None => {
                tracing::debug!(source = source.name.as_str(), "importing document root");
                trusted.set_root_element(deep_copy(&source_root));
            }
            Some(root) => {
                if !rule.field().stop {
                    merge_children(&root, &source_root);
                }
            }
        }
    }
}

/// Builds the compound identity key of `node`.
///
/// Each id path contributes the value of its first hit (attribute value or
/// text content), or nothing, followed by the separator.
pub(crate) fn build_key(node: &NodeRef, ids: &[PathExpr]) -> String {
    let mut key = String::new();
    for id in ids {
        if let Some(hit) = id.select(node).first() {
            key.push_str(&hit.string_value());
        }
        key.push_str(KEY_SEPARATOR);
    }
    key
}
