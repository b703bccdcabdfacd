//! Compiled rule tree.
//!
//! The authored [`Rule`] tree is flattened into an arena once per merge.
//! Each entry knows its parent, its children and its absolute path, so the
//! processor never walks the authored tree again.

use super::rule::{Field, Rule};
use super::source::{Source, Weighting};
use crate::error::{Error, Result};

/// Index of a rule in a [`RuleTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

/// One compiled rule.
#[derive(Debug, Clone)]
pub struct RuleNode {
    context: String,
    filter: Option<String>,
    field: Field,
    weighting: Option<Weighting>,
    parent: Option<RuleId>,
    children: Vec<RuleId>,
    path: String,
}

impl RuleNode {
    pub fn context(&self) -> &str {
        &self.context
    }

    /// The filter, if present and not blank.
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// The reconciliation policy; an absent field reads as all defaults.
    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn weighting(&self) -> Option<&Weighting> {
        self.weighting.as_ref()
    }

    pub fn parent(&self) -> Option<RuleId> {
        self.parent
    }

    pub fn children(&self) -> &[RuleId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_docroot(&self) -> bool {
        self.parent.is_none()
    }

    /// Absolute path: `"/" + context + filter` for every rule from the
    /// docroot down to this one.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Arena of compiled rules. The docroot rule is always [`RuleTree::root`].
#[derive(Debug, Clone)]
pub struct RuleTree {
    nodes: Vec<RuleNode>,
}

impl RuleTree {
    /// Compiles an authored rule tree, rejecting trees deeper than `max_depth`.
    pub fn build(docroot: &Rule, max_depth: usize) -> Result<RuleTree> {
        let mut tree = RuleTree { nodes: Vec::new() };
        tree.add(docroot, None, 1, max_depth)?;
        Ok(tree)
    }

    fn add(
        &mut self,
        rule: &Rule,
        parent: Option<RuleId>,
        depth: usize,
        max_depth: usize,
    ) -> Result<RuleId> {
        if depth > max_depth {
            return Err(Error::RuleDepth(max_depth));
        }

        let filter = rule.effective_filter().map(str::to_string);
        let mut path = match parent {
            Some(p) => self.nodes[p.0].path.clone(),
            None => String::new(),
        };
        path.push('/');
        path.push_str(&rule.context);
        if let Some(f) = &filter {
            path.push_str(f);
        }

        let id = RuleId(self.nodes.len());
        self.nodes.push(RuleNode {
            context: rule.context.clone(),
            filter,
            field: rule.field.clone().unwrap_or_default(),
            weighting: rule.weighting.clone(),
            parent,
            children: Vec::new(),
            path,
        });

        for child in &rule.rules {
            let child_id = self.add(child, Some(id), depth + 1, max_depth)?;
            self.nodes[id.0].children.push(child_id);
        }

        Ok(id)
    }

    pub fn root(&self) -> RuleId {
        RuleId(0)
    }

    pub fn get(&self, id: RuleId) -> &RuleNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all rule ids in depth-first pre-order.
    pub fn ids(&self) -> impl Iterator<Item = RuleId> {
        (0..self.nodes.len()).map(RuleId)
    }

    /// The path used to find a parent when a filtered rule matches nothing:
    /// the parent's path joined with this rule's context.
    pub fn unfiltered_path(&self, id: RuleId) -> Option<String> {
        let node = self.get(id);
        node.filter()?;
        let parent = self.get(node.parent()?);
        Some(format!("{}/{}", parent.path(), node.context()))
    }

    /// Every path expression applying `id` compiles: its path, the
    /// unfiltered path and its id paths.
    pub fn query_paths(&self, id: RuleId) -> Vec<String> {
        let node = self.get(id);
        let mut paths = vec![node.path().to_string()];
        paths.extend(self.unfiltered_path(id));
        paths.extend(node.field().ids.iter().map(|id| id.path.clone()));
        paths
    }

    /// Returns the sources that apply at `id`, most trusted first.
    ///
    /// Walks up from `id` to the nearest rule that owns a weighting and keeps
    /// its sources with positive trust. Empty when no rule on the way owns one.
    pub fn effective_sources(&self, id: RuleId) -> Vec<Source> {
        let mut current = Some(id);
        while let Some(rule_id) = current {
            let node = self.get(rule_id);
            if let Some(weighting) = &node.weighting {
                return weighting.ranked();
            }
            current = node.parent;
        }
        Vec::new()
    }
}
