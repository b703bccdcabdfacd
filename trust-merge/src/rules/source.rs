//! Named sources and their trust values.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A named document origin with a trust value.
///
/// Sources compare equal and hash by name only. They order by descending
/// trust, ties broken by ascending name, so sorting a list puts the most
/// trusted source first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub trust: f32,
}

impl Source {
    pub fn new(name: impl Into<String>, trust: f32) -> Self {
        Source {
            name: name.into(),
            trust,
        }
    }

    /// Returns true if documents from this source may contribute content.
    pub fn is_trusted(&self) -> bool {
        self.trust > 0.0
    }
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Source {}

impl Hash for Source {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Ord for Source {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .trust
            .total_cmp(&self.trust)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for Source {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The trust ranking owned by one rule.
///
/// Serialized as a plain list of sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weighting {
    pub sources: Vec<Source>,
}

impl Weighting {
    pub fn new(sources: Vec<Source>) -> Self {
        Weighting { sources }
    }

    /// Returns the sources with positive trust, most trusted first.
    pub fn ranked(&self) -> Vec<Source> {
        let mut ranked: Vec<Source> = self
            .sources
            .iter()
            .filter(|s| s.is_trusted())
            .cloned()
            .collect();
        ranked.sort();
        ranked
    }
}

impl FromIterator<Source> for Weighting {
    fn from_iter<I: IntoIterator<Item = Source>>(iter: I) -> Self {
        Weighting::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_by_name() {
        assert_eq!(Source::new("fdb", 1.0), Source::new("fdb", 0.2));
        assert_ne!(Source::new("fdb", 1.0), Source::new("zeus", 1.0));

        let set: HashSet<Source> = [Source::new("fdb", 1.0), Source::new("fdb", 0.5)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_order_by_trust_then_name() {
        let mut sources = vec![
            Source::new("b", 0.5),
            Source::new("c", 1.0),
            Source::new("a", 0.5),
        ];
        sources.sort();
        let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_ranked_drops_untrusted() {
        let weighting: Weighting = [
            Source::new("zeus", 0.5),
            Source::new("none", 0.0),
            Source::new("neg", -1.0),
            Source::new("fdb", 1.0),
        ]
        .into_iter()
        .collect();
        let names: Vec<String> = weighting.ranked().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["fdb", "zeus"]);
    }
}
