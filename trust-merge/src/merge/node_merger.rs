//! Structural merge of sibling lists.
//!
//! Children are paired by name and ordinal: the n-th `b` of the source meets
//! the n-th `b` of the destination. Unpaired source children are copied in
//! when the destination has no child of that name at all, so a missing list
//! is filled completely while an existing one is never extended with extra
//! copies.

use std::collections::{HashMap, HashSet};

use crate::node::{deep_copy, NodeInner, NodeRef};

/// Merges `source`'s children into `destination`.
///
/// The destination's own content is never changed, only its descendants.
/// The source tree is left untouched.
pub fn merge_children(destination: &NodeRef, source: &NodeRef) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut fresh: HashSet<String> = HashSet::new();

    let source_children: Vec<NodeRef> = source.borrow().children().to_vec();
    for child in &source_children {
        let name = child.borrow().name().to_string();
        let ordinal = seen.get(&name).copied().unwrap_or(0);

        match NodeInner::nth_child_named(destination, &name, ordinal) {
            Some(existing) => merge_children(&existing, child),
            None if ordinal == 0 || fresh.contains(&name) => {
                NodeInner::add_child_to_ref(destination, deep_copy(child));
                fresh.insert(name.clone());
            }
            None => {}
        }

        *seen.entry(name).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::trees_equal;
    use crate::xml::{fragment_to_string, parse_str};

    fn merge(destination: &str, source: &str) -> String {
        let dest = parse_str(destination).unwrap().root_element().unwrap();
        let src = parse_str(source).unwrap().root_element().unwrap();
        merge_children(&dest, &src);
        fragment_to_string(&dest)
    }

    #[test]
    fn test_fills_missing_children_recursively() {
        assert_eq!(
            merge(
                "<a><b><c><d>1</d></c></b><bb>1</bb><bbb>1</bbb></a>",
                "<a><b><c><d>2</d><dd>2</dd></c><cc>2</cc></b><bb></bb></a>",
            ),
            "<a><b><c><d>1</d><dd>2</dd></c><cc>2</cc></b><bb>1</bb><bbb>1</bbb></a>"
        );
    }

    #[test]
    fn test_pairs_repeated_elements_by_ordinal() {
        assert_eq!(
            merge(
                "<a><b><c>c1</c></b><b><d>d1</d></b></a>",
                "<a><b><d>d2</d></b><b><c>c2</c></b></a>",
            ),
            "<a><b><c>c1</c><d>d2</d></b><b><d>d1</d><c>c2</c></b></a>"
        );
    }

    #[test]
    fn test_extra_copies_are_dropped() {
        assert_eq!(
            merge("<a><b>1</b></a>", "<a><b>2</b><b>3</b><b>4</b></a>"),
            "<a><b>1</b></a>"
        );
    }

    #[test]
    fn test_absent_list_is_filled_completely() {
        assert_eq!(
            merge("<a><x/></a>", "<a><b>2</b><b>3</b><b>4</b></a>"),
            "<a><x /><b>2</b><b>3</b><b>4</b></a>"
        );
    }

    #[test]
    fn test_text_pairs_like_an_element() {
        // The destination already has a text child, so the source's is dropped
        assert_eq!(merge("<a>keep</a>", "<a>other</a>"), "<a>keep</a>");
        assert_eq!(merge("<a><b/></a>", "<a>added</a>"), "<a><b />added</a>");
    }

    #[test]
    fn test_attributes_of_matched_nodes_are_untouched() {
        assert_eq!(
            merge(
                "<a><b type=\"x\"/></a>",
                "<a><b type=\"y\" extra=\"1\"><c/></b></a>",
            ),
            "<a><b type=\"x\"><c /></b></a>"
        );
    }

    #[test]
    fn test_source_is_not_mutated() {
        let dest = parse_str("<a><b>1</b></a>").unwrap().root_element().unwrap();
        let src = parse_str("<a><b>2</b><c><d/></c></a>").unwrap().root_element().unwrap();
        let before = deep_copy(&src);

        merge_children(&dest, &src);
        assert!(trees_equal(&src, &before));

        // The copy is independent of the source
        let copied_c = NodeInner::nth_child_named(&dest, "c", 0).unwrap();
        NodeInner::add_child_to_ref(&copied_c, deep_copy(&before));
        assert!(trees_equal(&src, &before));
    }
}
