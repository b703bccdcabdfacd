// Property-based tests for the sibling-list merge.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashMap;

use proptest::prelude::*;
use xml_trust_merge::{
    deep_copy, merge_children, new_element, new_node, trees_equal, NodeInner, NodeRef, XmlContent,
    XmlElement, XmlText,
};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

#[derive(Debug, Clone)]
enum Tree {
    Text(String),
    Element(String, Vec<Tree>),
}

fn arb_tree() -> impl Strategy<Value = Tree> {
    let leaf = prop_oneof![
        "[a-z]{1,4}".prop_map(Tree::Text),
        prop::sample::select(vec!["a", "b", "c"]).prop_map(|n| Tree::Element(n.into(), vec![])),
    ];
    leaf.prop_recursive(4, 32, 5, |inner| {
        (
            prop::sample::select(vec!["a", "b", "c"]),
            prop::collection::vec(inner, 0..5),
        )
            .prop_map(|(name, children)| Tree::Element(name.into(), children))
    })
}

fn arb_root() -> impl Strategy<Value = NodeRef> {
    prop::collection::vec(arb_tree(), 0..6)
        .prop_map(|children| build(&Tree::Element("root".into(), children)))
}

fn build(tree: &Tree) -> NodeRef {
    match tree {
        Tree::Text(value) => new_node(Some(XmlContent::Text(XmlText::new(value.as_str())))),
        Tree::Element(name, children) => {
            let node = new_element(XmlElement::new(name.as_str(), HashMap::new()));
            for child in children {
                NodeInner::add_child_to_ref(&node, build(child));
            }
            node
        }
    }
}

fn name_counts(node: &NodeRef) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for child in node.borrow().children() {
        *counts.entry(child.borrow().name().to_string()).or_insert(0) += 1;
    }
    counts
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn merging_a_copy_changes_nothing(root in arb_root()) {
        let destination = deep_copy(&root);
        merge_children(&destination, &root);
        prop_assert!(trees_equal(&destination, &root));
    }

    #[test]
    fn existing_names_never_gain_siblings(
        destination in arb_root(),
        source in arb_root(),
    ) {
        let before = name_counts(&destination);
        merge_children(&destination, &source);
        let after = name_counts(&destination);

        for (name, count) in &before {
            prop_assert_eq!(after.get(name), Some(count), "count of <{}> changed", name);
        }
    }

    #[test]
    fn empty_destination_receives_everything(source in arb_root()) {
        let destination = new_element(XmlElement::new("root", HashMap::new()));
        merge_children(&destination, &source);
        prop_assert!(trees_equal(&destination, &source));
    }

    #[test]
    fn source_is_left_untouched(
        destination in arb_root(),
        source in arb_root(),
    ) {
        let snapshot = deep_copy(&source);
        merge_children(&destination, &source);
        prop_assert!(trees_equal(&source, &snapshot));
    }
}
