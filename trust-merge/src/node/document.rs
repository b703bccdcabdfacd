//! XML documents.

use std::rc::Rc;

use super::{deep_copy, new_node, trees_equal, NodeInner, NodeRef};

/// An XML document: a synthetic document node whose children are the root
/// element plus any top-level comments.
///
/// Cloning a `Document` clones the handle, not the tree; use
/// [`Document::deep_clone`] for an independent copy.
#[derive(Debug, Clone)]
pub struct Document {
    node: NodeRef,
}

impl Document {
    /// Creates an empty document with no root element.
    pub fn new() -> Self {
        Document {
            node: new_node(None),
        }
    }

    /// Creates a document whose root element is `root`.
    ///
    /// `root` should be detached; it is appended as-is.
    pub fn with_root(root: NodeRef) -> Self {
        let doc = Document::new();
        NodeInner::add_child_to_ref(&doc.node, root);
        doc
    }

    /// Returns the synthetic document node.
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// Returns the root element, if the document has one.
    pub fn root_element(&self) -> Option<NodeRef> {
        self.node
            .borrow()
            .children()
            .iter()
            .find(|c| c.borrow().is_element())
            .cloned()
    }

    /// Returns true if the document has a root element.
    pub fn has_root_element(&self) -> bool {
        self.root_element().is_some()
    }

    /// Installs `root` as the root element.
    ///
    /// Any previous root element is removed first.
    pub fn set_root_element(&self, root: NodeRef) {
        if let Some(previous) = self.root_element() {
            NodeInner::detach(&previous);
        }
        NodeInner::add_child_to_ref(&self.node, root);
    }

    /// Returns an independent deep copy of this document.
    pub fn deep_clone(&self) -> Self {
        Document {
            node: deep_copy(&self.node),
        }
    }

    /// Returns true if both handles point to the same tree.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Compares two documents by content and structure.
    pub fn content_eq(&self, other: &Document) -> bool {
        trees_equal(&self.node, &other.node)
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{new_element, XmlElement};
    use std::collections::HashMap;

    #[test]
    fn test_empty_document() {
        let doc = Document::new();
        assert!(!doc.has_root_element());
        assert_eq!(doc.node().borrow().name(), "#document");
    }

    #[test]
    fn test_set_root_element_replaces() {
        let doc = Document::with_root(new_element(XmlElement::new("a", HashMap::new())));
        doc.set_root_element(new_element(XmlElement::new("b", HashMap::new())));

        assert_eq!(doc.node().borrow().child_count(), 1);
        let root = doc.root_element().unwrap();
        assert_eq!(root.borrow().name(), "b");
    }

    #[test]
    fn test_deep_clone() {
        let doc = Document::with_root(new_element(XmlElement::new("a", HashMap::new())));
        let copy = doc.deep_clone();
        assert!(!doc.ptr_eq(&copy));
        assert!(doc.content_eq(&copy));
        assert!(doc.ptr_eq(&doc.clone()));
    }
}
