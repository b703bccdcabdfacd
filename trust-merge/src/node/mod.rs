//! Node structures for XML tree representation.
//!
//! Documents are trees of reference-counted nodes with weak parent links, so
//! a node found by a query can be detached, merged into, or have siblings
//! appended while other references to the tree stay valid.

mod document;
mod xml_content;

pub use document::Document;
pub use xml_content::{local_part, XmlComment, XmlContent, XmlElement, XmlText};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::constants::DOCUMENT_NODE_NAME;

/// A reference-counted pointer to a node.
pub type NodeRef = Rc<RefCell<NodeInner>>;

/// A weak reference to a node, used for parent links.
pub type WeakNodeRef = Weak<RefCell<NodeInner>>;

/// Creates a new node reference.
pub fn new_node(content: Option<XmlContent>) -> NodeRef {
    Rc::new(RefCell::new(NodeInner::new(content)))
}

/// Creates a new element node without children.
pub fn new_element(element: XmlElement) -> NodeRef {
    new_node(Some(XmlContent::Element(element)))
}

/// The inner data of a node in the tree.
///
/// Each node has:
/// - 0 or more children
/// - XML content (`None` only for the synthetic document node)
/// - A parent (except for the document node and detached nodes)
/// - A position among siblings
#[derive(Debug)]
pub struct NodeInner {
    /// Child nodes.
    children: Vec<NodeRef>,
    /// XML content of this node.
    content: Option<XmlContent>,
    /// Weak reference to parent node.
    parent: WeakNodeRef,
    /// Zero-based position among siblings (-1 when detached).
    child_pos: i32,
}

impl NodeInner {
    /// Creates a new node with the given content.
    pub fn new(content: Option<XmlContent>) -> Self {
        NodeInner {
            children: Vec::new(),
            content,
            parent: Weak::new(),
            child_pos: -1,
        }
    }

    /// Returns the content of this node.
    pub fn content(&self) -> Option<&XmlContent> {
        self.content.as_ref()
    }

    /// Returns the element content, if this is an element node.
    pub fn element(&self) -> Option<&XmlElement> {
        self.content.as_ref().and_then(XmlContent::as_element)
    }

    /// Returns a mutable reference to the element content.
    pub fn element_mut(&mut self) -> Option<&mut XmlElement> {
        self.content.as_mut().and_then(XmlContent::as_element_mut)
    }

    /// Returns true if this is the synthetic document node.
    pub fn is_document(&self) -> bool {
        self.content.is_none()
    }

    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self.content, Some(XmlContent::Element(_)))
    }

    /// Returns the node name (`#text`, `#comment`, `#document` or the qname).
    pub fn name(&self) -> &str {
        match &self.content {
            Some(content) => content.node_name(),
            None => DOCUMENT_NODE_NAME,
        }
    }

    /// Returns the number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns the children as a slice.
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Returns a weak reference to the parent.
    pub fn parent(&self) -> &WeakNodeRef {
        &self.parent
    }

    /// Returns the child position (0-based index among siblings, -1 when detached).
    pub fn child_pos(&self) -> i32 {
        self.child_pos
    }

    /// Returns the concatenated text of this node and all its descendants.
    ///
    /// Comments do not contribute.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.content {
            Some(XmlContent::Text(t)) => out.push_str(t.text()),
            Some(XmlContent::Comment(_)) => {}
            _ => {
                for child in &self.children {
                    child.borrow().collect_text(out);
                }
            }
        }
    }
}

/// Helper functions that work with NodeRef.
impl NodeInner {
    /// Appends a child node.
    pub fn add_child_to_ref(parent_ref: &NodeRef, child_ref: NodeRef) {
        {
            let mut child = child_ref.borrow_mut();
            child.parent = Rc::downgrade(parent_ref);
            child.child_pos = parent_ref.borrow().children.len() as i32;
        }
        parent_ref.borrow_mut().children.push(child_ref);
    }

    /// Removes the child at the given index, returning it detached.
    pub fn remove_child_to_ref(parent_ref: &NodeRef, index: usize) -> Option<NodeRef> {
        let mut parent = parent_ref.borrow_mut();
        if index >= parent.children.len() {
            return None;
        }
        let removed = parent.children.remove(index);
        // Update child positions for siblings after the removal point
        for i in index..parent.children.len() {
            parent.children[i].borrow_mut().child_pos = i as i32;
        }
        {
            let mut child = removed.borrow_mut();
            child.parent = Weak::new();
            child.child_pos = -1;
        }
        Some(removed)
    }

    /// Detaches a node from its parent, returning the former parent.
    pub fn detach(node_ref: &NodeRef) -> Option<NodeRef> {
        let (parent, pos) = {
            let node = node_ref.borrow();
            (node.parent.upgrade()?, node.child_pos)
        };
        if pos < 0 {
            return None;
        }
        NodeInner::remove_child_to_ref(&parent, pos as usize);
        Some(parent)
    }

    /// Returns the parent node, if attached.
    pub fn parent_of_ref(node_ref: &NodeRef) -> Option<NodeRef> {
        node_ref.borrow().parent.upgrade()
    }

    /// Returns the `ordinal`-th (0-based) child named `name`, scanning the
    /// node's current children in document order.
    pub fn nth_child_named(node_ref: &NodeRef, name: &str, ordinal: usize) -> Option<NodeRef> {
        node_ref
            .borrow()
            .children
            .iter()
            .filter(|c| c.borrow().name() == name)
            .nth(ordinal)
            .cloned()
    }

    /// Walks parent links up to the top of the tree.
    pub fn tree_root_of_ref(node_ref: &NodeRef) -> NodeRef {
        let mut current = node_ref.clone();
        loop {
            let parent = current.borrow().parent.upgrade();
            match parent {
                Some(p) => current = p,
                None => return current,
            }
        }
    }

    /// Returns the chain of sibling positions from the tree root to this node.
    ///
    /// Comparing two keys from the same tree yields document order.
    pub fn document_order_key(node_ref: &NodeRef) -> Vec<usize> {
        let mut key = Vec::new();
        let mut current = node_ref.clone();
        loop {
            let (pos, parent) = {
                let node = current.borrow();
                (node.child_pos, node.parent.upgrade())
            };
            match parent {
                Some(p) if pos >= 0 => {
                    key.push(pos as usize);
                    current = p;
                }
                _ => break,
            }
        }
        key.reverse();
        key
    }
}

/// Deep-copies a subtree into a new detached tree.
///
/// Content (name, attributes, text) and descendant structure are preserved
/// exactly; the copy shares nothing with the original.
pub fn deep_copy(node_ref: &NodeRef) -> NodeRef {
    let node = node_ref.borrow();
    let copy = new_node(node.content.clone());
    for child in &node.children {
        NodeInner::add_child_to_ref(&copy, deep_copy(child));
    }
    copy
}

/// Compares two subtrees by content and structure.
pub fn trees_equal(a: &NodeRef, b: &NodeRef) -> bool {
    let a_borrowed = a.borrow();
    let b_borrowed = b.borrow();

    a_borrowed.content == b_borrowed.content
        && a_borrowed.child_count() == b_borrowed.child_count()
        && a_borrowed
            .children()
            .iter()
            .zip(b_borrowed.children().iter())
            .all(|(ca, cb)| trees_equal(ca, cb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn element(name: &str) -> NodeRef {
        new_element(XmlElement::new(name, HashMap::new()))
    }

    fn text(value: &str) -> NodeRef {
        new_node(Some(XmlContent::Text(XmlText::new(value))))
    }

    #[test]
    fn test_add_child() {
        let parent = element("parent");
        let child1 = element("child1");
        let child2 = element("child2");

        NodeInner::add_child_to_ref(&parent, child1.clone());
        NodeInner::add_child_to_ref(&parent, child2.clone());

        assert_eq!(parent.borrow().child_count(), 2);
        assert_eq!(child1.borrow().child_pos(), 0);
        assert_eq!(child2.borrow().child_pos(), 1);
        assert!(Rc::ptr_eq(
            &NodeInner::parent_of_ref(&child2).unwrap(),
            &parent
        ));
    }

    #[test]
    fn test_detach() {
        let parent = element("parent");
        let child1 = element("a");
        let child2 = element("b");
        let child3 = element("c");

        NodeInner::add_child_to_ref(&parent, child1.clone());
        NodeInner::add_child_to_ref(&parent, child2.clone());
        NodeInner::add_child_to_ref(&parent, child3.clone());

        let former = NodeInner::detach(&child2).unwrap();
        assert!(Rc::ptr_eq(&former, &parent));
        assert_eq!(parent.borrow().child_count(), 2);
        assert_eq!(child1.borrow().child_pos(), 0);
        assert_eq!(child3.borrow().child_pos(), 1);
        assert_eq!(child2.borrow().child_pos(), -1);
        assert!(NodeInner::parent_of_ref(&child2).is_none());

        // Detaching twice is a no-op
        assert!(NodeInner::detach(&child2).is_none());
    }

    #[test]
    fn test_nth_child_named() {
        let parent = element("a");
        NodeInner::add_child_to_ref(&parent, element("b"));
        NodeInner::add_child_to_ref(&parent, element("c"));
        let second_b = element("b");
        NodeInner::add_child_to_ref(&parent, second_b.clone());

        let found = NodeInner::nth_child_named(&parent, "b", 1).unwrap();
        assert!(Rc::ptr_eq(&found, &second_b));
        assert!(NodeInner::nth_child_named(&parent, "b", 2).is_none());
        assert!(NodeInner::nth_child_named(&parent, "d", 0).is_none());
    }

    #[test]
    fn test_text_content() {
        let root = element("a");
        let b = element("b");
        NodeInner::add_child_to_ref(&b, text("one"));
        NodeInner::add_child_to_ref(&root, b);
        NodeInner::add_child_to_ref(
            &root,
            new_node(Some(XmlContent::Comment(XmlComment::new("skip")))),
        );
        NodeInner::add_child_to_ref(&root, text("two"));

        assert_eq!(root.borrow().text_content(), "onetwo");
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let root = element("a");
        let b = element("b");
        NodeInner::add_child_to_ref(&b, text("1"));
        NodeInner::add_child_to_ref(&root, b);

        let copy = deep_copy(&root);
        assert!(trees_equal(&root, &copy));
        assert!(NodeInner::parent_of_ref(&copy).is_none());

        NodeInner::add_child_to_ref(&copy, element("c"));
        assert_eq!(root.borrow().child_count(), 1);
        assert!(!trees_equal(&root, &copy));
    }

    #[test]
    fn test_document_order_key() {
        let root = element("a");
        let b = element("b");
        let c = element("c");
        let d = element("d");
        NodeInner::add_child_to_ref(&root, b.clone());
        NodeInner::add_child_to_ref(&root, c.clone());
        NodeInner::add_child_to_ref(&b, d.clone());

        assert_eq!(NodeInner::document_order_key(&root), Vec::<usize>::new());
        assert_eq!(NodeInner::document_order_key(&d), vec![0, 0]);
        assert!(NodeInner::document_order_key(&d) < NodeInner::document_order_key(&c));
        assert!(Rc::ptr_eq(&NodeInner::tree_root_of_ref(&d), &root));
    }
}
