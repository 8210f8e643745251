#![forbid(unsafe_code)]

//! NodeSet type for document-subset canonicalization.
//!
//! A `NodeSet` holds the `NodeId`s of the nodes visible to a transform or
//! canonicalization pass. The enveloped-signature transform subtracts the
//! signature subtree from it; C14N renders only the contained nodes.

use std::collections::HashSet;

/// A set of XML document nodes identified by `roxmltree::NodeId`.
///
/// Valid only against the document it was built from.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: HashSet<roxmltree::NodeId>,
}

impl NodeSet {
    /// Create an empty node set.
    pub fn new() -> Self {
        Self {
            nodes: HashSet::new(),
        }
    }

    /// Create a node set containing every node in the document except
    /// comments. Per W3C DSig, `URI=""` selects the document without
    /// comments.
    pub fn all_without_comments(doc: &roxmltree::Document<'_>) -> Self {
        let mut nodes = HashSet::new();
        nodes.insert(doc.root().id());
        for node in doc.root().descendants() {
            if node.node_type() != roxmltree::NodeType::Comment {
                nodes.insert(node.id());
            }
        }
        Self { nodes }
    }

    /// Create a node set for the subtree rooted at the given node,
    /// excluding comments.
    pub fn tree_without_comments(root: roxmltree::Node<'_, '_>) -> Self {
        let mut nodes = HashSet::new();
        for node in root.descendants() {
            if node.node_type() != roxmltree::NodeType::Comment {
                nodes.insert(node.id());
            }
        }
        Self { nodes }
    }

    /// Check if a node is in this set.
    pub fn contains(&self, node: &roxmltree::Node<'_, '_>) -> bool {
        self.nodes.contains(&node.id())
    }

    /// Add a node to this set.
    pub fn insert(&mut self, node: roxmltree::Node<'_, '_>) {
        self.nodes.insert(node.id());
    }

    /// Remove a node and all its descendants from this set.
    pub fn remove_subtree(&mut self, root: roxmltree::Node<'_, '_>) {
        for node in root.descendants() {
            self.nodes.remove(&node.id());
        }
    }

    /// Check if this set is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes in the set.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
