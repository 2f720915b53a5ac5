//! Manifest tree traversal
//!
//! A lazy, restartable depth-first preorder iterator over manifest nodes,
//! plus the derived enumeration of every object hash a tree references.
//! Traversal never mutates; dropping an iterator early is always safe.

use crate::manifest::node::{Node, ObjectHash};

/// Depth-first preorder iterator: each node before its children.
pub struct Preorder<'a> {
    stack: Vec<&'a Node>,
    sorted: bool,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Children are pushed in reverse so the first child pops first.
        if self.sorted {
            let mut entries: Vec<_> = node.children().iter().collect();
            entries.sort_by(|a, b| b.0.cmp(&a.0));
            self.stack.extend(entries.into_iter().map(|(_, child)| child));
        } else {
            self.stack
                .extend(node.children().iter().rev().map(|(_, child)| child));
        }
        Some(node)
    }
}

/// Iterate over `node` and every descendant, node before children.
///
/// With `sorted = true` each group's children are visited in ascending
/// name order, as required for reproducible downstream consumers;
/// otherwise the tree's native child order is used.
pub fn preorder(node: &Node, sorted: bool) -> Preorder<'_> {
    Preorder {
        stack: vec![node],
        sorted,
    }
}

/// Enumerate every object hash carried by any table or file leaf.
///
/// This is the interface a garbage-collector or sync collaborator uses to
/// find the physical objects a manifest references.
pub fn find_object_hashes(root: &Node) -> impl Iterator<Item = &ObjectHash> {
    preorder(root, false).flat_map(|node| node.object_hashes().iter())
}
