//! Grouping guard.
//!
//! When filters request grouping, their matches must agree on one
//! structural branch per shape chain: the first search root accepted with a
//! given chain of shapes claims it, and other roots with the same chain are
//! rejected for the rest of the resource's evaluation.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::record::{NodeId, RecordTree, Shape};

/// Per-resource record of accepted search roots, keyed by shape chain.
#[derive(Debug, Default)]
pub struct GroupingGuard {
    accepted: HashMap<Vec<Shape>, NodeId>,
}

impl GroupingGuard {
    pub fn new() -> Self {
        GroupingGuard::default()
    }

    /// Accepts `root` unless a different node already claimed its shape
    /// chain.
    pub fn accept(&mut self, tree: &RecordTree, root: NodeId) -> bool {
        match self.accepted.entry(tree.shape_chain(root)) {
            Entry::Occupied(claimed) => *claimed.get() == root,
            Entry::Vacant(slot) => {
                slot.insert(root);
                true
            }
        }
    }

    /// Number of claimed shape chains.
    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordTreeBuilder;

    #[test]
    fn same_shape_siblings_are_exclusive() {
        let mut b = RecordTreeBuilder::new("AR.ARE", "ARE");
        let root = b.root();
        let a = b.structure(root, "Actor 0", 0x100, "Actor");
        let c = b.structure(root, "Actor 1", 0x200, "Actor");
        let door = b.structure(root, "Door 0", 0x300, "Door");
        let tree = b.build();

        let mut guard = GroupingGuard::new();
        assert!(guard.accept(&tree, a));
        assert!(guard.accept(&tree, a), "re-accepting the claimant");
        assert!(!guard.accept(&tree, c));
        assert!(guard.accept(&tree, door));
        assert_eq!(guard.len(), 2);
    }

    #[test]
    fn same_shape_at_different_depth_is_independent() {
        let mut b = RecordTreeBuilder::new("AR.ARE", "ARE");
        let root = b.root();
        let outer = b.structure(root, "Item 0", 0x10, "Item");
        let inner = b.structure(outer, "Item 0", 0x20, "Item");
        let tree = b.build();

        let mut guard = GroupingGuard::new();
        assert!(guard.accept(&tree, outer));
        assert!(guard.accept(&tree, inner));
    }
}
