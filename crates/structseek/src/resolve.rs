//! Structure resolution: which nodes a filter inspects.

use crate::filter::Filter;
use crate::pattern::NamePattern;
use crate::record::{NodeId, RecordTree};

/// Returns the search roots of `filter` in `tree`.
///
/// Walks the structure path one segment at a time over composite children.
/// An empty path yields the resource root. With recursion on, every root is
/// followed by all of its composite descendants in depth-first pre-order.
/// Roots reachable from several places are listed once per place.
pub fn resolve(tree: &RecordTree, filter: &Filter) -> Vec<NodeId> {
    let roots = match filter.structure_path() {
        [] => vec![tree.root()],
        path => walk(tree, tree.root(), path),
    };

    if !filter.is_recursive() {
        return roots;
    }

    let mut expanded = Vec::with_capacity(roots.len());
    for root in roots {
        expanded.push(root);
        expanded.extend(tree.composite_descendants(root));
    }
    expanded
}

fn walk(tree: &RecordTree, node: NodeId, path: &[NamePattern]) -> Vec<NodeId> {
    let Some((segment, rest)) = path.split_first() else {
        return vec![node];
    };

    let mut found = Vec::new();
    for &child in tree.children(node) {
        let candidate = tree.node(child);
        if candidate.is_composite() && segment.is_match(candidate.name()) {
            found.extend(walk(tree, child, rest));
        }
    }
    found
}
