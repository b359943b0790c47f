//! Search hits and their ordering.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::record::{NodeId, RecordNode, RecordTree};
use crate::resource::ResourceId;

/// A field that passed a filter.
///
/// Hits keep their resource's tree alive, so they stay valid after the
/// search that produced them has finished.
#[derive(Debug, Clone)]
pub struct Hit {
    resource: ResourceId,
    alias: Option<String>,
    tree: Arc<RecordTree>,
    node: NodeId,
}

impl Hit {
    pub fn new(
        resource: ResourceId,
        alias: Option<String>,
        tree: Arc<RecordTree>,
        node: NodeId,
    ) -> Self {
        Hit {
            resource,
            alias,
            tree,
            node,
        }
    }

    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    /// Search alias of the resource, if it has one.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn tree(&self) -> &Arc<RecordTree> {
        &self.tree
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// The matched node.
    pub fn node(&self) -> &RecordNode {
        self.tree.node(self.node)
    }

    /// Names from the resource root to the matched node, joined by ` > `.
    pub fn path(&self) -> String {
        self.tree.path(self.node)
    }

    pub fn offset(&self) -> u64 {
        self.node().offset()
    }
}

impl fmt::Display for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {:#x}: {}", self.resource, self.offset(), self.path())
    }
}

/// Total order used for published results: resource name ignoring case,
/// then node offset, then node id.
pub fn compare_hits(a: &Hit, b: &Hit) -> Ordering {
    a.resource
        .cmp(&b.resource)
        .then_with(|| a.offset().cmp(&b.offset()))
        .then_with(|| a.node.cmp(&b.node))
}

pub fn sort_hits(hits: &mut [Hit]) {
    hits.sort_by(compare_hits);
}

/// Terminal summary of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitSummary {
    pub hit_count: usize,
    pub unique_resources: usize,
}

impl HitSummary {
    pub fn of(hits: &[Hit]) -> Self {
        let unique: HashSet<&ResourceId> = hits.iter().map(Hit::resource).collect();
        HitSummary {
            hit_count: hits.len(),
            unique_resources: unique.len(),
        }
    }
}

impl fmt::Display for HitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hit(s) in {} resource(s)",
            self.hit_count, self.unique_resources
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordTreeBuilder;
    use crate::value::FieldValue;

    fn tree(name: &str) -> Arc<RecordTree> {
        let mut b = RecordTreeBuilder::new(name, "ITM");
        let root = b.root();
        b.field(root, "Type", 0x1c, "Bitmap", FieldValue::numeric(5u16));
        b.field(root, "Flags", 0x18, "Flag", FieldValue::bitfield(1));
        b.field(root, "Alias", 0x18, "Flag", FieldValue::bitfield(1));
        Arc::new(b.build())
    }

    #[test]
    fn ordering_by_resource_offset_then_node() {
        let a = tree("a.itm");
        let b = tree("B.ITM");
        let mut hits = vec![
            Hit::new("B.ITM".into(), None, b.clone(), NodeId::ROOT),
            Hit::new("a.itm".into(), None, a.clone(), a.children(NodeId::ROOT)[0]),
            Hit::new("a.itm".into(), None, a.clone(), a.children(NodeId::ROOT)[2]),
            Hit::new("a.itm".into(), None, a.clone(), a.children(NodeId::ROOT)[1]),
        ];
        sort_hits(&mut hits);

        let described: Vec<(String, u64, String)> = hits
            .iter()
            .map(|h| (h.resource().to_string(), h.offset(), h.node().name().to_string()))
            .collect();
        assert_eq!(
            described,
            vec![
                ("a.itm".to_string(), 0x18, "Flags".to_string()),
                ("a.itm".to_string(), 0x18, "Alias".to_string()),
                ("a.itm".to_string(), 0x1c, "Type".to_string()),
                ("B.ITM".to_string(), 0, "B.ITM".to_string()),
            ]
        );
    }

    #[test]
    fn summary_counts_unique_resources() {
        let a = tree("A.ITM");
        let hits = vec![
            Hit::new("A.ITM".into(), None, a.clone(), NodeId::ROOT),
            Hit::new("a.itm".into(), None, a.clone(), a.children(NodeId::ROOT)[0]),
            Hit::new("C.ITM".into(), Some("Cloak".into()), a, NodeId::ROOT),
        ];
        let summary = HitSummary::of(&hits);
        assert_eq!(summary.hit_count, 3);
        assert_eq!(summary.unique_resources, 2);
        assert_eq!(summary.to_string(), "3 hit(s) in 2 resource(s)");
        assert_eq!(HitSummary::of(&[]), HitSummary::default());
    }

    #[test]
    fn display_includes_location() {
        let a = tree("A.ITM");
        let hit = Hit::new("A.ITM".into(), None, a.clone(), a.children(NodeId::ROOT)[0]);
        assert_eq!(hit.to_string(), "A.ITM @ 0x1c: A.ITM > Type");
        assert_eq!(hit.path(), "A.ITM > Type");
    }
}
