//! Field location under a search root.

use crate::combine::EvalContext;
use crate::filter::{FieldSelector, Filter};
use crate::hit::Hit;
use crate::matcher::matches;
use crate::record::NodeId;

/// Tests the field(s) `filter` selects under `root`, pushing a hit for
/// every field that matches.
///
/// Returns `true` if at least one field matched. Name selection tests every
/// child whose name fits; offset selection tests at most one field.
pub fn locate(ctx: &EvalContext<'_>, root: NodeId, filter: &Filter, hits: &mut Vec<Hit>) -> bool {
    let tree = ctx.tree();
    match filter.selector() {
        FieldSelector::ByName(pattern) => {
            let mut found = false;
            for &child in tree.children(root) {
                if pattern.is_match(tree.node(child).name()) && matches(ctx, child, filter) {
                    hits.push(ctx.hit(child));
                    found = true;
                }
            }
            found
        }
        FieldSelector::RelativeOffset(delta) => {
            let field = tree
                .node(root)
                .offset()
                .checked_add(*delta)
                .and_then(|offset| tree.field_at_offset(offset));
            test_one(ctx, field, filter, hits)
        }
        FieldSelector::AbsoluteOffset(offset) => {
            test_one(ctx, tree.field_at_offset(*offset), filter, hits)
        }
    }
}

fn test_one(
    ctx: &EvalContext<'_>,
    field: Option<NodeId>,
    filter: &Filter,
    hits: &mut Vec<Hit>,
) -> bool {
    match field {
        Some(field) if matches(ctx, field, filter) => {
            hits.push(ctx.hit(field));
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::record::{RecordTree, RecordTreeBuilder};
    use crate::resource::{MemorySource, ResourceId};
    use crate::value::FieldValue;

    fn creature() -> Arc<RecordTree> {
        let mut b = RecordTreeBuilder::new("BANDIT.CRE", "CRE");
        let root = b.root();
        b.field(root, "Signature", 0x0, "TextString", FieldValue::text("CRE "));
        let block = b.structure(root, "Stats", 0x20, "Stats");
        b.field(block, "Level 1", 0x20, "DecNumber", FieldValue::numeric(4u8));
        b.field(block, "Level 2", 0x21, "DecNumber", FieldValue::numeric(9u8));
        b.field(block, "Levels", 0x22, "DecNumber", FieldValue::numeric(9u8));
        Arc::new(b.build())
    }

    fn run(filter: &Filter, root: NodeId) -> (bool, Vec<String>) {
        let tree = creature();
        let id = ResourceId::new("BANDIT.CRE");
        let source = MemorySource::new();
        let ctx = EvalContext::new(&id, None, &tree, &source);
        let mut hits = Vec::new();
        let found = locate(&ctx, root, filter, &mut hits);
        (found, hits.iter().map(Hit::path).collect())
    }

    fn stats() -> NodeId {
        creature().children(NodeId::ROOT)[1]
    }

    #[test]
    fn by_name_tests_every_matching_child() {
        let filter = Filter::by_name("Level").number(0, 10).build().unwrap();
        let (found, hits) = run(&filter, stats());
        assert!(found);
        assert_eq!(
            hits,
            vec!["BANDIT.CRE > Stats > Level 1", "BANDIT.CRE > Stats > Level 2"]
        );
    }

    #[test]
    fn by_name_reports_only_matching_values() {
        let filter = Filter::by_name("Level").number(9, 9).build().unwrap();
        let (found, hits) = run(&filter, stats());
        assert!(found);
        assert_eq!(hits, vec!["BANDIT.CRE > Stats > Level 2"]);

        let filter = Filter::by_name("Level").number(20, 30).build().unwrap();
        assert_eq!(run(&filter, stats()), (false, Vec::new()));
    }

    #[test]
    fn relative_offset_adds_root_offset() {
        let filter = Filter::by_relative_offset(1).number(9, 9).build().unwrap();
        let (found, hits) = run(&filter, stats());
        assert!(found);
        assert_eq!(hits, vec!["BANDIT.CRE > Stats > Level 2"]);

        let filter = Filter::by_relative_offset(u64::MAX).number(9, 9).build().unwrap();
        assert!(!run(&filter, stats()).0);
    }

    #[test]
    fn absolute_offset_uses_resource_offset() {
        let filter = Filter::by_absolute_offset(0x22).number(9, 9).build().unwrap();
        let (found, hits) = run(&filter, NodeId::ROOT);
        assert!(found);
        assert_eq!(hits, vec!["BANDIT.CRE > Stats > Levels"]);

        let filter = Filter::by_absolute_offset(0x99).number(9, 9).build().unwrap();
        assert!(!run(&filter, NodeId::ROOT).0);
    }
}
