//! Per-resource evaluation of a filter set.

use std::sync::Arc;

use crate::filter_set::FilterSet;
use crate::grouping::GroupingGuard;
use crate::hit::Hit;
use crate::locate::locate;
use crate::record::{NodeId, RecordTree};
use crate::resolve::resolve;
use crate::resource::{ResourceId, ResourceSource};
use crate::value::ResourceRef;

/// Everything the matchers need to know about the resource being searched.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    resource: &'a ResourceId,
    alias: Option<&'a str>,
    tree: &'a Arc<RecordTree>,
    source: &'a dyn ResourceSource,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        resource: &'a ResourceId,
        alias: Option<&'a str>,
        tree: &'a Arc<RecordTree>,
        source: &'a dyn ResourceSource,
    ) -> Self {
        EvalContext {
            resource,
            alias,
            tree,
            source,
        }
    }

    pub fn resource(&self) -> &ResourceId {
        self.resource
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias
    }

    pub fn tree(&self) -> &RecordTree {
        self.tree
    }

    /// Search alias of the resource a reference points at.
    pub fn alias_of(&self, reference: &ResourceRef) -> Option<String> {
        reference
            .resource_id()
            .and_then(|id| self.source.alias(&id))
    }

    /// A hit on `node` of the current resource.
    pub fn hit(&self, node: NodeId) -> Hit {
        Hit::new(
            self.resource.clone(),
            self.alias.map(str::to_string),
            Arc::clone(self.tree),
            node,
        )
    }
}

/// Result of evaluating a filter set against one resource.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Filters satisfied by at least one accepted search root.
    pub satisfied: usize,
    pub total: usize,
    pub verdict: bool,
    /// Every hit gathered while evaluating; empty unless `verdict` holds.
    pub hits: Vec<Hit>,
}

/// Runs every filter of `set` against the resource in `ctx` and combines
/// the per-filter results with the set's mode.
///
/// A filter is satisfied by the first search root where a field matches
/// and, for grouped filters, the grouping guard accepts the root. Later
/// roots are not tried. Hits recorded along the way are kept for every
/// filter, satisfied or not, and published only if the verdict holds.
pub fn evaluate_resource(ctx: &EvalContext<'_>, set: &FilterSet) -> Evaluation {
    let tree = ctx.tree();
    let mut guard = GroupingGuard::new();
    let mut hits = Vec::new();
    let mut satisfied = 0;

    for filter in set.filters() {
        let roots = resolve(tree, filter);
        let found = roots.iter().any(|&root| {
            locate(ctx, root, filter, &mut hits)
                && (!filter.is_grouped() || guard.accept(tree, root))
        });
        if found {
            satisfied += 1;
        }
    }

    let total = set.len();
    let verdict = set.mode().verdict(satisfied, total);
    if !verdict {
        hits.clear();
    }

    Evaluation {
        satisfied,
        total,
        verdict,
        hits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::mode::FilterMode;
    use crate::record::RecordTreeBuilder;
    use crate::resource::MemorySource;
    use crate::value::FieldValue;

    /// An area with two actors: Imoen (level 3) and Jaheira (level 5).
    fn area() -> Arc<RecordTree> {
        let mut b = RecordTreeBuilder::new("AR0602.ARE", "ARE");
        let root = b.root();
        for (i, (name, level)) in [("Imoen", 3u8), ("Jaheira", 5)].into_iter().enumerate() {
            let offset = 0x100 * (i as u64 + 1);
            let actor = b.structure(root, format!("Actor {i}"), offset, "Actor");
            b.field(actor, "Name", offset, "TextString", FieldValue::text(name));
            b.field(actor, "Level", offset + 4, "DecNumber", FieldValue::numeric(level));
        }
        Arc::new(b.build())
    }

    fn evaluate(mode: FilterMode, filters: Vec<Filter>) -> Evaluation {
        let tree = area();
        let id = ResourceId::new("AR0602.ARE");
        let source = MemorySource::new();
        let ctx = EvalContext::new(&id, Some("Candlekeep"), &tree, &source);
        let set = FilterSet::new("ARE", mode, filters).unwrap();
        evaluate_resource(&ctx, &set)
    }

    fn name(text: &str, grouped: bool) -> Filter {
        Filter::by_name("Name")
            .path(["Actor"])
            .grouped(grouped)
            .text(text)
            .build()
            .unwrap()
    }

    fn level(value: i64, grouped: bool) -> Filter {
        Filter::by_name("Level")
            .path(["Actor"])
            .grouped(grouped)
            .number(value, value)
            .build()
            .unwrap()
    }

    #[test]
    fn match_all_requires_every_filter() {
        let result = evaluate(FilterMode::MatchAll, vec![name("Imoen", false), level(5, false)]);
        assert_eq!(result.satisfied, 2);
        assert!(result.verdict);
        assert_eq!(result.hits.len(), 2);
        assert_eq!(result.hits[0].alias(), Some("Candlekeep"));

        let result = evaluate(FilterMode::MatchAll, vec![name("Imoen", false), level(9, false)]);
        assert_eq!(result.satisfied, 1);
        assert!(!result.verdict);
        assert!(result.hits.is_empty());
    }

    #[test]
    fn grouping_confines_filters_to_one_branch() {
        // Imoen is level 3, not 5: ungrouped, the two filters match
        // different actors; grouped, the second is rejected.
        let ungrouped = evaluate(FilterMode::MatchAll, vec![name("Imoen", false), level(5, false)]);
        assert!(ungrouped.verdict);

        let grouped = evaluate(FilterMode::MatchAll, vec![name("Imoen", true), level(5, true)]);
        assert_eq!(grouped.satisfied, 1);
        assert!(!grouped.verdict);

        let same_actor = evaluate(FilterMode::MatchAll, vec![name("Imoen", true), level(3, true)]);
        assert!(same_actor.verdict);
    }

    #[test]
    fn match_any_keeps_hits_of_unsatisfied_filters_too() {
        let result = evaluate(FilterMode::MatchAny, vec![name("Jaheira", false), level(9, false)]);
        assert_eq!(result.satisfied, 1);
        assert!(result.verdict);
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].path(), "AR0602.ARE > Actor 1 > Name");
    }

    #[test]
    fn match_one_rejects_two_satisfied_filters() {
        let result = evaluate(FilterMode::MatchOne, vec![name("Imoen", false), level(5, false)]);
        assert_eq!(result.satisfied, 2);
        assert!(!result.verdict);

        let result = evaluate(FilterMode::MatchOne, vec![name("Imoen", false), level(9, false)]);
        assert!(result.verdict);
    }

    #[test]
    fn satisfied_filter_stops_at_first_root() {
        // Both actors carry a Name, but only the first root is visited.
        let result = evaluate(FilterMode::MatchAll, vec![name("e", false)]);
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].path(), "AR0602.ARE > Actor 0 > Name");
    }
}
