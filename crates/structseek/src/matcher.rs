//! Value matching.
//!
//! [`matches`] compares the capabilities a field exposes against a filter's
//! [`ValueSpec`]. The result already accounts for the filter's invert flag.

use crate::combine::EvalContext;
use crate::filter::{Filter, ValueSpec};
use crate::pattern::TextPattern;
use crate::record::{NodeId, RecordNode};
use crate::value::ResourceRef;

/// Returns `true` if the field at `node` satisfies `filter`, after
/// inversion.
pub fn matches(ctx: &EvalContext<'_>, node: NodeId, filter: &Filter) -> bool {
    let field = ctx.tree().node(node);
    let raw = match filter.value() {
        ValueSpec::Text(pattern) => text_matches(ctx, field, pattern),
        ValueSpec::Number { min, max } => field
            .as_numeric()
            .is_some_and(|n| n.in_range(*min, *max)),
        ValueSpec::Resource { name, ext } => field
            .as_reference()
            .is_some_and(|r| reference_matches(r, name, ext)),
        ValueSpec::Bitfield { value, mode } => field
            .as_bitfield()
            .is_some_and(|bits| mode.eval(bits, *value)),
    };
    raw != filter.is_inverted()
}

/// Text matching tries, in order: the text capability, the referenced
/// resource's name and then its alias, the pattern read as an integer
/// against the numeric capability, and the display string.
fn text_matches(ctx: &EvalContext<'_>, field: &RecordNode, pattern: &TextPattern) -> bool {
    if field.as_text().is_some_and(|text| pattern.is_match(text)) {
        return true;
    }

    if let Some(reference) = field.as_reference() {
        if pattern.is_match(reference.name()) {
            return true;
        }
        if let Some(alias) = ctx.alias_of(reference) {
            if pattern.is_match(&alias) {
                return true;
            }
        }
    }

    if let (Some(expected), Some(actual)) = (pattern.as_integer(), field.as_numeric()) {
        if expected == actual.to_i128() {
            return true;
        }
    }

    pattern.is_match(&field.value().display())
}

fn reference_matches(reference: &ResourceRef, name: &str, ext: &str) -> bool {
    let actual = reference.name();
    if ext.is_empty() {
        return actual.eq_ignore_ascii_case(name);
    }
    match actual.rsplit_once('.') {
        Some((stem, actual_ext)) => {
            stem.eq_ignore_ascii_case(name) && actual_ext.eq_ignore_ascii_case(ext)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::mode::BitMode;
    use crate::record::{RecordTree, RecordTreeBuilder};
    use crate::resource::{MemorySource, ResourceId};
    use crate::value::FieldValue;

    struct Fixture {
        id: ResourceId,
        tree: Arc<RecordTree>,
        source: MemorySource,
    }

    impl Fixture {
        fn new(value: FieldValue) -> Self {
            let mut b = RecordTreeBuilder::new("TEST.CRE", "CRE");
            let root = b.root();
            b.field(root, "Field", 0x10, "Field", value);
            let mut source = MemorySource::new();
            let imoen = ResourceId::new("IMOEN.CRE");
            source.insert_opaque(imoen.clone());
            source.set_alias(&imoen, "Imoen");
            Fixture {
                id: ResourceId::new("TEST.CRE"),
                tree: Arc::new(b.build()),
                source,
            }
        }

        fn check(&self, filter: Filter) -> bool {
            let ctx = EvalContext::new(&self.id, None, &self.tree, &self.source);
            let field = self.tree.children(self.tree.root())[0];
            matches(&ctx, field, &filter)
        }
    }

    fn text(pattern: &str) -> Filter {
        Filter::by_name("Field").text(pattern).build().unwrap()
    }

    #[test]
    fn text_capability() {
        let f = Fixture::new(FieldValue::text("Imoen"));
        assert!(f.check(text("moe")));
        assert!(f.check(text("IMOEN")));
        assert!(!f.check(text("Jaheira")));
        assert!(!f.check(
            Filter::by_name("Field")
                .text_with("IMOEN", true, false)
                .build()
                .unwrap()
        ));
    }

    #[test]
    fn text_through_reference_name_and_alias() {
        let f = Fixture::new(FieldValue::reference(ResourceRef::named("IMOEN.CRE")));
        assert!(f.check(text("imoen.cre")));
        assert!(f.check(
            Filter::by_name("Field").text_regex("^Imoen$").build().unwrap()
        ));
        assert!(!f.check(text("Jaheira")));
    }

    #[test]
    fn text_through_numeric_parse() {
        let f = Fixture::new(FieldValue::numeric(16u32).with_display("Ranged"));
        assert!(f.check(text("0x10")));
        assert!(f.check(text("10h")));
        assert!(f.check(text("16")));
        assert!(!f.check(text("17")));
        // display string is the last resort
        assert!(f.check(text("range")));
    }

    #[test]
    fn text_on_bare_structure_matches_only_empty_display() {
        let f = Fixture::new(FieldValue::none());
        assert!(!f.check(text("x")));
        assert!(f.check(Filter::by_name("Field").text_regex("^$").build().unwrap()));
    }

    #[test]
    fn number_range() {
        let f = Fixture::new(FieldValue::numeric(-3i32));
        assert!(f.check(Filter::by_name("Field").number(-5, -1).build().unwrap()));
        assert!(f.check(Filter::by_name("Field").number(-3, -3).build().unwrap()));
        assert!(!f.check(Filter::by_name("Field").number(0, 10).build().unwrap()));

        let text_only = Fixture::new(FieldValue::text("5"));
        assert!(!text_only.check(Filter::by_name("Field").number(5, 5).build().unwrap()));
    }

    #[test]
    fn resource_reference() {
        let f = Fixture::new(FieldValue::reference(ResourceRef::named("SPWI112.SPL")));
        let by = |name: &str, ext: &str| {
            Filter::by_name("Field").resource(name, ext).build().unwrap()
        };
        assert!(f.check(by("spwi112", "spl")));
        assert!(f.check(by("SPWI112.SPL", "")));
        assert!(!f.check(by("SPWI112", "")));
        assert!(!f.check(by("SPWI112", "ITM")));

        let none = Fixture::new(FieldValue::reference(ResourceRef::named("None")));
        assert!(none.check(by("", "")));
        assert!(none.check(by("None", "")));
        assert!(!none.check(by("SPWI112", "SPL")));
        assert!(!f.check(by("", "")));
    }

    #[test]
    fn bitfield_modes() {
        let f = Fixture::new(FieldValue::bitfield(0b0110));
        let by = |value: u64, mode: BitMode| {
            Filter::by_name("Field").bitfield(value, mode).build().unwrap()
        };
        assert!(f.check(by(0b0110, BitMode::Exact)));
        assert!(f.check(by(0b0100, BitMode::And)));
        assert!(!f.check(by(0b1100, BitMode::And)));
        assert!(f.check(by(0b1100, BitMode::Or)));
        assert!(f.check(by(0b1100, BitMode::Xor)));
        assert!(!f.check(by(0b0110, BitMode::Xor)));
    }

    #[test]
    fn inversion_flips_result() {
        let f = Fixture::new(FieldValue::numeric(7u8));
        let plain = Filter::by_name("Field").number(7, 7);
        assert!(f.check(plain.clone().build().unwrap()));
        assert!(!f.check(plain.inverted(true).build().unwrap()));

        let missing = Filter::by_name("Field").bitfield(1, BitMode::Exact).inverted(true);
        assert!(f.check(missing.build().unwrap()));
    }
}
