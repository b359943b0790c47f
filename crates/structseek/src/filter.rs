//! Validated filters.
//!
//! A [`Filter`] describes *where* to look (structure path, recursion,
//! grouping) and *what counts as a match* (field selector, value
//! specification, inversion). Filters are compiled from a [`FilterDef`] or
//! built in code with [`FilterBuilder`]; either way every regex and every
//! numeric argument is checked up front and the filter is immutable
//! afterwards.

use crate::definition::{FilterDef, Scalar, SelectorDef, ValueDef};
use crate::error::FilterError;
use crate::mode::BitMode;
use crate::pattern::{NamePattern, TextPattern};
use crate::value::ResourceRef;

/// How a filter picks the field(s) to test under each search root.
#[derive(Debug, Clone)]
pub enum FieldSelector {
    /// Every direct child whose name matches.
    ByName(NamePattern),
    /// The field at the search root's offset plus this many bytes.
    RelativeOffset(u64),
    /// The field at this offset from the start of the resource.
    AbsoluteOffset(u64),
}

impl FieldSelector {
    pub fn is_absolute(&self) -> bool {
        matches!(self, FieldSelector::AbsoluteOffset(_))
    }
}

/// Value test applied to each selected field.
#[derive(Debug, Clone)]
pub enum ValueSpec {
    /// Text, reference, numeric-parse and display-string matching.
    Text(TextPattern),
    /// Numeric value in `[min, max]`.
    Number { min: i64, max: i64 },
    /// Reference to `name` (or `name.ext` when `ext` is not empty).
    Resource { name: String, ext: String },
    /// Bitfield comparison.
    Bitfield { value: u64, mode: BitMode },
}

impl ValueSpec {
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueSpec::Text(_) => "text",
            ValueSpec::Number { .. } => "number",
            ValueSpec::Resource { .. } => "resource",
            ValueSpec::Bitfield { .. } => "bitfield",
        }
    }
}

/// A compiled structural and value match specification.
#[derive(Debug, Clone)]
pub struct Filter {
    path: Vec<NamePattern>,
    recursive: bool,
    group: bool,
    selector: FieldSelector,
    value: ValueSpec,
    invert: bool,
}

impl Filter {
    /// Validates and compiles a persisted definition.
    pub fn compile(def: &FilterDef) -> Result<Self, FilterError> {
        let path = def
            .path
            .iter()
            .map(|segment| NamePattern::new(segment, def.regex, false))
            .collect::<Result<Vec<_>, _>>()?;

        let selector = match &def.selector {
            SelectorDef::Name {
                name,
                case_sensitive,
                regex,
            } => FieldSelector::ByName(NamePattern::new(name, *regex, *case_sensitive)?),
            SelectorDef::RelativeOffset { offset } => {
                FieldSelector::RelativeOffset(offset.to_u64("offset")?)
            }
            SelectorDef::AbsoluteOffset { offset } => {
                FieldSelector::AbsoluteOffset(offset.to_u64("offset")?)
            }
        };

        let value = match &def.value {
            ValueDef::Text {
                text,
                case_sensitive,
                regex,
            } => ValueSpec::Text(TextPattern::new(text, *regex, *case_sensitive)?),
            ValueDef::Number { min, max } => {
                let min = min.to_i64("min")?;
                let max = max.to_i64("max")?;
                if min > max {
                    return Err(FilterError::InvalidRange { min, max });
                }
                ValueSpec::Number { min, max }
            }
            ValueDef::Resource { name, ext } => ValueSpec::Resource {
                name: ResourceRef::named(name.as_str()).name().to_string(),
                ext: ext.trim().trim_start_matches('.').to_string(),
            },
            ValueDef::Bitfield { value, mode } => ValueSpec::Bitfield {
                value: value.to_u64("bitfield value")?,
                mode: *mode,
            },
        };

        Ok(Filter {
            path,
            recursive: def.recursive,
            group: def.group,
            selector,
            value,
            invert: def.invert,
        })
    }

    /// Starts a filter selecting fields by name.
    pub fn by_name(name: impl Into<String>) -> FilterBuilder {
        FilterBuilder::new(SelectorDef::Name {
            name: name.into(),
            case_sensitive: false,
            regex: false,
        })
    }

    /// Starts a filter selecting the field at an offset relative to each
    /// search root.
    pub fn by_relative_offset(offset: u64) -> FilterBuilder {
        FilterBuilder::new(SelectorDef::RelativeOffset {
            offset: Scalar::Unsigned(offset),
        })
    }

    /// Starts a filter selecting the field at an absolute resource offset.
    pub fn by_absolute_offset(offset: u64) -> FilterBuilder {
        FilterBuilder::new(SelectorDef::AbsoluteOffset {
            offset: Scalar::Unsigned(offset),
        })
    }

    /// Structure path segments in effect.
    ///
    /// Always empty for absolute-offset selection, whatever was stored.
    pub fn structure_path(&self) -> &[NamePattern] {
        if self.selector.is_absolute() {
            &[]
        } else {
            &self.path
        }
    }

    /// Whether search roots expand to their composite descendants.
    ///
    /// Always on for absolute-offset selection.
    pub fn is_recursive(&self) -> bool {
        self.selector.is_absolute() || self.recursive
    }

    /// Whether the grouping guard applies.
    ///
    /// Always off for absolute-offset selection.
    pub fn is_grouped(&self) -> bool {
        !self.selector.is_absolute() && self.group
    }

    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    pub fn selector(&self) -> &FieldSelector {
        &self.selector
    }

    pub fn value(&self) -> &ValueSpec {
        &self.value
    }
}

/// Fluent constructor for [`Filter`].
///
/// The builder collects a [`FilterDef`] and validates it in [`build`],
/// so code-built filters go through the same checks as persisted ones.
///
/// # Example
///
/// ```
/// use structseek::{BitMode, Filter};
///
/// let filter = Filter::by_name("Flags")
///     .path(["Actor"])
///     .grouped(true)
///     .bitfield(0x4, BitMode::And)
///     .build()
///     .unwrap();
///
/// assert!(filter.is_grouped());
/// assert_eq!(filter.structure_path().len(), 1);
///
/// assert!(Filter::by_name("Type").number(9, 1).build().is_err());
/// ```
///
/// [`build`]: FilterBuilder::build
#[derive(Debug, Clone)]
pub struct FilterBuilder {
    def: FilterDef,
    has_value: bool,
}

impl FilterBuilder {
    fn new(selector: SelectorDef) -> Self {
        FilterBuilder {
            def: FilterDef::new(
                selector,
                ValueDef::Text {
                    text: String::new(),
                    case_sensitive: false,
                    regex: false,
                },
            ),
            has_value: false,
        }
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Sets the structure path, outermost segment first.
    pub fn path<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.path = segments.into_iter().map(Into::into).collect();
        self
    }

    /// Treats structure path segments as regular expressions.
    pub fn path_regex(mut self, regex: bool) -> Self {
        self.def.regex = regex;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.def.recursive = recursive;
        self
    }

    pub fn grouped(mut self, group: bool) -> Self {
        self.def.group = group;
        self
    }

    /// Sets the case and regex flags of a by-name selector.
    ///
    /// Has no effect on offset selectors.
    pub fn name_flags(mut self, case_sensitive: bool, regex: bool) -> Self {
        if let SelectorDef::Name {
            case_sensitive: c,
            regex: r,
            ..
        } = &mut self.def.selector
        {
            *c = case_sensitive;
            *r = regex;
        }
        self
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Case-insensitive literal text match.
    pub fn text(self, text: impl Into<String>) -> Self {
        self.text_with(text, false, false)
    }

    /// Case-insensitive regex text match.
    pub fn text_regex(self, pattern: impl Into<String>) -> Self {
        self.text_with(pattern, false, true)
    }

    pub fn text_with(mut self, text: impl Into<String>, case_sensitive: bool, regex: bool) -> Self {
        self.def.value = ValueDef::Text {
            text: text.into(),
            case_sensitive,
            regex,
        };
        self.has_value = true;
        self
    }

    /// Numeric value in `[min, max]`.
    pub fn number(mut self, min: i64, max: i64) -> Self {
        self.def.value = ValueDef::Number {
            min: Scalar::Signed(min),
            max: Scalar::Signed(max),
        };
        self.has_value = true;
        self
    }

    /// Reference to `name`, or to `name.ext` when `ext` is not empty.
    pub fn resource(mut self, name: impl Into<String>, ext: impl Into<String>) -> Self {
        self.def.value = ValueDef::Resource {
            name: name.into(),
            ext: ext.into(),
        };
        self.has_value = true;
        self
    }

    pub fn bitfield(mut self, value: u64, mode: BitMode) -> Self {
        self.def.value = ValueDef::Bitfield {
            value: Scalar::Unsigned(value),
            mode,
        };
        self.has_value = true;
        self
    }

    pub fn inverted(mut self, invert: bool) -> Self {
        self.def.invert = invert;
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// The definition collected so far.
    pub fn definition(&self) -> &FilterDef {
        &self.def
    }

    /// Compiles the filter.
    ///
    /// Fails with [`FilterError::MissingValue`] if no value matcher was chosen.
    pub fn build(self) -> Result<Filter, FilterError> {
        if !self.has_value {
            return Err(FilterError::MissingValue);
        }
        Filter::compile(&self.def)
    }
}
