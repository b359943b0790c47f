//! Field capability values.
//!
//! A record node may expose any combination of four capabilities: a numeric
//! value, a textual value, a resource reference and a bitfield. The
//! [`FieldValue`] struct carries whichever of them the record parser filled
//! in; the value matcher picks the one a filter asks for.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use crate::resource::ResourceId;

/// Integer value of a numeric field.
///
/// Fields are either signed or unsigned in the underlying binary format.
/// Both variants are compared through `i128`, which holds every value of
/// either without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Number {
    /// Signed integer field.
    I64(i64),
    /// Unsigned integer field.
    U64(u64),
}

impl Number {
    /// Widens the number to `i128`.
    pub fn to_i128(self) -> i128 {
        match self {
            Number::I64(n) => n as i128,
            Number::U64(n) => n as i128,
        }
    }

    /// Compares two numbers, handling mixed signedness.
    pub fn compare(self, other: Number) -> Ordering {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => a.cmp(&b),
            (Number::U64(a), Number::U64(b)) => a.cmp(&b),
            _ => self.to_i128().cmp(&other.to_i128()),
        }
    }

    /// Returns `true` if the value lies in `[min, max]` inclusive.
    pub fn in_range(self, min: i64, max: i64) -> bool {
        let value = self.to_i128();
        value >= min as i128 && value <= max as i128
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(*other)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{n}"),
            Number::U64(n) => write!(f, "{n}"),
        }
    }
}

impl From<i8> for Number {
    fn from(n: i8) -> Self {
        Number::I64(n as i64)
    }
}

impl From<i16> for Number {
    fn from(n: i16) -> Self {
        Number::I64(n as i64)
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::I64(n as i64)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::I64(n)
    }
}

impl From<u8> for Number {
    fn from(n: u8) -> Self {
        Number::U64(n as u64)
    }
}

impl From<u16> for Number {
    fn from(n: u16) -> Self {
        Number::U64(n as u64)
    }
}

impl From<u32> for Number {
    fn from(n: u32) -> Self {
        Number::U64(n as u64)
    }
}

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        Number::U64(n)
    }
}

/// Target of a resource-reference field.
///
/// Formats use an explicit "none" marker for empty references; both that
/// marker and an empty name collapse into [`ResourceRef::None`], whose
/// name reads as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ResourceRef {
    /// The field points at nothing.
    #[default]
    None,
    /// Resolved target resource name, e.g. `SPWI112.SPL`.
    Named(String),
}

impl ResourceRef {
    /// Creates a reference, normalizing the "none" sentinel.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            ResourceRef::None
        } else {
            ResourceRef::Named(trimmed.to_string())
        }
    }

    /// Returns the resolved name, or `""` for [`ResourceRef::None`].
    pub fn name(&self) -> &str {
        match self {
            ResourceRef::None => "",
            ResourceRef::Named(name) => name,
        }
    }

    /// Returns `true` if the reference points at nothing.
    pub fn is_none(&self) -> bool {
        matches!(self, ResourceRef::None)
    }

    /// Returns the identity of the referenced resource, if any.
    pub fn resource_id(&self) -> Option<ResourceId> {
        match self {
            ResourceRef::None => None,
            ResourceRef::Named(name) => Some(ResourceId::new(name.as_str())),
        }
    }
}

/// Capabilities exposed by a single record node.
///
/// # Example
///
/// ```
/// use structseek::{FieldValue, Number, ResourceRef};
///
/// let value = FieldValue::numeric(16u16).with_display("0x10 (Ranged)");
/// assert_eq!(value.as_numeric(), Some(Number::U64(16)));
/// assert_eq!(value.as_text(), None);
/// assert_eq!(value.display(), "0x10 (Ranged)");
///
/// let spell = FieldValue::reference(ResourceRef::named("SPWI112.SPL"));
/// assert_eq!(spell.display(), "SPWI112.SPL");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValue {
    numeric: Option<Number>,
    text: Option<String>,
    reference: Option<ResourceRef>,
    bits: Option<u64>,
    display: Option<String>,
}

impl FieldValue {
    /// A node exposing no capability (plain structures, padding, ...).
    pub fn none() -> Self {
        FieldValue::default()
    }

    pub fn numeric(n: impl Into<Number>) -> Self {
        FieldValue::none().with_numeric(n)
    }

    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::none().with_text(s)
    }

    pub fn reference(r: ResourceRef) -> Self {
        FieldValue::none().with_reference(r)
    }

    pub fn bitfield(bits: u64) -> Self {
        FieldValue::none().with_bitfield(bits)
    }

    pub fn with_numeric(mut self, n: impl Into<Number>) -> Self {
        self.numeric = Some(n.into());
        self
    }

    pub fn with_text(mut self, s: impl Into<String>) -> Self {
        self.text = Some(s.into());
        self
    }

    pub fn with_reference(mut self, r: ResourceRef) -> Self {
        self.reference = Some(r);
        self
    }

    pub fn with_bitfield(mut self, bits: u64) -> Self {
        self.bits = Some(bits);
        self
    }

    /// Overrides the generic display string.
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn as_numeric(&self) -> Option<Number> {
        self.numeric
    }

    pub fn as_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn as_reference(&self) -> Option<&ResourceRef> {
        self.reference.as_ref()
    }

    pub fn as_bitfield(&self) -> Option<u64> {
        self.bits
    }

    /// Returns `true` if no capability and no display string is set.
    pub fn is_empty(&self) -> bool {
        self == &FieldValue::default()
    }

    /// Generic display string of the field.
    ///
    /// Uses the explicit display string when the parser supplied one,
    /// otherwise the first available of: text, reference name, number,
    /// bitfield (hex). Nodes without any capability display as `""`.
    pub fn display(&self) -> Cow<'_, str> {
        if let Some(display) = &self.display {
            return Cow::Borrowed(display);
        }
        if let Some(text) = &self.text {
            return Cow::Borrowed(text);
        }
        if let Some(reference) = &self.reference {
            return Cow::Borrowed(reference.name());
        }
        if let Some(n) = self.numeric {
            return Cow::Owned(n.to_string());
        }
        if let Some(bits) = self.bits {
            return Cow::Owned(format!("{bits:#x}"));
        }
        Cow::Borrowed("")
    }
}
