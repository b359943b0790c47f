//! Persisted filter definitions.
//!
//! These are the unvalidated, serde-friendly forms of [`Filter`] and
//! [`FilterSet`]. Numeric arguments may be written as integers or as
//! strings (`"0x1c"`, `"1ch"`, `"28"`); they are parsed when the
//! definition is compiled.
//!
//! [`Filter`]: crate::Filter
//! [`FilterSet`]: crate::FilterSet

use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::mode::{BitMode, FilterMode};
use crate::pattern::parse_integer;

/// Integer argument as written in a definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Unsigned(u64),
    Signed(i64),
    Text(String),
}

impl Scalar {
    /// Integer value, if the scalar holds or parses as one.
    pub fn to_i128(&self) -> Option<i128> {
        match self {
            Scalar::Unsigned(n) => Some(*n as i128),
            Scalar::Signed(n) => Some(*n as i128),
            Scalar::Text(s) => parse_integer(s),
        }
    }

    /// The value as written.
    pub fn describe(&self) -> String {
        match self {
            Scalar::Unsigned(n) => n.to_string(),
            Scalar::Signed(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }

    /// Parses the value as an unsigned integer. `field` names the argument
    /// in the error.
    pub fn to_u64(&self, field: &'static str) -> Result<u64, FilterError> {
        self.to_i128()
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| FilterError::InvalidNumber {
                field,
                input: self.describe(),
            })
    }

    pub fn to_i64(&self, field: &'static str) -> Result<i64, FilterError> {
        self.to_i128()
            .and_then(|n| i64::try_from(n).ok())
            .ok_or_else(|| FilterError::InvalidNumber {
                field,
                input: self.describe(),
            })
    }
}

impl From<u64> for Scalar {
    fn from(n: u64) -> Self {
        Scalar::Unsigned(n)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Signed(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

/// Where the field to test is found, relative to each search root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum SelectorDef {
    /// Direct children of the search root whose name matches.
    Name {
        name: String,
        #[serde(default)]
        case_sensitive: bool,
        #[serde(default)]
        regex: bool,
    },
    /// The field at `search root offset + offset`.
    RelativeOffset { offset: Scalar },
    /// The field at `offset` from the start of the resource.
    AbsoluteOffset { offset: Scalar },
}

/// What counts as a matching value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueDef {
    Text {
        text: String,
        #[serde(default)]
        case_sensitive: bool,
        #[serde(default)]
        regex: bool,
    },
    Number {
        min: Scalar,
        max: Scalar,
    },
    Resource {
        name: String,
        #[serde(default)]
        ext: String,
    },
    Bitfield {
        value: Scalar,
        #[serde(default)]
        mode: BitMode,
    },
}

/// Persisted form of a single filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDef {
    /// Structure path segments, outermost first.
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub recursive: bool,
    /// Structure path segments are regular expressions.
    #[serde(default)]
    pub regex: bool,
    /// Confine matches to one structural branch across filters.
    #[serde(default)]
    pub group: bool,
    pub selector: SelectorDef,
    pub value: ValueDef,
    #[serde(default)]
    pub invert: bool,
}

impl FilterDef {
    pub fn new(selector: SelectorDef, value: ValueDef) -> Self {
        FilterDef {
            path: Vec::new(),
            recursive: false,
            regex: false,
            group: false,
            selector,
            value,
            invert: false,
        }
    }
}

/// Persisted form of a filter set: one resource type, one combination
/// mode and the filters themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSetDef {
    pub resource_type: String,
    #[serde(default)]
    pub mode: FilterMode,
    pub filters: Vec<FilterDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_parsing() {
        assert_eq!(Scalar::from("0x1c").to_u64("offset").unwrap(), 0x1c);
        assert_eq!(Scalar::from("1ch").to_u64("offset").unwrap(), 0x1c);
        assert_eq!(Scalar::from(-5i64).to_i64("min").unwrap(), -5);
        assert!(Scalar::from(-5i64).to_u64("offset").is_err());
        assert!(Scalar::from(u64::MAX).to_i64("max").is_err());

        let err = Scalar::from("twelve").to_u64("offset").unwrap_err();
        assert!(err.to_string().contains("twelve"));
    }

    #[test]
    fn filter_def_from_json() {
        let json = r#"{
            "path": ["Actor"],
            "group": true,
            "selector": { "by": "name", "name": "Name" },
            "value": { "type": "text", "text": "Imoen" }
        }"#;
        let def: FilterDef = serde_json::from_str(json).unwrap();
        assert_eq!(def.path, vec!["Actor".to_string()]);
        assert!(def.group);
        assert!(!def.recursive);
        assert_eq!(
            def.selector,
            SelectorDef::Name {
                name: "Name".into(),
                case_sensitive: false,
                regex: false
            }
        );
    }

    #[test]
    fn numbers_accept_strings_and_integers() {
        let json = r#"{
            "selector": { "by": "absolute_offset", "offset": "0x18" },
            "value": { "type": "number", "min": 5, "max": "0x10" }
        }"#;
        let def: FilterDef = serde_json::from_str(json).unwrap();
        assert_eq!(
            def.value,
            ValueDef::Number {
                min: Scalar::Unsigned(5),
                max: Scalar::Text("0x10".into())
            }
        );
    }

    #[test]
    fn filter_set_defaults_to_match_all() {
        let json = r#"{ "resource_type": "CRE", "filters": [] }"#;
        let def: FilterSetDef = serde_json::from_str(json).unwrap();
        assert_eq!(def.mode, FilterMode::MatchAll);
    }
}
