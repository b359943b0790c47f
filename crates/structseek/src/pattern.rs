//! Name and text patterns.
//!
//! Record names commonly disambiguate repeated substructures with a
//! trailing index (`Actor 0`, `Actor 1`, ...). A literal [`NamePattern`]
//! accepts that index, so `Actor` finds every actor entry. Regex name
//! patterns must match the whole name. [`TextPattern`]s, used for values,
//! search anywhere in the string.

use regex::{Regex, RegexBuilder};

use crate::error::FilterError;

/// Anchored matcher for field and structure names.
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    regex: Regex,
}

impl NamePattern {
    /// Literal name, optionally followed by whitespace and an integer index.
    pub fn literal(name: &str, case_sensitive: bool) -> Result<Self, FilterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FilterError::EmptyPattern("name"));
        }
        let expr = format!(r"^(?:{})(?:\s+\d+)?$", regex::escape(name));
        Ok(NamePattern {
            source: name.to_string(),
            regex: compile(&expr, case_sensitive)?,
        })
    }

    /// Regular expression matched against the full name.
    pub fn regex(pattern: &str, case_sensitive: bool) -> Result<Self, FilterError> {
        if pattern.is_empty() {
            return Err(FilterError::EmptyPattern("name"));
        }
        let expr = format!("^(?:{pattern})$");
        Ok(NamePattern {
            source: pattern.to_string(),
            regex: compile(&expr, case_sensitive)?,
        })
    }

    pub fn new(pattern: &str, regex: bool, case_sensitive: bool) -> Result<Self, FilterError> {
        if regex {
            NamePattern::regex(pattern, case_sensitive)
        } else {
            NamePattern::literal(pattern, case_sensitive)
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// The pattern as the user wrote it.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Unanchored matcher for text values.
///
/// Also remembers whether the pattern text reads as an integer, for the
/// numeric fallback of text matching.
#[derive(Debug, Clone)]
pub struct TextPattern {
    source: String,
    regex: Regex,
    integer: Option<i128>,
}

impl TextPattern {
    pub fn new(pattern: &str, regex: bool, case_sensitive: bool) -> Result<Self, FilterError> {
        let expr = if regex {
            pattern.to_string()
        } else {
            regex::escape(pattern)
        };
        Ok(TextPattern {
            source: pattern.to_string(),
            regex: compile(&expr, case_sensitive)?,
            integer: parse_integer(pattern),
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Integer value of the pattern text, if it parses as one.
    pub fn as_integer(&self) -> Option<i128> {
        self.integer
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn compile(expr: &str, case_sensitive: bool) -> Result<Regex, FilterError> {
    Ok(RegexBuilder::new(expr)
        .case_insensitive(!case_sensitive)
        .build()?)
}

/// Parses an integer written in decimal, `0x`-prefixed hex or
/// `h`-suffixed hex. A leading sign is accepted for every form.
///
/// ```
/// use structseek::parse_integer;
///
/// assert_eq!(parse_integer("16"), Some(16));
/// assert_eq!(parse_integer("0x10"), Some(16));
/// assert_eq!(parse_integer("10h"), Some(16));
/// assert_eq!(parse_integer("-0x1"), Some(-1));
/// assert_eq!(parse_integer("ten"), None);
/// ```
pub fn parse_integer(input: &str) -> Option<i128> {
    let s = input.trim();
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let hex = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
        .or_else(|| body.strip_suffix('h'))
        .or_else(|| body.strip_suffix('H'));

    let magnitude = match hex {
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit()) => {
            i128::from_str_radix(digits, 16).ok()?
        }
        Some(_) => return None,
        None if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit()) => {
            body.parse::<i128>().ok()?
        }
        None => return None,
    };

    Some(if negative { -magnitude } else { magnitude })
}
