//! Error types for the structseek crate.

use thiserror::Error;

/// Errors raised while validating a filter or filter-set definition.
///
/// Every one of these is reported before a search starts; a filter that
/// compiled successfully never fails during a run.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Invalid regular expression pattern.
    #[error("invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// A numeric argument could not be parsed or does not fit its target type.
    #[error("invalid {field} '{input}': expected a decimal or hexadecimal integer")]
    InvalidNumber { field: &'static str, input: String },

    /// Number filter with `min > max`.
    #[error("invalid range: min {min} is greater than max {max}")]
    InvalidRange { min: i64, max: i64 },

    /// A field or structure name pattern was empty.
    #[error("{0} must not be empty")]
    EmptyPattern(&'static str),

    /// A filter was built without choosing what value to match.
    #[error("filter has no value to match")]
    MissingValue,

    /// A filter set without any filter.
    #[error("filter set contains no filters")]
    EmptyFilterSet,

    /// A filter inside a set failed to validate.
    #[error("filter #{index}: {source}")]
    InFilter {
        index: usize,
        #[source]
        source: Box<FilterError>,
    },
}

/// Errors raised by the search scheduler and the corpus collaborators.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// `run` was called while a previous run was still in progress.
    #[error("a search is already running on this scheduler")]
    Busy,

    /// A resource could not be loaded or decoded.
    #[error("failed to load resource {resource}: {message}")]
    Load { resource: String, message: String },
}

/// Result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
