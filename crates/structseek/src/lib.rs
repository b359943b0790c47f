//! Structseek - structural field search over parsed resource records.
//!
//! Structseek searches a corpus of already-decoded resources for fields
//! that satisfy a set of filters. Each resource is a [`RecordTree`] of
//! named fields and substructures; a [`Filter`] says where to look in that
//! tree and which values count as a match. It supports:
//!
//! - Structure paths with indexed names (`Actor` finds `Actor 0`, `Actor 1`, ...)
//!   and optional recursion into nested substructures
//! - Field selection by name, by offset relative to a structure, or by
//!   absolute offset
//! - Text, number range, resource reference and bitfield values
//! - Grouping, which keeps several filters on the same structural branch
//! - AND / OR / XOR combination of filter verdicts per resource
//! - Parallel execution over the corpus with a deadline and partial results
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use structseek::{
//!     FieldValue, Filter, FilterMode, FilterSet, MemorySource, RecordTreeBuilder,
//!     RunStatus, SchedulerConfig, SearchScheduler,
//! };
//!
//! // Three items with different types
//! let mut corpus = MemorySource::new();
//! for (name, kind) in [("SW1H01.ITM", 20u16), ("POTN08.ITM", 9), ("SW1H02.ITM", 20)] {
//!     let mut item = RecordTreeBuilder::new(name, "ITM");
//!     let root = item.root();
//!     item.field(root, "Type", 0x1c, "Bitmap", FieldValue::numeric(kind));
//!     corpus.insert(name, item.build());
//! }
//!
//! // Every long sword
//! let swords = Filter::by_name("Type").number(20, 20).build().unwrap();
//! let filters = FilterSet::new("ITM", FilterMode::MatchAll, vec![swords]).unwrap();
//!
//! let scheduler = SearchScheduler::new(SchedulerConfig::default().with_workers(2)).unwrap();
//! let outcome = scheduler.run(Arc::new(corpus), Arc::new(filters)).unwrap();
//!
//! assert_eq!(outcome.status, RunStatus::Completed);
//! let found: Vec<_> = outcome.hits.iter().map(|hit| hit.resource().to_string()).collect();
//! assert_eq!(found, ["SW1H01.ITM", "SW1H02.ITM"]);
//! ```
//!
//! # Evaluation
//!
//! For each resource and each filter:
//!
//! ```text
//! roots     = resolve(structure path, recursion)
//! satisfied = some root where locate(selector) finds a matching value
//!             and, if grouped, the grouping guard accepts the root
//! ```
//!
//! The per-filter results are then combined with the set's [`FilterMode`]:
//!
//! - **MatchAll**: every filter satisfied
//! - **MatchAny**: at least one filter satisfied
//! - **MatchOne**: exactly one filter satisfied
//!
//! When the verdict holds, every hit recorded for the resource is published.
//!
//! # Value Types
//!
//! | Type | Matches when |
//! |------|--------------|
//! | Text | text, reference name or alias, parsed integer, or display string matches |
//! | Number | numeric value is in `[min, max]` |
//! | Resource | reference equals `name` or `name.ext` |
//! | Bitfield | `Exact`, `And`, `Or` or `Xor` against the operand |
//!
//! Every filter can be inverted.

mod combine;
mod definition;
mod error;
mod filter;
mod filter_set;
mod grouping;
mod hit;
mod locate;
mod matcher;
mod mode;
mod pattern;
mod record;
mod resolve;
mod resource;
mod scheduler;
mod value;

// Re-export public API
pub use combine::{evaluate_resource, EvalContext, Evaluation};
pub use definition::{FilterDef, FilterSetDef, Scalar, SelectorDef, ValueDef};
pub use error::{FilterError, Result, SearchError};
pub use filter::{FieldSelector, Filter, FilterBuilder, ValueSpec};
pub use filter_set::FilterSet;
pub use grouping::GroupingGuard;
pub use hit::{compare_hits, sort_hits, Hit, HitSummary};
pub use locate::locate;
pub use matcher::matches;
pub use mode::{BitMode, FilterMode};
pub use pattern::{parse_integer, NamePattern, TextPattern};
pub use record::{Ancestors, NodeId, RecordNode, RecordTree, RecordTreeBuilder, Shape};
pub use resolve::resolve;
pub use resource::{MemorySource, ResourceId, ResourceSource};
pub use scheduler::{
    Progress, RunStatus, SchedulerConfig, SearchOutcome, SearchScheduler, DEFAULT_TIMEOUT,
};
pub use value::{FieldValue, Number, ResourceRef};
