//! Command-line front end for structseek.
//!
//! The `structseek` binary reads a filter set from a JSON or YAML file, loads
//! a corpus from a directory of resource documents and prints the hits as
//! text, JSON or YAML. Everything here is a thin layer over the
//! [`structseek`] library.

pub mod cli;
pub mod config;
pub mod corpus;
pub mod filters;
pub mod output;

pub use cli::{run, Cli};
