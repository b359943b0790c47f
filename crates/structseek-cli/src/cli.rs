//! Command-line interface.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use structseek::{SearchScheduler, SelectorDef, ValueDef};
use tracing::info;

use crate::config::Config;
use crate::corpus::DirectorySource;
use crate::filters;
use crate::output::{render, OutputFormat};

/// Search decoded game resources for fields matching a filter set.
#[derive(Debug, Parser)]
#[command(name = "structseek", version)]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(long, global = true)]
    pub debug: bool,

    /// Configuration file to use instead of the per-user one.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a filter set over a corpus directory
    Search(SearchArgs),

    /// Validate a filter set without searching
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Directory of resource documents
    #[arg(long, value_name = "DIR")]
    pub corpus: PathBuf,

    /// Filter-set file (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub filters: PathBuf,

    /// Resource type to search, overriding the filter set's
    #[arg(long = "type", value_name = "TAG")]
    pub resource_type: Option<String>,

    /// Worker threads
    #[arg(long)]
    pub workers: Option<usize>,

    /// Seconds to wait for the search before returning partial results
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, value_enum)]
    pub output: Option<OutputFormat>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Filter-set file (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub filters: PathBuf,
}

/// Executes the parsed command, writing results to `out`.
pub fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    match cli.command {
        Command::Search(args) => search(&config, args, out),
        Command::Check(args) => check(args, out),
    }
}

fn search(config: &Config, args: SearchArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let filter_set = filters::load(&args.filters, args.resource_type.as_deref())
        .with_context(|| format!("invalid filter set {}", args.filters.display()))?;
    let corpus = DirectorySource::open(&args.corpus)
        .with_context(|| format!("cannot open corpus {}", args.corpus.display()))?;

    let mut scheduler_config = config.search.scheduler_config();
    if let Some(workers) = args.workers {
        scheduler_config = scheduler_config.with_workers(workers);
    }
    if let Some(timeout) = args.timeout {
        scheduler_config = scheduler_config.with_timeout(Duration::from_secs(timeout));
    }
    let format = args.output.unwrap_or(config.output.format);

    info!(
        corpus = %args.corpus.display(),
        resources = corpus.len(),
        resource_type = filter_set.resource_type(),
        "searching"
    );
    let scheduler = SearchScheduler::new(scheduler_config)?;
    let outcome = scheduler.run(Arc::new(corpus), Arc::new(filter_set))?;

    out.write_all(render(&outcome, format)?.as_bytes())?;
    Ok(())
}

fn check(args: CheckArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let def = filters::read_definition(&args.filters)
        .with_context(|| format!("cannot read filter set {}", args.filters.display()))?;
    let set = structseek::FilterSet::compile(&def)
        .with_context(|| format!("invalid filter set {}", args.filters.display()))?;

    writeln!(
        out,
        "{}: {} filter(s) over {} resources, combined with {}",
        args.filters.display(),
        set.len(),
        set.resource_type(),
        set.mode()
    )?;
    for (index, filter) in def.filters.iter().enumerate() {
        writeln!(out, "  #{index} {}", describe(filter))?;
    }
    Ok(())
}

fn describe(filter: &structseek::FilterDef) -> String {
    let selector = match &filter.selector {
        SelectorDef::Name { name, .. } => format!("name {name}"),
        SelectorDef::RelativeOffset { offset } => format!("offset +{}", offset.describe()),
        SelectorDef::AbsoluteOffset { offset } => format!("offset {}", offset.describe()),
    };
    let value = match &filter.value {
        ValueDef::Text { text, .. } => format!("text {text:?}"),
        ValueDef::Number { min, max } => format!("number {}..={}", min.describe(), max.describe()),
        ValueDef::Resource { name, ext } if ext.is_empty() => format!("resource {name}"),
        ValueDef::Resource { name, ext } => format!("resource {name}.{ext}"),
        ValueDef::Bitfield { value, mode } => format!("bitfield {} {mode}", value.describe()),
    };
    let mut line = format!("{selector}: {value}");
    if !filter.path.is_empty() && !matches!(filter.selector, SelectorDef::AbsoluteOffset { .. }) {
        line = format!("{} / {line}", filter.path.join(" > "));
    }
    if filter.invert {
        line.push_str(" (inverted)");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_search_flags() {
        let cli = Cli::try_parse_from([
            "structseek",
            "search",
            "--corpus",
            "corpus",
            "--filters",
            "f.yaml",
            "--type",
            "CRE",
            "--workers",
            "2",
            "--output",
            "json",
        ])
        .unwrap();
        match cli.command {
            Command::Search(args) => {
                assert_eq!(args.resource_type.as_deref(), Some("CRE"));
                assert_eq!(args.workers, Some(2));
                assert_eq!(args.output, Some(OutputFormat::Json));
                assert_eq!(args.timeout, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn describe_filters() {
        let filter: structseek::FilterDef = serde_json::from_str(
            r#"{ "path": ["Actor"], "selector": { "by": "name", "name": "Name" },
                 "value": { "type": "text", "text": "Imoen" }, "invert": true }"#,
        )
        .unwrap();
        assert_eq!(describe(&filter), "Actor / name Name: text \"Imoen\" (inverted)");
    }
}
