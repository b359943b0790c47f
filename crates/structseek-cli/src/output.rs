//! Rendering of search outcomes.
//!
//! Text output is one line per hit plus a summary. JSON and YAML output
//! serialize a [`Report`] for consumption by other tools.

use std::fmt::Write as _;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use structseek::{Hit, RunStatus, SearchOutcome};
use thiserror::Error;

/// Errors that can occur while rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// Serializable view of a [`SearchOutcome`].
#[derive(Debug, Serialize)]
pub struct Report {
    pub status: &'static str,
    pub hit_count: usize,
    pub unique_resources: usize,
    pub done: usize,
    pub total: usize,
    pub faults: usize,
    pub elapsed_ms: u64,
    pub hits: Vec<HitRecord>,
}

#[derive(Debug, Serialize)]
pub struct HitRecord {
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub path: String,
    pub offset: u64,
    pub value: String,
}

impl From<&Hit> for HitRecord {
    fn from(hit: &Hit) -> Self {
        HitRecord {
            resource: hit.resource().to_string(),
            alias: hit.alias().map(str::to_string),
            path: hit.path(),
            offset: hit.offset(),
            value: hit.node().value().display().into_owned(),
        }
    }
}

impl From<&SearchOutcome> for Report {
    fn from(outcome: &SearchOutcome) -> Self {
        let summary = outcome.summary();
        Report {
            status: match outcome.status {
                RunStatus::Completed => "completed",
                RunStatus::TimedOut => "timed_out",
            },
            hit_count: summary.hit_count,
            unique_resources: summary.unique_resources,
            done: outcome.progress.done,
            total: outcome.progress.total,
            faults: outcome.faults,
            elapsed_ms: u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
            hits: outcome.hits.iter().map(HitRecord::from).collect(),
        }
    }
}

/// Renders an outcome in the requested format.
pub fn render(outcome: &SearchOutcome, format: OutputFormat) -> Result<String, RenderError> {
    match format {
        OutputFormat::Text => Ok(to_text(outcome)),
        OutputFormat::Json => to_json(&Report::from(outcome)),
        OutputFormat::Yaml => to_yaml(&Report::from(outcome)),
    }
}

pub fn to_json<T: Serialize>(data: &T) -> Result<String, RenderError> {
    Ok(serde_json::to_string_pretty(data)?)
}

pub fn to_yaml<T: Serialize>(data: &T) -> Result<String, RenderError> {
    Ok(serde_yaml::to_string(data)?)
}

fn to_text(outcome: &SearchOutcome) -> String {
    let mut out = String::new();
    for hit in &outcome.hits {
        let record = HitRecord::from(hit);
        let _ = write!(out, "{}", record.resource);
        if let Some(alias) = &record.alias {
            let _ = write!(out, " ({alias})");
        }
        let _ = writeln!(out, "  {:#06x}  {} = {}", record.offset, record.path, record.value);
    }

    let _ = write!(out, "{}", outcome.summary());
    if outcome.faults > 0 {
        let _ = write!(out, ", {} resource(s) skipped", outcome.faults);
    }
    if outcome.is_partial() {
        let _ = write!(
            out,
            " (timed out after {}/{} resources; results are partial)",
            outcome.progress.done, outcome.progress.total
        );
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use structseek::{FieldValue, NodeId, Progress, RecordTreeBuilder};

    fn outcome(status: RunStatus) -> SearchOutcome {
        let mut b = RecordTreeBuilder::new("SW1H01.ITM", "ITM");
        let root = b.root();
        b.field(root, "Type", 0x1c, "Bitmap", FieldValue::numeric(20u16).with_display("Long sword"));
        let tree = Arc::new(b.build());
        let field = tree.children(NodeId::ROOT)[0];
        SearchOutcome {
            status,
            hits: vec![Hit::new("SW1H01.ITM".into(), Some("Varscona".into()), tree, field)],
            progress: Progress { done: 1, total: 2 },
            faults: 0,
            elapsed: Duration::from_millis(12),
        }
    }

    #[test]
    fn text_lists_hits_and_summary() {
        let text = render(&outcome(RunStatus::Completed), OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "SW1H01.ITM (Varscona)  0x001c  SW1H01.ITM > Type = Long sword\n\
             1 hit(s) in 1 resource(s)\n"
        );
    }

    #[test]
    fn text_flags_partial_results() {
        let text = render(&outcome(RunStatus::TimedOut), OutputFormat::Text).unwrap();
        assert!(text.contains("timed out after 1/2 resources"));
    }

    #[test]
    fn json_report() {
        let json = render(&outcome(RunStatus::Completed), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["hit_count"], 1);
        assert_eq!(value["hits"][0]["offset"], 0x1c);
        assert_eq!(value["hits"][0]["alias"], "Varscona");
        assert_eq!(value["hits"][0]["value"], "Long sword");
    }

    #[test]
    fn yaml_report() {
        let yaml = render(&outcome(RunStatus::TimedOut), OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("status: timed_out"));
        assert!(yaml.contains("hit_count: 1"));
    }
}
