//! Configuration for the structseek command.
//!
//! [`Config::load`] layers, lowest first: the embedded defaults,
//! `$XDG_CONFIG_HOME/structseek/config.toml` (or an explicit file), and
//! `STRUCTSEEK__<SECTION>__<KEY>` environment variables (for example
//! `STRUCTSEEK__SEARCH__WORKERS=8`). Command-line flags are applied on
//! top by the caller. [`Config::defaults`] never touches the filesystem.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use structseek::SchedulerConfig;

use crate::output::OutputFormat;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[search]
# 0 picks one worker per available core.
workers        = 0
# 0 allows four queued resources per worker.
queue_capacity = 0
timeout_secs   = 60

[output]
format = "text"
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[search]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub workers: usize,
    #[serde(default)]
    pub queue_capacity: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_capacity: 0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SearchConfig {
    /// Scheduler settings, with zero meaning "derive from the machine".
    pub fn scheduler_config(&self) -> SchedulerConfig {
        let mut config = SchedulerConfig::default();
        if self.workers > 0 {
            config = config.with_workers(self.workers);
        }
        if self.queue_capacity > 0 {
            config = config.with_queue_capacity(self.queue_capacity);
        }
        config.with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Loads the layered configuration.
    ///
    /// An explicit `path` must exist; the per-user file is optional.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(config_path().as_path()).required(false),
        };
        Self::layered(file, environment())
    }

    fn layered(
        file: config::File<config::FileSourceFile, config::FileFormat>,
        env: config::Environment,
    ) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// The built-in defaults.
    pub fn defaults() -> Self {
        Self {
            search: SearchConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn environment() -> config::Environment {
    config::Environment::with_prefix("STRUCTSEEK")
        .separator("__")
        .try_parsing(true)
}

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("structseek")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
