// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::Batch;
use crate::errors::{PipewrightError, Result};
use crate::types::parse_duration;

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holding one means the batch is well-formed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub batch: Batch,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, batch: Batch) -> Self {
        Self { config, batch }
    }

    pub fn into_batch(self) -> Batch {
        self.batch
    }
}

/// Top-level configuration as read from a TOML or YAML file.
///
/// ```toml
/// [config]
/// max_parallel_jobs = 2
///
/// [[jobs]]
/// name = "api"
///
/// [[jobs.stages]]
/// name = "Build"
/// ignore_failure = false
///
/// [jobs.stages.tasks.sh]
/// enabled = true
/// steps = ["make test"]
/// ```
///
/// Exactly one of `jobs` or `stages` must be present; a bare `stages` list
/// runs as a single sequential job.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub jobs: Option<Vec<RawJob>>,

    #[serde(default)]
    pub stages: Option<Vec<RawStage>>,
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of jobs running at once; unbounded (one worker per job)
    /// when absent.
    #[serde(default)]
    pub max_parallel_jobs: Option<usize>,

    /// Directory under which per-job workspaces are created.
    ///
    /// Defaults to `<system temp dir>/pipewright`.
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
}

impl ConfigSection {
    pub fn effective_workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("pipewright"))
    }
}

/// One `[[jobs]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawJob {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub stages: Vec<RawStage>,
}

/// One `[[stages]]` / `[[jobs.stages]]` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStage {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub ignore_failure: bool,

    /// Task configs keyed by task kind name (`sh`, `maven`, ...).
    #[serde(default)]
    pub tasks: std::collections::BTreeMap<String, TaskConfig>,
}

/// Configuration of a single task.
///
/// The engine only looks at `enabled` and `timeout`; everything else is kept
/// verbatim in `settings` and interpreted by the task's handler.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Optional upper bound on the task's run time, e.g. `"15m"`.
    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(flatten)]
    pub settings: toml::Table,
}

impl TaskConfig {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_setting(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.settings.insert(key.to_string(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: &str) -> Self {
        self.timeout = Some(timeout.to_string());
        self
    }

    /// Parsed `timeout`. Validation rejects unparseable values at load time.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.as_deref().and_then(|s| parse_duration(s).ok())
    }

    pub fn settings(&self) -> Settings<'_> {
        Settings(&self.settings)
    }
}

/// Typed read access to a handler's settings table.
///
/// Empty strings count as absent, so `source_url = ""` behaves like a
/// missing `source_url`.
#[derive(Debug, Clone, Copy)]
pub struct Settings<'a>(&'a toml::Table);

impl<'a> Settings<'a> {
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn str(&self, key: &str) -> Result<Option<&'a str>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(toml::Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(type_error(key, "a string", other)),
        }
    }

    pub fn str_or(&self, key: &str, default: &'a str) -> Result<&'a str> {
        Ok(self.str(key)?.unwrap_or(default))
    }

    pub fn required_str(&self, key: &str) -> Result<&'a str> {
        self.str(key)?
            .ok_or_else(|| PipewrightError::invalid_setting(key, "required setting is missing"))
    }

    pub fn bool(&self, key: &str) -> Result<bool> {
        match self.0.get(key) {
            None => Ok(false),
            Some(toml::Value::Boolean(b)) => Ok(*b),
            Some(other) => Err(type_error(key, "a boolean", other)),
        }
    }

    /// Strings, integers or floats rendered as text (ports, versions).
    pub fn scalar(&self, key: &str) -> Result<Option<String>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(toml::Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(s.clone())),
            Some(toml::Value::Integer(i)) => Ok(Some(i.to_string())),
            Some(toml::Value::Float(f)) => Ok(Some(f.to_string())),
            Some(other) => Err(type_error(key, "a scalar", other)),
        }
    }

    /// A list of strings; a single string is read as a one-element list.
    pub fn string_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(toml::Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(vec![s.clone()])),
            Some(toml::Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    toml::Value::String(s) => Ok(s.clone()),
                    other => Err(type_error(key, "a list of strings", other)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Some),
            Some(other) => Err(type_error(key, "a list of strings", other)),
        }
    }

    /// Command-line words: either a whitespace-separated string
    /// (`goals = "clean install"`) or a list (`goals = ["clean", "install"]`).
    pub fn words_or(&self, key: &str, default: &str) -> Result<Vec<String>> {
        match self.0.get(key) {
            Some(toml::Value::Array(_)) => Ok(self.string_list(key)?.unwrap_or_default()),
            _ => Ok(self
                .str_or(key, default)?
                .split_whitespace()
                .map(str::to_string)
                .collect()),
        }
    }

    pub fn table(&self, key: &str) -> Result<Option<Settings<'a>>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(toml::Value::Table(t)) => Ok(Some(Settings(t))),
            Some(other) => Err(type_error(key, "a table", other)),
        }
    }
}

fn type_error(key: &str, expected: &str, got: &toml::Value) -> PipewrightError {
    PipewrightError::invalid_setting(key, format!("expected {expected}, got {}", got.type_str()))
}
