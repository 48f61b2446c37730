// src/engine/spec.rs

//! Immutable description of the work in a batch.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::TaskConfig;
use crate::types::TaskKind;

pub const DEFAULT_STAGE_NAME: &str = "Unnamed Stage";

/// Identity of a job: its position in the batch plus an optional name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId {
    pub index: usize,
    pub name: Option<String>,
}

impl JobId {
    pub fn new(index: usize, name: Option<String>) -> Self {
        Self { index, name }
    }

    /// Human-readable name: the configured one, else `job-<n>` (1-based).
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("job-{}", self.index + 1),
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    pub name: String,
    pub ignore_failure: bool,
    tasks: BTreeMap<TaskKind, TaskConfig>,
}

impl StageSpec {
    pub fn new(name: Option<String>, ignore_failure: bool) -> Self {
        Self {
            name: name.unwrap_or_else(|| DEFAULT_STAGE_NAME.to_string()),
            ignore_failure,
            tasks: BTreeMap::new(),
        }
    }

    pub fn with_task(mut self, kind: TaskKind, config: TaskConfig) -> Self {
        self.tasks.insert(kind, config);
        self
    }

    pub fn task(&self, kind: TaskKind) -> Option<&TaskConfig> {
        self.tasks.get(&kind)
    }

    /// Enabled tasks in canonical dispatch order.
    pub fn enabled_tasks(&self) -> impl Iterator<Item = (TaskKind, &TaskConfig)> {
        // BTreeMap iteration follows `TaskKind`'s Ord, which is the canonical order.
        self.tasks
            .iter()
            .filter(|(_, cfg)| cfg.enabled)
            .map(|(kind, cfg)| (*kind, cfg))
    }

    pub fn tasks(&self) -> impl Iterator<Item = (TaskKind, &TaskConfig)> {
        self.tasks.iter().map(|(kind, cfg)| (*kind, cfg))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub id: JobId,
    pub stages: Vec<StageSpec>,
}

impl JobSpec {
    pub fn new(id: JobId, stages: Vec<StageSpec>) -> Self {
        Self { id, stages }
    }
}

/// A batch is either a list of independent jobs, or a bare list of stages
/// that runs as one sequential job.
#[derive(Debug, Clone, PartialEq)]
pub enum Batch {
    Jobs(Vec<JobSpec>),
    Stages(Vec<StageSpec>),
}

impl Batch {
    /// Flatten into jobs. A bare stage list becomes a single unnamed job.
    pub fn into_jobs(self) -> Vec<JobSpec> {
        match self {
            Batch::Jobs(jobs) => jobs,
            Batch::Stages(stages) => vec![JobSpec::new(JobId::new(0, None), stages)],
        }
    }

    pub fn job_count(&self) -> usize {
        match self {
            Batch::Jobs(jobs) => jobs.len(),
            Batch::Stages(_) => 1,
        }
    }
}
