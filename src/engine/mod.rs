// src/engine/mod.rs

//! Execution engine for pipewright.
//!
//! This module ties together:
//! - the task handler registry (`TaskKind` → handler)
//! - the stage runner (canonical task order, cascading abort)
//! - the job runner (sequential stages, per-job `JobState`)
//! - the scheduler (one worker per job, fork-join)
//! - the result aggregator (`RunSummary`, `RunReport`)

use std::fmt;

use crate::types::TaskKind;

/// Result of one handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failure(String),
    Skipped(String),
}

impl TaskOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        TaskOutcome::Failure(message.into())
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        TaskOutcome::Skipped(reason.into())
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failure(_))
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Success => f.write_str("success"),
            TaskOutcome::Failure(msg) => write!(f, "failure: {msg}"),
            TaskOutcome::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

/// Lifecycle of a job.
///
/// ```text
/// Running ──abort──▶ AbortedByFailure
///    └────complete──▶ Completed
/// ```
///
/// Both terminal states are sticky: later transitions are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Running,
    AbortedByFailure { stage: String, task: TaskKind },
    Completed,
}

impl JobOutcome {
    pub fn abort(self, stage: &str, task: TaskKind) -> Self {
        match self {
            JobOutcome::Running => JobOutcome::AbortedByFailure {
                stage: stage.to_string(),
                task,
            },
            terminal => terminal,
        }
    }

    pub fn complete(self) -> Self {
        match self {
            JobOutcome::Running => JobOutcome::Completed,
            terminal => terminal,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, JobOutcome::Running)
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, JobOutcome::AbortedByFailure { .. })
    }
}

pub mod job;
pub mod registry;
pub mod scheduler;
pub mod spec;
pub mod stage;
pub mod state;
pub mod summary;

pub use job::{JobReport, JobRunner};
pub use registry::HandlerRegistry;
pub use scheduler::{Scheduler, SchedulerOptions};
pub use spec::{Batch, JobId, JobSpec, StageSpec};
pub use stage::{StageRunner, StageVerdict};
pub use state::{JobState, TaskTally};
pub use summary::{FailureRecord, RunReport, RunSummary, SummarySnapshot};
