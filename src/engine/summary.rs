// src/engine/summary.rs

//! Batch-wide result aggregation.
//!
//! `RunSummary` is the only state shared between concurrently running jobs.
//! Counters are plain atomics; the failure log sits behind one mutex owned by
//! the summary.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::engine::job::JobReport;
use crate::engine::{JobId, JobOutcome, TaskOutcome};
use crate::types::TaskKind;

/// Where and why a task failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub job: JobId,
    pub stage: String,
    pub task: TaskKind,
    pub message: String,
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] stage '{}' task '{}': {}",
            self.job, self.stage, self.task, self.message
        )
    }
}

/// Point-in-time copy of the three counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummarySnapshot {
    pub completed: u64,
    pub failed: u64,
    pub uploaded: u64,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    completed: AtomicU64,
    failed: AtomicU64,
    uploaded: AtomicU64,
    failures: Mutex<Vec<FailureRecord>>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one handler outcome into the counters.
    ///
    /// `Skipped` leaves everything untouched.
    pub fn record(&self, job: &JobId, stage: &str, task: TaskKind, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Success => {
                self.completed.fetch_add(1, Ordering::Relaxed);
            }
            TaskOutcome::Failure(message) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.failures
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(FailureRecord {
                        job: job.clone(),
                        stage: stage.to_string(),
                        task,
                        message: message.clone(),
                    });
            }
            TaskOutcome::Skipped(_) => {}
        }
    }

    /// Count one artifact pushed to a remote registry.
    pub fn record_upload(&self) {
        self.uploaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SummarySnapshot {
        SummarySnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            uploaded: self.uploaded.load(Ordering::Relaxed),
        }
    }

    pub fn failures(&self) -> Vec<FailureRecord> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Final result of a batch.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: SummarySnapshot,
    pub jobs: Vec<JobReport>,
    pub failures: Vec<FailureRecord>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.summary.failed == 0
    }

    pub fn job(&self, name: &str) -> Option<&JobReport> {
        self.jobs.iter().find(|j| j.id.display_name() == name)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pipeline finished in {:.1?}", self.elapsed)?;
        writeln!(
            f,
            "  summary: completed={} failed={} uploaded={}",
            self.summary.completed, self.summary.failed, self.summary.uploaded
        )?;

        writeln!(f, "jobs ({}):", self.jobs.len())?;
        for job in &self.jobs {
            let status = match &job.outcome {
                JobOutcome::Completed => "completed".to_string(),
                JobOutcome::AbortedByFailure { stage, task } => {
                    format!("aborted at stage '{stage}' ({task})")
                }
                JobOutcome::Running => "unfinished".to_string(),
            };
            writeln!(
                f,
                "  - {}: {} [stages run {}/{}, tasks ok={} failed={} skipped={}]",
                job.id,
                status,
                job.stages_run,
                job.stages_total,
                job.tally.succeeded,
                job.tally.failed,
                job.tally.skipped
            )?;
        }

        if !self.failures.is_empty() {
            writeln!(f, "failures:")?;
            for failure in &self.failures {
                writeln!(f, "  - {failure}")?;
            }
        }
        Ok(())
    }
}
