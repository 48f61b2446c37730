// src/engine/job.rs

//! Job runner: sequential stages over one `JobState`.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::engine::{
    HandlerRegistry, JobId, JobOutcome, JobSpec, JobState, RunSummary, StageRunner, StageVerdict,
    TaskTally,
};

/// What a finished job reports back to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub id: JobId,
    pub outcome: JobOutcome,
    pub stages_run: usize,
    pub stages_total: usize,
    pub tally: TaskTally,
    pub workspace: PathBuf,
}

/// Runs the stages of one job in declared order.
///
/// Owns nothing but shared handles; all mutable per-job data lives in the
/// `JobState` created inside [`JobRunner::run`].
#[derive(Debug, Clone)]
pub struct JobRunner {
    registry: Arc<HandlerRegistry>,
    summary: Arc<RunSummary>,
}

impl JobRunner {
    pub fn new(registry: Arc<HandlerRegistry>, summary: Arc<RunSummary>) -> Self {
        Self { registry, summary }
    }

    pub async fn run(&self, job: &JobSpec, workspace: PathBuf) -> JobReport {
        let mut state = JobState::new(job.id.clone(), workspace.clone());
        let mut outcome = JobOutcome::Running;
        let mut stages_run = 0;

        let stage_runner = StageRunner::new(&self.registry, &self.summary);

        info!(
            job = %job.id,
            stages = job.stages.len(),
            workspace = %workspace.display(),
            "job started"
        );

        if let Err(e) = tokio::fs::create_dir_all(&workspace).await {
            warn!(
                job = %job.id,
                workspace = %workspace.display(),
                error = %e,
                "could not create job workspace"
            );
        }

        for stage in &job.stages {
            info!(job = %job.id, stage = %stage.name, "stage started");
            stages_run += 1;

            match stage_runner.run(stage, &mut state).await {
                StageVerdict::Continue => {
                    info!(job = %job.id, stage = %stage.name, "stage completed");
                }
                StageVerdict::Abort { task, message } => {
                    warn!(
                        job = %job.id,
                        stage = %stage.name,
                        task = %task,
                        error = %message,
                        "job aborted by task failure"
                    );
                    outcome = outcome.abort(&stage.name, task);
                    break;
                }
            }
        }

        let outcome = outcome.complete();
        let tally = state.tally();

        info!(
            job = %job.id,
            outcome = ?outcome,
            succeeded = tally.succeeded,
            failed = tally.failed,
            skipped = tally.skipped,
            "job finished"
        );

        JobReport {
            id: job.id.clone(),
            outcome,
            stages_run,
            stages_total: job.stages.len(),
            tally,
            workspace,
        }
    }
}
