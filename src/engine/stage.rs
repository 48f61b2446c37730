// src/engine/stage.rs

//! Stage runner: one stage, canonical task order, cascading abort.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::config::TaskConfig;
use crate::engine::{HandlerRegistry, JobId, JobState, RunSummary, StageSpec, TaskOutcome};
use crate::exec::{TaskContext, TaskHandler};
use crate::types::TaskKind;

/// What the job runner should do after a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageVerdict {
    /// Move on to the next stage.
    Continue,
    /// A non-ignored failure happened: skip every remaining task and stage of
    /// the job.
    Abort { task: TaskKind, message: String },
}

pub struct StageRunner<'r> {
    registry: &'r HandlerRegistry,
    summary: &'r RunSummary,
}

impl<'r> StageRunner<'r> {
    pub fn new(registry: &'r HandlerRegistry, summary: &'r RunSummary) -> Self {
        Self { registry, summary }
    }

    /// Run the enabled tasks of `stage` one at a time, in canonical order.
    pub async fn run(&self, stage: &StageSpec, state: &mut JobState) -> StageVerdict {
        let job = state.job().clone();

        for kind in TaskKind::CANONICAL_ORDER {
            let Some(config) = stage.task(kind) else {
                continue;
            };

            if !config.enabled {
                info!(job = %job, stage = %stage.name, task = %kind, "task disabled; skipping");
                continue;
            }

            let Some(handler) = self.registry.resolve(kind) else {
                warn!(
                    job = %job,
                    stage = %stage.name,
                    task = %kind,
                    "no handler registered for task kind; skipping"
                );
                continue;
            };

            info!(job = %job, stage = %stage.name, task = %kind, "task started");
            let started = Instant::now();

            let outcome = self
                .invoke(handler.as_ref(), &job, stage, kind, config, state)
                .await;

            state.note_outcome(&outcome);
            self.summary.record(&job, &stage.name, kind, &outcome);

            match outcome {
                TaskOutcome::Success => {
                    info!(
                        job = %job,
                        stage = %stage.name,
                        task = %kind,
                        elapsed = ?started.elapsed(),
                        "task succeeded"
                    );
                }
                TaskOutcome::Skipped(reason) => {
                    info!(job = %job, stage = %stage.name, task = %kind, %reason, "task skipped");
                }
                TaskOutcome::Failure(message) => {
                    error!(
                        job = %job,
                        stage = %stage.name,
                        task = %kind,
                        error = %message,
                        "task failed"
                    );

                    if stage.ignore_failure {
                        warn!(
                            job = %job,
                            stage = %stage.name,
                            task = %kind,
                            "ignore_failure is set; continuing with the next task"
                        );
                        continue;
                    }

                    warn!(
                        job = %job,
                        stage = %stage.name,
                        task = %kind,
                        "stopping job: remaining tasks and stages will not run"
                    );
                    return StageVerdict::Abort { task: kind, message };
                }
            }
        }

        StageVerdict::Continue
    }

    /// Call the handler, turning errors, panics and timeouts into failures.
    async fn invoke(
        &self,
        handler: &dyn TaskHandler,
        job: &JobId,
        stage: &StageSpec,
        kind: TaskKind,
        config: &TaskConfig,
        state: &mut JobState,
    ) -> TaskOutcome {
        let ctx = TaskContext {
            job,
            stage: &stage.name,
            kind,
            config,
            state,
            summary: self.summary,
        };

        let guarded = AssertUnwindSafe(handler.invoke(ctx)).catch_unwind();

        let result = match config.timeout() {
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(job = %job, task = %kind, ?limit, "task exceeded its timeout");
                    return TaskOutcome::failure(format!("timed out after {limit:?}"));
                }
            },
            None => guarded.await,
        };

        match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => TaskOutcome::failure(err.to_string()),
            Err(panic) => TaskOutcome::failure(format!(
                "handler panicked: {}",
                panic_message(panic.as_ref())
            )),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
