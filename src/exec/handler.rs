// src/exec/handler.rs

//! The contract between the engine and every task implementation.
//!
//! The stage runner talks to a `TaskHandler` instead of knowing about git,
//! docker or maven. Production handlers live in [`crate::exec::tasks`]; tests
//! can register their own implementation that scripts outcomes.

use std::future::Future;
use std::pin::Pin;

use crate::config::TaskConfig;
use crate::engine::{JobId, JobState, RunSummary, TaskOutcome};
use crate::errors::Result;
use crate::types::TaskKind;

/// Everything a handler gets to see for one invocation.
pub struct TaskContext<'a> {
    pub job: &'a JobId,
    pub stage: &'a str,
    pub kind: TaskKind,
    pub config: &'a TaskConfig,
    pub state: &'a mut JobState,
    pub summary: &'a RunSummary,
}

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + 'a>>;

/// Trait abstracting how one kind of task is executed.
///
/// Expected failures (a non-zero exit code, a missing setting) should come
/// back as `Ok(TaskOutcome::Failure(..))`. An `Err` or a panic is still safe:
/// the stage runner turns it into a failure at the stage boundary.
pub trait TaskHandler: Send + Sync {
    fn invoke<'a>(&'a self, ctx: TaskContext<'a>) -> HandlerFuture<'a>;
}
