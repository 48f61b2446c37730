// src/exec/tasks/shell.rs

//! `sh` and `bash`: run a list of shell snippets one after the other.

use std::sync::Arc;

use crate::engine::TaskOutcome;
use crate::exec::process::{CommandSpec, ProcessRunner};
use crate::exec::tasks::{Step, run_steps};
use crate::exec::{HandlerFuture, TaskContext, TaskHandler};

pub struct ShellStepsHandler {
    shell: &'static str,
    runner: Arc<dyn ProcessRunner>,
}

impl ShellStepsHandler {
    pub fn sh(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { shell: "sh", runner }
    }

    pub fn bash(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            shell: "bash",
            runner,
        }
    }
}

impl TaskHandler for ShellStepsHandler {
    fn invoke<'a>(&'a self, ctx: TaskContext<'a>) -> HandlerFuture<'a> {
        Box::pin(async move {
            let commands = ctx
                .config
                .settings()
                .string_list("steps")?
                .unwrap_or_default();
            if commands.is_empty() {
                return Ok(TaskOutcome::skipped(format!(
                    "no {} steps configured",
                    self.shell
                )));
            }

            // Steps run in the checkout when there is one, else in the job workspace.
            let cwd = ctx
                .state
                .working_dir()
                .unwrap_or_else(|| ctx.state.workspace())
                .to_path_buf();

            let steps = commands
                .iter()
                .enumerate()
                .map(|(i, command)| {
                    Step::new(
                        format!("{} step {}", self.shell, i + 1),
                        CommandSpec::new(self.shell)
                            .args(["-c", command.as_str()])
                            .current_dir(&cwd),
                    )
                })
                .collect();

            run_steps(self.runner.as_ref(), steps).await
        })
    }
}
