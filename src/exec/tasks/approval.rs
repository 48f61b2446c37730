// src/exec/tasks/approval.rs

//! `request_approval`: a manual gate between stages.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::engine::TaskOutcome;
use crate::exec::{HandlerFuture, TaskContext, TaskHandler};

/// How approval gates are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalPolicy {
    /// Ask on the terminal.
    #[default]
    Prompt,
    AutoApprove,
    AutoDeny,
}

pub struct ApprovalHandler {
    policy: ApprovalPolicy,
    /// Parallel jobs share one terminal; one question at a time. Answers
    /// are read from a single buffered stdin that lives across prompts.
    answers: Mutex<Option<Lines<BufReader<Stdin>>>>,
}

impl ApprovalHandler {
    pub fn new(policy: ApprovalPolicy) -> Self {
        Self {
            policy,
            answers: Mutex::new(None),
        }
    }

    async fn ask(&self, task_name: &str) -> std::io::Result<bool> {
        let mut answers = self.answers.lock().await;

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(prompt_text(task_name).as_bytes())
            .await?;
        stdout.write_all(b" ").await?;
        stdout.flush().await?;

        let lines = answers.get_or_insert_with(|| BufReader::new(tokio::io::stdin()).lines());
        let line = lines.next_line().await?.unwrap_or_default();
        Ok(is_approval(&line))
    }
}

impl TaskHandler for ApprovalHandler {
    fn invoke<'a>(&'a self, ctx: TaskContext<'a>) -> HandlerFuture<'a> {
        Box::pin(async move {
            let task_name = ctx.config.settings().str_or("task_name", ctx.stage)?;

            let approved = match self.policy {
                ApprovalPolicy::AutoApprove => {
                    info!(task_name, "approval granted by policy");
                    true
                }
                ApprovalPolicy::AutoDeny => {
                    warn!(task_name, "approval denied by policy");
                    false
                }
                ApprovalPolicy::Prompt => self.ask(task_name).await?,
            };

            if approved {
                Ok(TaskOutcome::Success)
            } else {
                Ok(TaskOutcome::failure(format!(
                    "approval for '{task_name}' was denied"
                )))
            }
        })
    }
}

fn prompt_text(task_name: &str) -> String {
    format!("Approval required for task '{task_name}'. Do you want to proceed? [y/N]")
}

/// Only an explicit `y` approves; anything else (including EOF) is a no.
fn is_approval(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}
