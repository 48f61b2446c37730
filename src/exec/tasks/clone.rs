// src/exec/tasks/clone.rs

//! `setup_and_clone`: fresh checkout of a repository into the job's working
//! directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::engine::TaskOutcome;
use crate::errors::Result;
use crate::exec::process::{CommandSpec, ProcessRunner};
use crate::exec::tasks::{Step, run_steps};
use crate::exec::{HandlerFuture, TaskContext, TaskHandler};

const DEFAULT_BRANCH: &str = "main";

pub struct CloneHandler {
    runner: Arc<dyn ProcessRunner>,
}

impl CloneHandler {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

impl TaskHandler for CloneHandler {
    fn invoke<'a>(&'a self, ctx: TaskContext<'a>) -> HandlerFuture<'a> {
        Box::pin(async move {
            let settings = ctx.config.settings();

            let Some(source_url) = settings.str("source_url")? else {
                return Ok(TaskOutcome::failure(
                    "no source_url provided for repository cloning",
                ));
            };

            let clone_dir = settings
                .str("clone_dir")?
                .map(PathBuf::from)
                .unwrap_or_else(|| ctx.state.workspace().join("repo"));

            let branches = branch_list(settings.string_list("branches")?);

            let mut token = None;
            let url = if settings.bool("private_repo")? {
                let (Some(username), Some(secret)) =
                    (settings.str("username")?, settings.str("token")?)
                else {
                    return Ok(TaskOutcome::failure(
                        "private repository credentials not provided (username and token)",
                    ));
                };
                let Some(url) = authenticated_url(source_url, username, secret) else {
                    return Ok(TaskOutcome::failure(format!(
                        "source_url '{source_url}' has no scheme; private repositories need an https:// URL"
                    )));
                };
                token = Some(secret.to_string());
                url
            } else {
                source_url.to_string()
            };

            prepare_clone_dir(&clone_dir).await?;
            info!(dir = %clone_dir.display(), ?branches, "cloning repository");

            let steps = clone_steps(&url, &branches, &clone_dir, token.as_deref());
            let outcome = run_steps(self.runner.as_ref(), steps).await?;

            if outcome == TaskOutcome::Success {
                ctx.state.set_working_dir(clone_dir);
            }
            Ok(outcome)
        })
    }
}

/// Configured branches without blank entries; `main` when none remain.
fn branch_list(configured: Option<Vec<String>>) -> Vec<String> {
    let branches: Vec<String> = configured
        .unwrap_or_default()
        .into_iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect();
    if branches.is_empty() {
        vec![DEFAULT_BRANCH.to_string()]
    } else {
        branches
    }
}

/// Insert `user:token@` after the URL scheme.
fn authenticated_url(url: &str, username: &str, token: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    Some(format!("{scheme}://{username}:{token}@{rest}"))
}

/// Start from an empty directory: remove leftovers, create the parent.
async fn prepare_clone_dir(dir: &Path) -> Result<()> {
    if tokio::fs::try_exists(dir).await.unwrap_or(false) {
        tokio::fs::remove_dir_all(dir)
            .await
            .with_context(|| format!("removing previous checkout at {}", dir.display()))?;
    }
    if let Some(parent) = dir.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

fn clone_steps(url: &str, branches: &[String], dir: &Path, token: Option<&str>) -> Vec<Step> {
    let with_secret = |spec: CommandSpec| match token {
        Some(token) => spec.secret(token),
        None => spec,
    };

    let first = &branches[0];
    let mut steps = vec![Step::new(
        format!("clone branch '{first}'"),
        with_secret(
            CommandSpec::new("git")
                .args(["clone", "--branch", first.as_str(), url])
                .path_arg(dir),
        ),
    )];

    if branches.len() > 1 {
        steps.push(Step::new(
            "fetch remote branches",
            with_secret(CommandSpec::new("git").arg("fetch").current_dir(dir)),
        ));
        for branch in &branches[1..] {
            steps.push(Step::new(
                format!("check out branch '{branch}'"),
                CommandSpec::new("git")
                    .args(["checkout", branch.as_str()])
                    .current_dir(dir),
            ));
        }
    }

    steps
}
